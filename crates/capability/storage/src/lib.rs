//! # Gridwatch Storage 模块
//!
//! 本模块提供设备记录的统一存储抽象层，支持多种存储后端实现。
//!
//! ## 架构设计
//!
//! 1. **接口抽象层** (`device.rs`)：定义 `DeviceStore` 异步 Trait 接口
//! 2. **数据模型层** (`models.rs`)：定义持久化的设备记录结构
//! 3. **错误处理层** (`error.rs`)：统一的存储错误类型
//! 4. **连接管理层** (`connection.rs`)：数据库连接池管理
//! 5. **实现层**：
//!    - `in_memory/`：内存存储实现（用于测试和演示）
//!    - `postgres/`：PostgreSQL 存储实现（生产环境使用）
//!
//! ## 设计约束
//!
//! - 设备记录在首次访问时惰性创建（初始状态 OUTAGE，计数器清零），
//!   之后只原地更新、永不删除
//! - 时长计数器的更新必须是原子自增（`set total = total + delta`），
//!   禁止读改写竞态
//! - Handler 层禁止直接写 SQL，统一通过 storage 层

// 模块导出：将子模块的内容导出到 crate 根目录
pub mod connection;
pub mod device;
pub mod error;
pub mod in_memory;
pub mod models;
pub mod postgres;

// 导出常用类型到 crate 根目录，方便外部引用
pub use connection::*;
pub use device::*;
pub use error::*;
pub use models::*;

pub use in_memory::InMemoryDeviceStore;
pub use postgres::PgDeviceStore;
