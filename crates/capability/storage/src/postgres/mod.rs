//! PostgreSQL 存储实现
//!
//! 生产环境使用。所有 SQL 均参数化，时长计数器使用原子自增。

mod device;

pub use device::PgDeviceStore;
