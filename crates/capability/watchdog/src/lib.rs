//! # Gridwatch Watchdog 模块
//!
//! 看门狗状态引擎：从心跳缺失推断设备可用性（ON / OUTAGE），
//! 统计两种状态的累计时长，并在每次状态切换时推送一条通知。
//!
//! ## 状态机
//!
//! 两个状态、两条切换路径：
//!
//! - `OUTAGE -> ON`：仅由 `record_heartbeat` 触发
//! - `ON -> OUTAGE`：仅由 `check_staleness`（调度器驱动）触发
//!
//! 首次启动的初始状态为 OUTAGE。除上述两个入口外不存在任何切换。
//!
//! ## 失败策略
//!
//! 持久化失败不得阻断通知投递，通知失败不得回滚状态切换；
//! 两者都只记日志。唯一的致命错误是启动恢复时存储不可达。

pub mod engine;
pub mod format;
pub mod scheduler;

pub use engine::{StatusSnapshot, WatchdogEngine, WatchdogError};
pub use format::format_duration;
pub use scheduler::{SchedulerHandle, spawn_staleness_checker};
