//! Handlers 模块

pub mod metrics;
pub mod watchdog;

pub use metrics::*;
pub use watchdog::*;
