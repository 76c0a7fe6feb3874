//! 内存存储实现
//!
//! 仅用于单元测试、集成测试和本地演示。

mod device;

pub use device::InMemoryDeviceStore;
