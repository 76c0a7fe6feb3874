//! 设备记录存储接口。

use crate::error::StorageError;
use crate::models::DeviceRecord;
use domain::DeviceState;

/// 设备记录存储抽象。
///
/// 看门狗引擎通过该接口读写设备记录，不关心后端实现。
/// 实现必须保证 `commit_transition` 的计数器自增是原子操作，
/// 两个引擎实例并发提交时不得丢失增量。
#[async_trait::async_trait]
pub trait DeviceStore: Send + Sync {
    /// 加载设备记录，不存在时按初始状态（OUTAGE、计数器清零）创建。
    async fn load_or_create(
        &self,
        device_id: &str,
        now_ms: i64,
    ) -> Result<DeviceRecord, StorageError>;

    /// 更新最近一次心跳时间。
    async fn update_last_seen(&self, device_id: &str, at_ms: i64) -> Result<(), StorageError>;

    /// 原子提交一次状态切换。
    ///
    /// 单次提交同时完成：写入新状态与切换时间、把离开状态的驻留时长
    /// 累加到对应计数器、记录新状态本轮的开始时间。
    async fn commit_transition(
        &self,
        device_id: &str,
        new_state: DeviceState,
        changed_at_ms: i64,
        duration_delta_ms: i64,
        started_at_ms: i64,
    ) -> Result<(), StorageError>;
}
