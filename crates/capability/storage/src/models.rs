//! 存储数据模型
//!
//! 设备记录是整个系统唯一的持久化实体：每个被监控设备一行，
//! 首次访问时创建，终生原地更新。

use domain::DeviceState;

/// 持久化的设备记录。
///
/// 时间戳统一为 epoch 毫秒。`last_seen_at_ms` 仅在设备从未上报过
/// 心跳时为 None。两个累计时长计数器单调不减，只在离开对应状态的
/// 切换提交时增加。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    pub device_id: String,
    pub state: DeviceState,
    pub state_changed_at_ms: i64,
    pub last_seen_at_ms: Option<i64>,
    pub total_outage_duration_ms: i64,
    pub total_online_duration_ms: i64,
    pub last_outage_started_at_ms: Option<i64>,
    pub last_online_started_at_ms: Option<i64>,
}

impl DeviceRecord {
    /// 首次访问时的初始记录：断电状态、计数器清零、从未见过心跳。
    pub fn initial(device_id: impl Into<String>, now_ms: i64) -> Self {
        Self {
            device_id: device_id.into(),
            state: DeviceState::Outage,
            state_changed_at_ms: now_ms,
            last_seen_at_ms: None,
            total_outage_duration_ms: 0,
            total_online_duration_ms: 0,
            last_outage_started_at_ms: Some(now_ms),
            last_online_started_at_ms: None,
        }
    }
}
