//! 领域模型：设备可用性状态与时间戳工具。

use serde::{Deserialize, Serialize};

/// 设备可用性状态。任一时刻只能处于其中一个状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceState {
    /// 设备在线（心跳未超时）。
    On,
    /// 断电/失联（心跳超时或从未收到心跳）。
    Outage,
}

impl DeviceState {
    /// 持久化使用的文本表示。
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceState::On => "ON",
            DeviceState::Outage => "OUTAGE",
        }
    }

    /// 从持久化文本解析状态，未知文本返回 None。
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ON" => Some(DeviceState::On),
            "OUTAGE" => Some(DeviceState::Outage),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 获取当前时间戳（毫秒）
pub fn now_epoch_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
