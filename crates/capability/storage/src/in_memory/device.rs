//! 设备记录内存存储实现
//!
//! 仅用于测试和本地演示。
//!
//! 功能：
//! - 首次访问惰性创建记录
//! - 心跳时间更新
//! - 状态切换的原子提交（写锁内完成全部字段更新）

use crate::device::DeviceStore;
use crate::error::StorageError;
use crate::models::DeviceRecord;
use domain::DeviceState;
use std::collections::HashMap;
use std::sync::RwLock;

/// 设备记录内存存储
///
/// 使用 RwLock + HashMap 提供线程安全的内存存储。
pub struct InMemoryDeviceStore {
    devices: RwLock<HashMap<String, DeviceRecord>>,
}

impl InMemoryDeviceStore {
    /// 创建空存储。
    pub fn new() -> Self {
        Self {
            devices: RwLock::new(HashMap::new()),
        }
    }

    /// 以给定记录预置存储（测试恢复流程用）。
    pub fn with_record(record: DeviceRecord) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.devices.write() {
            map.insert(record.device_id.clone(), record);
        }
        store
    }

    /// 读取当前记录快照（测试断言用）。
    pub fn snapshot(&self, device_id: &str) -> Option<DeviceRecord> {
        self.devices
            .read()
            .ok()
            .and_then(|map| map.get(device_id).cloned())
    }
}

impl Default for InMemoryDeviceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DeviceStore for InMemoryDeviceStore {
    async fn load_or_create(
        &self,
        device_id: &str,
        now_ms: i64,
    ) -> Result<DeviceRecord, StorageError> {
        let mut map = self
            .devices
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let record = map
            .entry(device_id.to_string())
            .or_insert_with(|| DeviceRecord::initial(device_id, now_ms));
        Ok(record.clone())
    }

    async fn update_last_seen(&self, device_id: &str, at_ms: i64) -> Result<(), StorageError> {
        let mut map = self
            .devices
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let record = map
            .get_mut(device_id)
            .ok_or_else(|| StorageError::device_not_found(device_id))?;
        record.last_seen_at_ms = Some(at_ms);
        Ok(())
    }

    async fn commit_transition(
        &self,
        device_id: &str,
        new_state: DeviceState,
        changed_at_ms: i64,
        duration_delta_ms: i64,
        started_at_ms: i64,
    ) -> Result<(), StorageError> {
        let mut map = self
            .devices
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let record = map
            .get_mut(device_id)
            .ok_or_else(|| StorageError::device_not_found(device_id))?;
        record.state = new_state;
        record.state_changed_at_ms = changed_at_ms;
        match new_state {
            // 进入 ON：离开的是 OUTAGE，累加断电时长
            DeviceState::On => {
                record.total_outage_duration_ms = record
                    .total_outage_duration_ms
                    .saturating_add(duration_delta_ms);
                record.last_online_started_at_ms = Some(started_at_ms);
            }
            // 进入 OUTAGE：离开的是 ON，累加在线时长
            DeviceState::Outage => {
                record.total_online_duration_ms = record
                    .total_online_duration_ms
                    .saturating_add(duration_delta_ms);
                record.last_outage_started_at_ms = Some(started_at_ms);
            }
        }
        Ok(())
    }
}
