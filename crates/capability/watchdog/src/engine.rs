//! 看门狗状态引擎。
//!
//! 每个被监控设备一个引擎实例，显式持有状态镜像，通过注入的
//! 存储与通知接口与外界交互。引擎内部的 tokio Mutex 在整个
//! 读取-判定-提交-通知 序列上保持持有，心跳入口与巡检入口
//! 对同一设备串行化，不会产生相互冲突的切换或重复计时。

use std::sync::Arc;

use domain::DeviceState;
use gridwatch_notify::Notifier;
use gridwatch_storage::DeviceStore;
use gridwatch_telemetry::{
    record_heartbeat_received, record_notify_failure, record_notify_success,
    record_staleness_check, record_store_write_failure, record_transition_to_on,
    record_transition_to_outage,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::format::format_duration;

/// 看门狗错误。启动恢复失败是唯一会向调用方传播的错误。
#[derive(Debug, thiserror::Error)]
pub enum WatchdogError {
    #[error("state restore failed: {0}")]
    Restore(String),
}

/// 状态查询的只读投影。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub state: DeviceState,
    pub last_seen_at_ms: Option<i64>,
    /// 距最近一次心跳的秒数（四舍五入）；从未收到心跳为 None。
    pub seconds_ago: Option<i64>,
}

/// 引擎内部状态镜像。
///
/// 由 `restore` 从持久化记录播种一次，之后每次变更先改镜像、
/// 再写穿到存储；所有判定只读镜像，两处切换点口径一致。
struct EngineState {
    state: DeviceState,
    state_changed_at_ms: i64,
    last_seen_at_ms: Option<i64>,
}

/// 看门狗状态引擎（单设备）。
pub struct WatchdogEngine {
    device_id: String,
    outage_threshold_ms: i64,
    store: Arc<dyn DeviceStore>,
    notifier: Arc<dyn Notifier>,
    inner: Mutex<EngineState>,
}

impl WatchdogEngine {
    /// 恢复启动状态并构造引擎。
    ///
    /// 在调度器启动、任何心跳被处理之前调用一次。存储不可达时
    /// 返回错误，进程不得以未定义的初始状态开始提供服务。
    pub async fn restore(
        device_id: impl Into<String>,
        outage_threshold_ms: u64,
        store: Arc<dyn DeviceStore>,
        notifier: Arc<dyn Notifier>,
        now_ms: i64,
    ) -> Result<Self, WatchdogError> {
        let device_id = device_id.into();
        let record = store
            .load_or_create(&device_id, now_ms)
            .await
            .map_err(|err| WatchdogError::Restore(err.to_string()))?;
        info!(
            target: "gridwatch.watchdog",
            device_id = %device_id,
            state = %record.state,
            last_seen_at_ms = ?record.last_seen_at_ms,
            "state_restored"
        );
        Ok(Self {
            device_id,
            outage_threshold_ms: outage_threshold_ms as i64,
            store,
            notifier,
            inner: Mutex::new(EngineState {
                state: record.state,
                state_changed_at_ms: record.state_changed_at_ms,
                last_seen_at_ms: record.last_seen_at_ms,
            }),
        })
    }

    /// 处理一次设备心跳。
    ///
    /// 无条件刷新最近心跳时间；当前处于 OUTAGE 时切换到 ON，
    /// 累计断电时长并推送恢复通知。正常运行下绝不向调用方抛错。
    pub async fn record_heartbeat(&self, now_ms: i64) {
        record_heartbeat_received();
        let mut inner = self.inner.lock().await;

        inner.last_seen_at_ms = Some(now_ms);
        // 心跳时间尽力落盘：存储抖动不得阻断活性跟踪
        if let Err(err) = self.store.update_last_seen(&self.device_id, now_ms).await {
            record_store_write_failure();
            warn!(
                target: "gridwatch.watchdog",
                device_id = %self.device_id,
                error = %err,
                "update_last_seen_failed"
            );
        }

        if inner.state == DeviceState::On {
            // 在线期间的心跳是常态，不是事件
            return;
        }

        let outage_ms = clamped_duration(now_ms - inner.state_changed_at_ms);
        self.commit(&mut inner, DeviceState::On, now_ms, outage_ms)
            .await;
        record_transition_to_on();
        info!(
            target: "gridwatch.watchdog",
            device_id = %self.device_id,
            outage_ms,
            "device_back_online"
        );

        let text = format!(
            "✅ Power restored after *{}* of outage",
            format_duration(outage_ms as u64)
        );
        self.notify(&text).await;
    }

    /// 巡检心跳是否过期。由调度器按固定间隔调用。
    ///
    /// 仅当 `state == ON` 且最近心跳距今超过阈值时切换到 OUTAGE；
    /// 其余情况（包括从未收到心跳、已处于 OUTAGE）是无副作用的空操作，
    /// 连续巡检不会重复触发。
    pub async fn check_staleness(&self, now_ms: i64) {
        record_staleness_check();
        let mut inner = self.inner.lock().await;

        if inner.state != DeviceState::On {
            return;
        }
        let Some(last_seen_ms) = inner.last_seen_at_ms else {
            return;
        };
        if now_ms - last_seen_ms <= self.outage_threshold_ms {
            return;
        }

        let online_ms = clamped_duration(now_ms - inner.state_changed_at_ms);
        self.commit(&mut inner, DeviceState::Outage, now_ms, online_ms)
            .await;
        record_transition_to_outage();
        warn!(
            target: "gridwatch.watchdog",
            device_id = %self.device_id,
            online_ms,
            silent_for_ms = now_ms - last_seen_ms,
            "outage_detected"
        );

        let text = format!(
            "⚠️ Power outage detected after *{}* online",
            format_duration(online_ms as u64)
        );
        self.notify(&text).await;
    }

    /// 当前状态的只读投影。
    pub async fn status(&self, now_ms: i64) -> StatusSnapshot {
        let inner = self.inner.lock().await;
        let seconds_ago = inner
            .last_seen_at_ms
            .map(|last_seen_ms| ((now_ms - last_seen_ms) as f64 / 1_000.0).round() as i64);
        StatusSnapshot {
            state: inner.state,
            last_seen_at_ms: inner.last_seen_at_ms,
            seconds_ago,
        }
    }

    /// 统一的切换提交策略：先更新镜像，再尽力写穿到存储。
    ///
    /// 落盘失败只记日志——观测到的状态照常翻转，随后的通知照常
    /// 发出，通知不得因存储错误被静默丢弃。
    async fn commit(
        &self,
        inner: &mut EngineState,
        new_state: DeviceState,
        now_ms: i64,
        duration_delta_ms: i64,
    ) {
        inner.state = new_state;
        inner.state_changed_at_ms = now_ms;
        if let Err(err) = self
            .store
            .commit_transition(&self.device_id, new_state, now_ms, duration_delta_ms, now_ms)
            .await
        {
            record_store_write_failure();
            warn!(
                target: "gridwatch.watchdog",
                device_id = %self.device_id,
                new_state = %new_state,
                error = %err,
                "commit_transition_failed"
            );
        }
    }

    /// 推送切换通知。失败记日志后吞掉，不重试、不回滚状态。
    async fn notify(&self, text: &str) {
        match self.notifier.send(text).await {
            Ok(()) => record_notify_success(),
            Err(err) => {
                record_notify_failure();
                warn!(
                    target: "gridwatch.watchdog",
                    device_id = %self.device_id,
                    error = %err,
                    "notify_failed"
                );
            }
        }
    }
}

/// 时长钳制：时钟回拨导致的负时长按零计并记录异常。
fn clamped_duration(delta_ms: i64) -> i64 {
    if delta_ms < 0 {
        warn!(
            target: "gridwatch.watchdog",
            delta_ms,
            "negative_duration_clamped"
        );
        return 0;
    }
    delta_ms
}
