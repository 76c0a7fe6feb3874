//! 追踪与请求 ID 生成。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 基础指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub heartbeats_received: u64,
    pub staleness_checks: u64,
    pub transitions_to_on: u64,
    pub transitions_to_outage: u64,
    pub notify_success: u64,
    pub notify_failure: u64,
    pub store_write_failure: u64,
}

/// 基础指标。
pub struct TelemetryMetrics {
    heartbeats_received: AtomicU64,
    staleness_checks: AtomicU64,
    transitions_to_on: AtomicU64,
    transitions_to_outage: AtomicU64,
    notify_success: AtomicU64,
    notify_failure: AtomicU64,
    store_write_failure: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            heartbeats_received: AtomicU64::new(0),
            staleness_checks: AtomicU64::new(0),
            transitions_to_on: AtomicU64::new(0),
            transitions_to_outage: AtomicU64::new(0),
            notify_success: AtomicU64::new(0),
            notify_failure: AtomicU64::new(0),
            store_write_failure: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            heartbeats_received: self.heartbeats_received.load(Ordering::Relaxed),
            staleness_checks: self.staleness_checks.load(Ordering::Relaxed),
            transitions_to_on: self.transitions_to_on.load(Ordering::Relaxed),
            transitions_to_outage: self.transitions_to_outage.load(Ordering::Relaxed),
            notify_success: self.notify_success.load(Ordering::Relaxed),
            notify_failure: self.notify_failure.load(Ordering::Relaxed),
            store_write_failure: self.store_write_failure.load(Ordering::Relaxed),
        }
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录收到心跳次数。
pub fn record_heartbeat_received() {
    metrics().heartbeats_received.fetch_add(1, Ordering::Relaxed);
}

/// 记录看门狗巡检次数。
pub fn record_staleness_check() {
    metrics().staleness_checks.fetch_add(1, Ordering::Relaxed);
}

/// 记录 OUTAGE -> ON 状态切换次数。
pub fn record_transition_to_on() {
    metrics().transitions_to_on.fetch_add(1, Ordering::Relaxed);
}

/// 记录 ON -> OUTAGE 状态切换次数。
pub fn record_transition_to_outage() {
    metrics()
        .transitions_to_outage
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录通知发送成功次数。
pub fn record_notify_success() {
    metrics().notify_success.fetch_add(1, Ordering::Relaxed);
}

/// 记录通知发送失败次数（记录后吞掉，不向调用方传播）。
pub fn record_notify_failure() {
    metrics().notify_failure.fetch_add(1, Ordering::Relaxed);
}

/// 记录存储写失败次数（尽力而为路径）。
pub fn record_store_write_failure() {
    metrics().store_write_failure.fetch_add(1, Ordering::Relaxed);
}
