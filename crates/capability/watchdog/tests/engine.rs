use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use domain::DeviceState;
use gridwatch_notify::{Notifier, NotifyError};
use gridwatch_storage::{DeviceRecord, DeviceStore, InMemoryDeviceStore, StorageError};
use gridwatch_watchdog::WatchdogEngine;

const DEVICE: &str = "default";
const THRESHOLD_MS: u64 = 10_000;

/// 记录所有消息的测试通知器，可切换为失败模式。
struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            messages: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        })
    }

    fn sent(&self) -> Vec<String> {
        self.messages.lock().expect("lock").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Http("connection refused".to_string()));
        }
        self.messages.lock().expect("lock").push(text.to_string());
        Ok(())
    }
}

/// 包装内存存储、可按开关注入写失败的测试存储。
struct FlakyStore {
    inner: InMemoryDeviceStore,
    fail_commit: AtomicBool,
    fail_last_seen: AtomicBool,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: InMemoryDeviceStore::new(),
            fail_commit: AtomicBool::new(false),
            fail_last_seen: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl DeviceStore for FlakyStore {
    async fn load_or_create(
        &self,
        device_id: &str,
        now_ms: i64,
    ) -> Result<DeviceRecord, StorageError> {
        self.inner.load_or_create(device_id, now_ms).await
    }

    async fn update_last_seen(&self, device_id: &str, at_ms: i64) -> Result<(), StorageError> {
        if self.fail_last_seen.load(Ordering::SeqCst) {
            return Err(StorageError::new("store unreachable"));
        }
        self.inner.update_last_seen(device_id, at_ms).await
    }

    async fn commit_transition(
        &self,
        device_id: &str,
        new_state: DeviceState,
        changed_at_ms: i64,
        duration_delta_ms: i64,
        started_at_ms: i64,
    ) -> Result<(), StorageError> {
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(StorageError::new("store unreachable"));
        }
        self.inner
            .commit_transition(
                device_id,
                new_state,
                changed_at_ms,
                duration_delta_ms,
                started_at_ms,
            )
            .await
    }
}

async fn engine_at(
    store: Arc<InMemoryDeviceStore>,
    notifier: Arc<RecordingNotifier>,
    now_ms: i64,
) -> WatchdogEngine {
    WatchdogEngine::restore(DEVICE, THRESHOLD_MS, store, notifier, now_ms)
        .await
        .expect("restore")
}

#[tokio::test]
async fn initial_boot_reports_outage_never_seen() {
    let store = Arc::new(InMemoryDeviceStore::new());
    let notifier = RecordingNotifier::new();
    let engine = engine_at(Arc::clone(&store), Arc::clone(&notifier), 0).await;

    let status = engine.status(1_000).await;
    assert_eq!(status.state, DeviceState::Outage);
    assert_eq!(status.last_seen_at_ms, None);
    assert_eq!(status.seconds_ago, None);
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn heartbeat_during_outage_flips_to_on_and_notifies_once() {
    let store = Arc::new(InMemoryDeviceStore::new());
    let notifier = RecordingNotifier::new();
    // 断电自 t=0 起，心跳在 t=5000 到达
    let engine = engine_at(Arc::clone(&store), Arc::clone(&notifier), 0).await;

    engine.record_heartbeat(5_000).await;

    let status = engine.status(5_000).await;
    assert_eq!(status.state, DeviceState::On);
    assert_eq!(status.last_seen_at_ms, Some(5_000));
    assert_eq!(status.seconds_ago, Some(0));

    let record = store.snapshot(DEVICE).expect("record");
    assert_eq!(record.state, DeviceState::On);
    assert_eq!(record.state_changed_at_ms, 5_000);
    assert_eq!(record.total_outage_duration_ms, 5_000);
    assert_eq!(record.total_online_duration_ms, 0);
    assert_eq!(record.last_online_started_at_ms, Some(5_000));

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("5s"), "message was: {}", sent[0]);
    assert!(sent[0].contains("restored"), "message was: {}", sent[0]);
}

#[tokio::test]
async fn heartbeat_while_on_is_routine_not_an_event() {
    let store = Arc::new(InMemoryDeviceStore::new());
    let notifier = RecordingNotifier::new();
    let engine = engine_at(Arc::clone(&store), Arc::clone(&notifier), 0).await;
    engine.record_heartbeat(1_000).await;

    engine.record_heartbeat(4_000).await;
    engine.record_heartbeat(7_000).await;

    // 仅首个心跳产生切换通知
    assert_eq!(notifier.sent().len(), 1);
    let record = store.snapshot(DEVICE).expect("record");
    assert_eq!(record.total_outage_duration_ms, 1_000);
    assert_eq!(record.last_seen_at_ms, Some(7_000));
    assert_eq!(record.state_changed_at_ms, 1_000);
}

#[tokio::test]
async fn staleness_is_noop_within_threshold() {
    let store = Arc::new(InMemoryDeviceStore::new());
    let notifier = RecordingNotifier::new();
    let engine = engine_at(Arc::clone(&store), Arc::clone(&notifier), 0).await;
    engine.record_heartbeat(0).await;

    // 恰好等于阈值也不触发（严格大于才算过期）
    engine.check_staleness(THRESHOLD_MS as i64).await;

    let status = engine.status(THRESHOLD_MS as i64).await;
    assert_eq!(status.state, DeviceState::On);
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn staleness_is_noop_when_never_seen() {
    let store = Arc::new(InMemoryDeviceStore::new());
    let notifier = RecordingNotifier::new();
    let engine = engine_at(Arc::clone(&store), Arc::clone(&notifier), 0).await;

    engine.check_staleness(60_000).await;

    let status = engine.status(60_000).await;
    assert_eq!(status.state, DeviceState::Outage);
    assert!(notifier.sent().is_empty());
    let record = store.snapshot(DEVICE).expect("record");
    assert_eq!(record.total_online_duration_ms, 0);
}

#[tokio::test]
async fn staleness_fires_after_threshold() {
    let store = Arc::new(InMemoryDeviceStore::new());
    let notifier = RecordingNotifier::new();
    let engine = engine_at(Arc::clone(&store), Arc::clone(&notifier), 0).await;
    // 最近心跳在 t=0，巡检在 t=15000
    engine.record_heartbeat(0).await;

    engine.check_staleness(15_000).await;

    let status = engine.status(15_000).await;
    assert_eq!(status.state, DeviceState::Outage);

    let record = store.snapshot(DEVICE).expect("record");
    assert_eq!(record.state, DeviceState::Outage);
    assert_eq!(record.total_online_duration_ms, 15_000);
    assert_eq!(record.last_outage_started_at_ms, Some(15_000));

    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[1].contains("outage detected"), "message was: {}", sent[1]);
    assert!(sent[1].contains("15s"), "message was: {}", sent[1]);
}

#[tokio::test]
async fn staleness_does_not_double_fire() {
    let store = Arc::new(InMemoryDeviceStore::new());
    let notifier = RecordingNotifier::new();
    let engine = engine_at(Arc::clone(&store), Arc::clone(&notifier), 0).await;
    engine.record_heartbeat(0).await;
    engine.check_staleness(15_000).await;

    // 无新心跳的连续巡检是幂等的
    engine.check_staleness(20_000).await;
    engine.check_staleness(25_000).await;

    assert_eq!(notifier.sent().len(), 2);
    let record = store.snapshot(DEVICE).expect("record");
    assert_eq!(record.total_online_duration_ms, 15_000);
    assert_eq!(record.state_changed_at_ms, 15_000);
}

#[tokio::test]
async fn restore_reflects_persisted_record() {
    let record = DeviceRecord {
        device_id: DEVICE.to_string(),
        state: DeviceState::On,
        state_changed_at_ms: 100_000,
        last_seen_at_ms: Some(123_000),
        total_outage_duration_ms: 40_000,
        total_online_duration_ms: 60_000,
        last_outage_started_at_ms: Some(50_000),
        last_online_started_at_ms: Some(100_000),
    };
    let store = Arc::new(InMemoryDeviceStore::with_record(record));
    let notifier = RecordingNotifier::new();

    let engine = engine_at(Arc::clone(&store), Arc::clone(&notifier), 200_000).await;

    let status = engine.status(125_000).await;
    assert_eq!(status.state, DeviceState::On);
    assert_eq!(status.last_seen_at_ms, Some(123_000));
    assert_eq!(status.seconds_ago, Some(2));
    // 恢复本身不产生通知
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn restored_on_state_times_out_from_persisted_last_seen() {
    // 崩溃重启后巡检依据持久化的 last_seen 重新判定
    let record = DeviceRecord {
        device_id: DEVICE.to_string(),
        state: DeviceState::On,
        state_changed_at_ms: 0,
        last_seen_at_ms: Some(5_000),
        total_outage_duration_ms: 0,
        total_online_duration_ms: 0,
        last_outage_started_at_ms: None,
        last_online_started_at_ms: Some(0),
    };
    let store = Arc::new(InMemoryDeviceStore::with_record(record));
    let notifier = RecordingNotifier::new();
    let engine = engine_at(Arc::clone(&store), Arc::clone(&notifier), 30_000).await;

    engine.check_staleness(30_000).await;

    let status = engine.status(30_000).await;
    assert_eq!(status.state, DeviceState::Outage);
    assert_eq!(notifier.sent().len(), 1);
    let stored = store.snapshot(DEVICE).expect("record");
    assert_eq!(stored.total_online_duration_ms, 30_000);
}

#[tokio::test]
async fn commit_failure_still_flips_state_and_notifies() {
    let store = Arc::new(FlakyStore::new());
    let notifier = RecordingNotifier::new();
    let engine = WatchdogEngine::restore(
        DEVICE,
        THRESHOLD_MS,
        Arc::clone(&store) as Arc<dyn DeviceStore>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        0,
    )
    .await
    .expect("restore");

    store.fail_commit.store(true, Ordering::SeqCst);
    engine.record_heartbeat(5_000).await;

    // 观测状态照常翻转，通知照常发出
    let status = engine.status(5_000).await;
    assert_eq!(status.state, DeviceState::On);
    assert_eq!(notifier.sent().len(), 1);
    // 持久化记录保持原状（写失败被吞掉）
    let record = store.inner.snapshot(DEVICE).expect("record");
    assert_eq!(record.state, DeviceState::Outage);
    assert_eq!(record.total_outage_duration_ms, 0);
}

#[tokio::test]
async fn last_seen_write_failure_does_not_block_heartbeat() {
    let store = Arc::new(FlakyStore::new());
    let notifier = RecordingNotifier::new();
    let engine = WatchdogEngine::restore(
        DEVICE,
        THRESHOLD_MS,
        Arc::clone(&store) as Arc<dyn DeviceStore>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        0,
    )
    .await
    .expect("restore");

    store.fail_last_seen.store(true, Ordering::SeqCst);
    engine.record_heartbeat(3_000).await;

    let status = engine.status(3_000).await;
    assert_eq!(status.state, DeviceState::On);
    assert_eq!(status.last_seen_at_ms, Some(3_000));
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn notify_failure_does_not_roll_back_transition() {
    let store = Arc::new(InMemoryDeviceStore::new());
    let notifier = RecordingNotifier::new();
    let engine = engine_at(Arc::clone(&store), Arc::clone(&notifier), 0).await;

    notifier.fail.store(true, Ordering::SeqCst);
    engine.record_heartbeat(2_000).await;

    let status = engine.status(2_000).await;
    assert_eq!(status.state, DeviceState::On);
    let record = store.snapshot(DEVICE).expect("record");
    assert_eq!(record.state, DeviceState::On);
    assert_eq!(record.total_outage_duration_ms, 2_000);
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn clock_skew_clamps_duration_to_zero() {
    let store = Arc::new(InMemoryDeviceStore::new());
    let notifier = RecordingNotifier::new();
    // 记录创建于 t=10000，心跳带着回拨后的时钟 t=4000 到达
    let engine = engine_at(Arc::clone(&store), Arc::clone(&notifier), 10_000).await;

    engine.record_heartbeat(4_000).await;

    let record = store.snapshot(DEVICE).expect("record");
    assert_eq!(record.state, DeviceState::On);
    assert_eq!(record.total_outage_duration_ms, 0);
    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("0s"), "message was: {}", sent[0]);
}

#[tokio::test]
async fn seconds_ago_rounds_to_nearest() {
    let store = Arc::new(InMemoryDeviceStore::new());
    let notifier = RecordingNotifier::new();
    let engine = engine_at(Arc::clone(&store), Arc::clone(&notifier), 0).await;
    engine.record_heartbeat(0).await;

    assert_eq!(engine.status(1_499).await.seconds_ago, Some(1));
    assert_eq!(engine.status(1_500).await.seconds_ago, Some(2));
}

#[tokio::test]
async fn restore_propagates_store_failure() {
    struct DeadStore;
    #[async_trait]
    impl DeviceStore for DeadStore {
        async fn load_or_create(
            &self,
            _device_id: &str,
            _now_ms: i64,
        ) -> Result<DeviceRecord, StorageError> {
            Err(StorageError::new("store unreachable"))
        }
        async fn update_last_seen(&self, _: &str, _: i64) -> Result<(), StorageError> {
            Err(StorageError::new("store unreachable"))
        }
        async fn commit_transition(
            &self,
            _: &str,
            _: DeviceState,
            _: i64,
            _: i64,
            _: i64,
        ) -> Result<(), StorageError> {
            Err(StorageError::new("store unreachable"))
        }
    }

    let notifier = RecordingNotifier::new();
    let result = WatchdogEngine::restore(
        DEVICE,
        THRESHOLD_MS,
        Arc::new(DeadStore),
        notifier,
        0,
    )
    .await;
    assert!(result.is_err());
}
