//! 看门狗巡检调度。
//!
//! 以固定间隔驱动 `check_staleness`。循环体 await 完当次巡检才
//! 等待下一个 tick，同一设备的巡检天然串行、永不自我重叠。

use std::sync::Arc;
use std::time::Duration;

use domain::now_epoch_ms;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::info;

use crate::engine::WatchdogEngine;

/// 运行中巡检任务的句柄。
pub struct SchedulerHandle {
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// 停止发出新的巡检 tick，并等待在途巡检结束。
    pub async fn stop(self) {
        self.shutdown.notify_one();
        let _ = self.task.await;
    }
}

/// 启动巡检循环。
pub fn spawn_staleness_checker(
    engine: Arc<WatchdogEngine>,
    check_every_ms: u64,
) -> SchedulerHandle {
    let shutdown = Arc::new(Notify::new());
    let shutdown_rx = Arc::clone(&shutdown);
    let task = tokio::spawn(async move {
        let mut ticker = interval(Duration::from_millis(check_every_ms));
        // 巡检耗时超过间隔时顺延下一次，而不是补发积压的 tick
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            target: "gridwatch.watchdog",
            check_every_ms,
            "staleness_checker_started"
        );
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    engine.check_staleness(now_epoch_ms()).await;
                }
                _ = shutdown_rx.notified() => {
                    info!(target: "gridwatch.watchdog", "staleness_checker_stopped");
                    break;
                }
            }
        }
    });
    SchedulerHandle { shutdown, task }
}
