//! 补偿扫描
//!
//! 读取所有 NotSent 通知并逐条重新投递，单条失败不影响其余通知。
//! 扫描之间串行执行：已有扫描在进行时，新的触发直接丢弃。
//! 既可以在每次消费后触发，也可以按固定间隔独立运行。

use std::sync::Arc;
use std::time::Duration;

use alert_shared::observability::metrics;
use futures::StreamExt;
use futures::stream;
use notification_service::NotificationStatus;
use tokio::sync::{Mutex, OwnedMutexGuard, watch};
use tracing::{debug, error, info, warn};

use crate::error::{Result, WorkerError};
use crate::router::{DispatchOutcome, DispatchRouter};

/// 一次扫描的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub attempted: usize,
    pub sent: usize,
    pub already_sent: usize,
    pub failed: usize,
    pub unknown_channel: usize,
}

impl SweepReport {
    fn record(&mut self, result: &Result<DispatchOutcome>) {
        self.attempted += 1;
        match result {
            Ok(DispatchOutcome::Sent) => self.sent += 1,
            Ok(DispatchOutcome::AlreadySent) => self.already_sent += 1,
            Err(WorkerError::UnknownChannel(_)) => self.unknown_channel += 1,
            Err(_) => self.failed += 1,
        }
    }
}

pub struct RetrySweeper {
    router: Arc<DispatchRouter>,
    concurrency: usize,
    in_flight: Arc<Mutex<()>>,
}

impl RetrySweeper {
    pub fn new(router: Arc<DispatchRouter>, concurrency: usize) -> Self {
        Self {
            router,
            concurrency: concurrency.max(1),
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    /// 执行一次扫描，若已有扫描在进行则等待其结束
    pub async fn sweep(&self) -> Result<SweepReport> {
        let guard = self.in_flight.clone().lock_owned().await;
        self.sweep_locked(guard).await
    }

    /// 空闲时执行一次扫描，已有扫描在进行时返回 None
    pub async fn try_sweep(&self) -> Result<Option<SweepReport>> {
        match self.in_flight.clone().try_lock_owned() {
            Ok(guard) => self.sweep_locked(guard).await.map(Some),
            Err(_) => Ok(None),
        }
    }

    /// 在后台触发一次扫描，返回是否真正启动
    pub fn trigger(self: &Arc<Self>) -> bool {
        let Ok(guard) = self.in_flight.clone().try_lock_owned() else {
            debug!("补偿扫描进行中，丢弃本次触发");
            return false;
        };

        let sweeper = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = sweeper.sweep_locked(guard).await {
                error!(error = %e, "补偿扫描失败");
            }
        });
        true
    }

    async fn sweep_locked(&self, _guard: OwnedMutexGuard<()>) -> Result<SweepReport> {
        let pending = self
            .router
            .store()
            .find_by_status(NotificationStatus::NotSent)
            .await?;
        metrics::record_sweep(pending.len());

        let mut report = SweepReport::default();
        if pending.is_empty() {
            return Ok(report);
        }

        let router = &self.router;
        let mut results = stream::iter(pending)
            .map(|notification| async move {
                let result = router.dispatch(&notification).await;
                (notification.id, result)
            })
            .buffer_unordered(self.concurrency);

        while let Some((id, result)) = results.next().await {
            if let Err(e) = &result {
                warn!(notification_id = id, error = %e, "补偿投递失败");
            }
            report.record(&result);
        }

        info!(
            attempted = report.attempted,
            sent = report.sent,
            failed = report.failed,
            unknown_channel = report.unknown_channel,
            "补偿扫描完成"
        );
        Ok(report)
    }

    /// 按固定间隔扫描，直到收到 shutdown 信号
    pub async fn run_periodic(self: Arc<Self>, period: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(interval = ?period, "补偿扫描已启动");
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.try_sweep().await {
                        error!(error = %e, "定时补偿扫描失败");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("补偿扫描已停止");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notification_service::repository::MemoryNotificationStore;

    fn sweeper() -> Arc<RetrySweeper> {
        let store = Arc::new(MemoryNotificationStore::new());
        let router = Arc::new(DispatchRouter::new(store, true));
        Arc::new(RetrySweeper::new(router, 0))
    }

    #[tokio::test]
    async fn test_trigger_dropped_while_in_flight() {
        let sweeper = sweeper();
        let _running = sweeper.in_flight.clone().try_lock_owned().unwrap();

        assert!(!sweeper.trigger());
        assert_eq!(sweeper.try_sweep().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_store_sweep() {
        let sweeper = sweeper();
        assert_eq!(sweeper.concurrency, 1);
        assert_eq!(sweeper.sweep().await.unwrap(), SweepReport::default());
    }

    #[tokio::test]
    async fn test_run_periodic_stops_on_shutdown() {
        let sweeper = sweeper();
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(sweeper.run_periodic(Duration::from_millis(10), rx));

        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
