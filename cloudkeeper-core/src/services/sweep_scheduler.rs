//! Periodic status sweep
//!
//! A background task that calls [`DomainController::sweep`] on a fixed
//! interval. The first sweep happens one full period after start.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::services::DomainController;

/// Default sweep period (5 minutes).
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// 定时巡检调度器
pub struct SweepScheduler;

impl SweepScheduler {
    /// Start sweeping every `period`. The returned handle cancels the task
    /// when stopped or dropped.
    #[must_use]
    pub fn spawn(controller: Arc<DomainController>, period: Duration) -> SweepHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            log::info!("Status sweep every {}s", period.as_secs());

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        if controller.is_empty().await {
                            log::debug!("No records, skipping sweep");
                            continue;
                        }
                        if let Err(e) = controller.sweep().await {
                            if e.is_expected() {
                                log::warn!("Status sweep failed: {e}");
                            } else {
                                log::error!("Status sweep failed: {e}");
                            }
                        }
                    }
                }
            }
            log::debug!("Status sweep stopped");
        });

        SweepHandle {
            stop: Some(stop_tx),
            task,
        }
    }
}

/// Handle to a running sweep task.
pub struct SweepHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Signal the task and wait for it to finish the current sweep.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Err(e) = (&mut self.task).await {
            if !e.is_cancelled() {
                log::error!("Sweep task ended abnormally: {e}");
            }
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::AuditService;
    use crate::test_utils::{test_record, MockAuditStore, MockDomainRepository, MockInspector};
    use crate::types::DomainStatus;

    async fn controller_with(
        repository: &Arc<MockDomainRepository>,
    ) -> Arc<DomainController> {
        controller_inspected_by(repository, Arc::new(MockInspector::new())).await
    }

    async fn controller_inspected_by(
        repository: &Arc<MockDomainRepository>,
        inspector: Arc<MockInspector>,
    ) -> Arc<DomainController> {
        let audit = AuditService::new(
            Arc::new(MockAuditStore::new()),
            Arc::new(MockAuditStore::new()),
        );
        let controller = Arc::new(DomainController::new(repository.clone(), inspector, audit));
        controller.load().await.unwrap();
        controller
    }

    async fn two_records() -> Arc<MockDomainRepository> {
        let repository = Arc::new(MockDomainRepository::new());
        repository
            .seed(vec![
                test_record("a", "https://a.example"),
                test_record("b", "https://b.example"),
            ])
            .await;
        repository
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_per_period_with_one_batch() {
        let repository = two_records().await;
        let controller = controller_with(&repository).await;
        let handle = SweepScheduler::spawn(controller.clone(), DEFAULT_SWEEP_INTERVAL);

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert!(repository.batch_calls().await.is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        let batches = repository.batch_calls().await;
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], vec!["a".to_string(), "b".to_string()]);
        for record in controller.records().await {
            assert_eq!(record.status, DomainStatus::Online);
        }

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_sweep_passes_through_checking() {
        let repository = two_records().await;
        let inspector = Arc::new(MockInspector::gated());
        let controller = controller_inspected_by(&repository, inspector.clone()).await;
        let handle = SweepScheduler::spawn(controller.clone(), DEFAULT_SWEEP_INTERVAL);

        tokio::time::sleep(Duration::from_secs(301)).await;
        while inspector.status_calls().await < 2 {
            tokio::task::yield_now().await;
        }
        for record in controller.records().await {
            assert_eq!(record.status, DomainStatus::Checking);
        }

        inspector.release(2);
        while repository.batch_calls().await.is_empty() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        for record in controller.records().await {
            assert_eq!(record.status, DomainStatus::Online);
        }

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_scheduler_no_longer_sweeps() {
        let repository = two_records().await;
        let controller = controller_with(&repository).await;
        let handle = SweepScheduler::spawn(controller, DEFAULT_SWEEP_INTERVAL);

        handle.stop().await;
        tokio::time::sleep(Duration::from_secs(900)).await;
        assert!(repository.batch_calls().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_handle_cancels_task() {
        let repository = two_records().await;
        let controller = controller_with(&repository).await;
        drop(SweepScheduler::spawn(controller, Duration::from_secs(60)));

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert!(repository.batch_calls().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_list_skips_sweep() {
        let repository = Arc::new(MockDomainRepository::new());
        let controller = controller_with(&repository).await;
        let handle = SweepScheduler::spawn(controller, Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(601)).await;
        assert!(repository.batch_calls().await.is_empty());
        assert!(!handle.is_finished());
        handle.stop().await;
    }
}
