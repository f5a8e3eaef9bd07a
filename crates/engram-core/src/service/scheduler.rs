//! Lifecycle Scheduler
//!
//! Drives the three background operations on independent tokio tasks:
//! consolidation, decay, and feedback adjustment each tick on their own
//! interval, so one slow job never starves the others. Each run gets a
//! hard time budget; a run that blows the budget is cancelled and the
//! next tick starts clean.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::SchedulerConfig;

use super::MemoryService;

/// Handle over the running background loops
pub struct LifecycleScheduler {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl LifecycleScheduler {
    /// Spawn the background loops for a shared service
    pub fn start(service: Arc<MemoryService>, config: SchedulerConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        let mut handles = Vec::new();

        {
            let service = Arc::clone(&service);
            let rx = shutdown.subscribe();
            let interval = Duration::from_secs(config.consolidation_interval_secs);
            let budget = Duration::from_secs(config.consolidation_budget_secs);
            handles.push(tokio::spawn(run_loop(
                "consolidation",
                interval,
                budget,
                rx,
                move || {
                    let service = Arc::clone(&service);
                    async move {
                        match service.run_consolidation().await {
                            Ok(report) => tracing::info!(
                                clusters = report.clusters_processed,
                                created = report.memories_created,
                                "consolidation tick finished"
                            ),
                            Err(err) => tracing::warn!(error = %err, "consolidation tick failed"),
                        }
                    }
                },
            )));
        }

        {
            let service = Arc::clone(&service);
            let rx = shutdown.subscribe();
            let interval = Duration::from_secs(config.decay_interval_secs);
            let budget = Duration::from_secs(config.decay_budget_secs);
            handles.push(tokio::spawn(run_loop(
                "decay",
                interval,
                budget,
                rx,
                move || {
                    let service = Arc::clone(&service);
                    async move {
                        match service.run_decay_cycle().await {
                            Ok(report) => tracing::info!(
                                archived = report.archived,
                                purged = report.purged,
                                "decay tick finished"
                            ),
                            Err(err) => tracing::warn!(error = %err, "decay tick failed"),
                        }
                    }
                },
            )));
        }

        {
            let service = Arc::clone(&service);
            let rx = shutdown.subscribe();
            let interval = Duration::from_secs(config.feedback_interval_secs);
            // Feedback passes share the decay budget; both are store-bound
            let budget = Duration::from_secs(config.decay_budget_secs);
            handles.push(tokio::spawn(run_loop(
                "feedback",
                interval,
                budget,
                rx,
                move || {
                    let service = Arc::clone(&service);
                    async move {
                        match service.adjust_policy().await {
                            Ok(report) => tracing::info!(
                                promoted = report.promoted,
                                demoted = report.demoted,
                                "feedback tick finished"
                            ),
                            Err(err) => tracing::warn!(error = %err, "feedback tick failed"),
                        }
                    }
                },
            )));
        }

        Self { shutdown, handles }
    }

    /// Signal the loops to stop and wait for them to drain
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

/// One background loop: tick, run within budget, repeat until shutdown
async fn run_loop<F, Fut>(
    name: &'static str,
    interval: Duration,
    budget: Duration,
    mut shutdown: watch::Receiver<bool>,
    job: F,
) where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    // The immediate first tick would race service startup
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if tokio::time::timeout(budget, job()).await.is_err() {
                    tracing::warn!(job = name, budget_secs = budget.as_secs(), "job exceeded budget, cancelled");
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    tracing::debug!(job = name, "scheduler loop stopped");
                    return;
                }
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
