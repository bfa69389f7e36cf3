use chrono::Duration as ChronoDuration;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::domain::order::{EscalationReport, OrderService};
use crate::metrics::Metrics;

// ============================================================================
// Escalation Scheduler
// ============================================================================
//
// Periodically hands refund/exchange requests that partners left untouched
// to admins. One sweep at a time: a tick or manual trigger that finds another
// sweep running is skipped. A failed sweep is logged and the next tick tries again.
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct EscalationConfig {
    pub interval: Duration,
    /// Age after which a partner-owned request escalates
    pub threshold: ChronoDuration,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(24 * 60 * 60),
            threshold: ChronoDuration::days(7),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SweepOutcome {
    Completed(EscalationReport),
    /// Another sweep held the run lock
    Skipped,
    Failed,
}

pub struct EscalationScheduler {
    orders: Arc<OrderService>,
    config: EscalationConfig,
    metrics: Arc<Metrics>,
    run_lock: Mutex<()>,
}

/// Owned by the process; `stop` waits for an in-flight sweep to finish.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Escalation scheduler task ended abnormally");
        }
    }
}

impl EscalationScheduler {
    pub fn new(orders: Arc<OrderService>, config: EscalationConfig, metrics: Arc<Metrics>) -> Self {
        Self {
            orders,
            config,
            metrics,
            run_lock: Mutex::new(()),
        }
    }

    pub async fn sweep(&self) -> SweepOutcome {
        let Ok(_running) = self.run_lock.try_lock() else {
            tracing::warn!("Escalation sweep still running, skipping this tick");
            self.metrics.record_sweep("skipped", 0.0);
            return SweepOutcome::Skipped;
        };

        let started = Instant::now();
        let result = self.orders.escalate_stale(self.config.threshold).await;
        let elapsed = started.elapsed().as_secs_f64();

        match result {
            Ok(report) => {
                let outcome = if report.failed > 0 { "partial" } else { "completed" };
                self.metrics.record_sweep(outcome, elapsed);
                SweepOutcome::Completed(report)
            }
            Err(error) => {
                tracing::error!(error = %error, "Escalation sweep failed, will retry next tick");
                self.metrics.record_sweep("failed", elapsed);
                SweepOutcome::Failed
            }
        }
    }

    /// Spawn the sweep loop. The first sweep runs immediately.
    pub fn start(self: Arc<Self>) -> SchedulerHandle {
        let (shutdown, mut stopped) = watch::channel(false);

        let task = tokio::spawn(async move {
            tracing::info!(
                interval_secs = self.config.interval.as_secs(),
                threshold_days = self.config.threshold.num_days(),
                "Escalation scheduler started"
            );
            let mut interval = tokio::time::interval(self.config.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.sweep().await;
                    }
                    changed = stopped.changed() => {
                        if changed.is_err() || *stopped.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::info!("Escalation scheduler stopped");
        });

        SchedulerHandle { shutdown, task }
    }
}
