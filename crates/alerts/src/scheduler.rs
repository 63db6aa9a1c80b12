//! Periodic alert evaluation.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info};

use crate::evaluator::AlertEvaluator;

/// Runs the bulk evaluation on a fixed interval.
pub struct AlertScheduler {
    evaluator: Arc<AlertEvaluator>,
    period: Duration,
}

impl AlertScheduler {
    pub fn new(evaluator: Arc<AlertEvaluator>, period: Duration) -> Self {
        Self { evaluator, period }
    }

    /// Spawns the evaluation loop. Runs are serialized; a slow run delays
    /// the next tick instead of overlapping it.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.period);
            info!(period_secs = self.period.as_secs(), "Alert scheduler started");

            loop {
                ticker.tick().await;

                match self.evaluator.run_all().await {
                    Ok(summary) => {
                        if summary.failed > 0 {
                            error!(
                                failed = summary.failed,
                                total = summary.total,
                                "Alert run finished with failed tenants"
                            );
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "Alert run could not list tenants");
                    }
                }
            }
        })
    }
}
