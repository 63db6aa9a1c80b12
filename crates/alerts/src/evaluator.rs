//! Alert evaluation.
//!
//! All thresholds are strict: a reading equal to the threshold never
//! alerts. A tenant with no data in the window is healthy, not alerting.
//! Store failures and timeouts surface as failed checks in the report.

use std::sync::Arc;
use std::time::{Duration, Instant};

use event_store::{AggSource, HttpTotalsRow, JsTotalsRow, PerfAvgRow};
use monitor_core::{Error, Result, TenantDirectory, TimeWindow};
use serde::{Deserialize, Serialize};
use serde_json::json;
use telemetry::metrics;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::sink::{AlertEvent, AlertKind, NotificationSink, Severity};

/// Alert thresholds and evaluation limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Trailing evaluation window, milliseconds.
    #[serde(default = "default_window_ms")]
    pub window_ms: i64,
    /// Request error rate warning threshold, percent.
    #[serde(default = "default_error_rate_warn")]
    pub error_rate_warn_pct: f64,
    /// Request error rate critical threshold, percent.
    #[serde(default = "default_error_rate_crit")]
    pub error_rate_crit_pct: f64,
    /// Average FCP threshold, milliseconds.
    #[serde(default = "default_fcp_threshold")]
    pub fcp_threshold_ms: f64,
    /// Average LCP threshold, milliseconds.
    #[serde(default = "default_lcp_threshold")]
    pub lcp_threshold_ms: f64,
    /// JS error count warning threshold.
    #[serde(default = "default_js_warn")]
    pub js_error_warn: u64,
    /// JS error count critical threshold.
    #[serde(default = "default_js_crit")]
    pub js_error_crit: u64,
    /// Per-check timeout, seconds.
    #[serde(default = "default_check_timeout")]
    pub check_timeout_secs: u64,
    /// Concurrent tenants during bulk evaluation.
    #[serde(default = "default_concurrency")]
    pub max_concurrency: usize,
}

fn default_window_ms() -> i64 {
    3_600_000
}
fn default_error_rate_warn() -> f64 {
    5.0
}
fn default_error_rate_crit() -> f64 {
    10.0
}
fn default_fcp_threshold() -> f64 {
    3000.0
}
fn default_lcp_threshold() -> f64 {
    4000.0
}
fn default_js_warn() -> u64 {
    50
}
fn default_js_crit() -> u64 {
    100
}
fn default_check_timeout() -> u64 {
    10
}
fn default_concurrency() -> usize {
    8
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            error_rate_warn_pct: default_error_rate_warn(),
            error_rate_crit_pct: default_error_rate_crit(),
            fcp_threshold_ms: default_fcp_threshold(),
            lcp_threshold_ms: default_lcp_threshold(),
            js_error_warn: default_js_warn(),
            js_error_crit: default_js_crit(),
            check_timeout_secs: default_check_timeout(),
            max_concurrency: default_concurrency(),
        }
    }
}

/// Error-rate decision. `None` when the window has no requests or the
/// rate stays at or under the warning threshold.
fn evaluate_error_rate(totals: &HttpTotalsRow, config: &AlertConfig) -> Option<(Severity, f64)> {
    if totals.total_requests == 0 {
        return None;
    }
    let rate_pct = totals.error_requests as f64 / totals.total_requests as f64 * 100.0;
    if rate_pct > config.error_rate_crit_pct {
        Some((Severity::Critical, rate_pct))
    } else if rate_pct > config.error_rate_warn_pct {
        Some((Severity::Warning, rate_pct))
    } else {
        None
    }
}

/// Performance decision. Either Core Web Vital over its threshold trips
/// the alert; no samples means no reading and no alert.
fn evaluate_performance(avg: &PerfAvgRow, config: &AlertConfig) -> Option<(f64, f64)> {
    if avg.samples == 0 {
        return None;
    }
    let fcp = avg.fcp.unwrap_or(0.0);
    let lcp = avg.lcp.unwrap_or(0.0);
    if fcp > config.fcp_threshold_ms || lcp > config.lcp_threshold_ms {
        Some((fcp, lcp))
    } else {
        None
    }
}

/// JS error volume decision.
fn evaluate_js_errors(totals: &JsTotalsRow, config: &AlertConfig) -> Option<Severity> {
    if totals.total_errors > config.js_error_crit {
        Some(Severity::Critical)
    } else if totals.total_errors > config.js_error_warn {
        Some(Severity::Warning)
    } else {
        None
    }
}

/// Outcome of evaluating one tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantCheckReport {
    pub tenant_id: String,
    pub alerts: Vec<AlertEvent>,
    /// Check names that could not be evaluated (store failure, timeout).
    pub failed_checks: Vec<String>,
}

impl TenantCheckReport {
    pub fn is_clean(&self) -> bool {
        self.alerts.is_empty() && self.failed_checks.is_empty()
    }
}

/// Outcome of a bulk run across every active tenant.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCheckSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub alerts_raised: usize,
}

/// Threshold alert evaluator. Cheap to clone; clones share the source,
/// directory and sink.
#[derive(Clone)]
pub struct AlertEvaluator {
    source: Arc<dyn AggSource>,
    directory: Arc<dyn TenantDirectory>,
    sink: Arc<dyn NotificationSink>,
    config: AlertConfig,
}

impl AlertEvaluator {
    pub fn new(
        source: Arc<dyn AggSource>,
        directory: Arc<dyn TenantDirectory>,
        sink: Arc<dyn NotificationSink>,
        config: AlertConfig,
    ) -> Self {
        Self {
            source,
            directory,
            sink,
            config,
        }
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Run the three checks for one tenant over the trailing window.
    ///
    /// The checks are independent reads and run concurrently; one failing
    /// or timing out does not stop the others.
    pub async fn check_tenant(&self, tenant_id: &str) -> TenantCheckReport {
        let start = Instant::now();
        let window = TimeWindow::trailing(self.config.window_ms);
        let per_check = Duration::from_secs(self.config.check_timeout_secs);
        metrics().alert_checks_run.inc();

        let (http, perf, js) = tokio::join!(
            timeout(per_check, self.source.http_totals(tenant_id, window)),
            timeout(per_check, self.source.perf_averages(tenant_id, window)),
            timeout(per_check, self.source.js_error_totals(tenant_id, window)),
        );

        let mut alerts = Vec::new();
        let mut failed_checks = Vec::new();

        match flatten(http) {
            Ok(totals) => {
                if let Some((severity, rate_pct)) = evaluate_error_rate(&totals, &self.config) {
                    alerts.push(AlertEvent::new(
                        tenant_id,
                        AlertKind::ErrorRateHigh,
                        severity,
                        format!("Request error rate {:.2}%", rate_pct),
                        json!({
                            "errorRate": format!("{:.2}%", rate_pct),
                            "totalRequests": totals.total_requests,
                            "errorRequests": totals.error_requests,
                            "threshold": {
                                "warningPct": self.config.error_rate_warn_pct,
                                "criticalPct": self.config.error_rate_crit_pct,
                            },
                        }),
                    ));
                }
            }
            Err(e) => record_failure(&mut failed_checks, "error_rate", tenant_id, &e),
        }

        match flatten(perf) {
            Ok(avg) => {
                if let Some((fcp, lcp)) = evaluate_performance(&avg, &self.config) {
                    alerts.push(AlertEvent::new(
                        tenant_id,
                        AlertKind::PerformanceDegraded,
                        Severity::Warning,
                        format!("Page performance degraded: fcp {:.0}ms, lcp {:.0}ms", fcp, lcp),
                        json!({
                            "avgFcp": fcp,
                            "avgLcp": lcp,
                            "samples": avg.samples,
                            "threshold": {
                                "fcpMs": self.config.fcp_threshold_ms,
                                "lcpMs": self.config.lcp_threshold_ms,
                            },
                        }),
                    ));
                }
            }
            Err(e) => record_failure(&mut failed_checks, "performance", tenant_id, &e),
        }

        match flatten(js) {
            Ok(totals) => {
                if let Some(severity) = evaluate_js_errors(&totals, &self.config) {
                    alerts.push(AlertEvent::new(
                        tenant_id,
                        AlertKind::JsErrorSpike,
                        severity,
                        format!("{} JS errors in the window", totals.total_errors),
                        json!({
                            "totalErrors": totals.total_errors,
                            "affectedUsers": totals.affected_users,
                            "threshold": {
                                "warning": self.config.js_error_warn,
                                "critical": self.config.js_error_crit,
                            },
                        }),
                    ));
                }
            }
            Err(e) => record_failure(&mut failed_checks, "js_errors", tenant_id, &e),
        }

        for alert in &alerts {
            metrics().alerts_raised.inc();
            match self.sink.notify(alert).await {
                Ok(()) => metrics().notifications_sent.inc(),
                Err(e) => {
                    metrics().notification_errors.inc();
                    warn!(tenant_id, error = %e, "Alert notification failed");
                }
            }
        }

        metrics()
            .alert_check_latency_ms
            .observe(start.elapsed().as_millis() as u64);

        TenantCheckReport {
            tenant_id: tenant_id.to_string(),
            alerts,
            failed_checks,
        }
    }

    /// Evaluate every active tenant with bounded concurrency.
    pub async fn run_all(&self) -> Result<BulkCheckSummary> {
        let tenants = self.directory.list_active_tenants().await?;
        metrics().active_tenants.set(tenants.len() as u64);

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let mut join_set = JoinSet::new();

        for tenant in tenants {
            let evaluator = self.clone();
            let semaphore = Arc::clone(&semaphore);
            join_set.spawn(async move {
                // Holder dropped at task end releases the slot.
                let _permit = semaphore.acquire_owned().await;
                evaluator.check_tenant(&tenant.app_id).await
            });
        }

        let mut summary = BulkCheckSummary::default();
        while let Some(joined) = join_set.join_next().await {
            summary.total += 1;
            match joined {
                Ok(report) => {
                    summary.alerts_raised += report.alerts.len();
                    if report.failed_checks.is_empty() {
                        summary.succeeded += 1;
                    } else {
                        summary.failed += 1;
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    error!(error = %e, "Tenant check task panicked");
                }
            }
        }

        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            alerts = summary.alerts_raised,
            "Bulk alert evaluation finished"
        );
        Ok(summary)
    }
}

fn flatten<T>(joined: std::result::Result<Result<T>, tokio::time::error::Elapsed>) -> Result<T> {
    match joined {
        Ok(inner) => inner,
        Err(_) => Err(Error::store_unavailable("check timed out")),
    }
}

fn record_failure(failed: &mut Vec<String>, check: &str, tenant_id: &str, e: &Error) {
    metrics().alert_check_failures.inc();
    warn!(tenant_id, check, error = %e, "Alert check failed");
    failed.push(check.to_string());
}
