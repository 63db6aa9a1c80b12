//! Health and metrics endpoints.

use axum::{http::StatusCode, Json};
use telemetry::{health, metrics, HealthReport, MetricsSnapshot};

/// GET /health - Full health report.
pub async fn health_handler() -> Json<HealthReport> {
    Json(health().report())
}

/// GET /health/ready - Readiness probe (can accept traffic).
pub async fn ready_handler() -> StatusCode {
    if health().is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health/live - Liveness probe (service is running).
pub async fn live_handler() -> StatusCode {
    if health().is_alive() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /metrics - Internal metrics snapshot.
pub async fn metrics_handler() -> Json<MetricsSnapshot> {
    Json(metrics().snapshot())
}
