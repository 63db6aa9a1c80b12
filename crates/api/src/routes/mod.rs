//! API routes.

pub mod alert;
pub mod health;
pub mod ingest;
pub mod stats;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/report", post(ingest::report_handler))
        .route("/api/analyse/stats", get(stats::stats_handler))
        .route("/api/traffic/trend", get(stats::trend_handler))
        .route("/api/performance/avg", get(stats::performance_handler))
        .route("/api/http-error/rank", get(stats::http_error_handler))
        .route("/api/js-error/rank", get(stats::js_error_handler))
        .route("/api/top/analyse", get(stats::top_handler))
        .route("/api/geo/distribution", get(stats::geo_handler))
        .route("/api/alert/check", post(alert::check_handler))
        .route("/api/alert/check-all", post(alert::check_all_handler))
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .route("/metrics", get(health::metrics_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
