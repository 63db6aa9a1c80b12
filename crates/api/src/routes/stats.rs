//! Dashboard query endpoints.
//!
//! Every endpoint gates the tenant first (404 unknown, 403 disabled) and
//! then serves fail-open: a store outage yields the zero shape, never a
//! 500.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use monitor_core::window::MILLIS_PER_DAY;
use monitor_core::{Error, Granularity, TimeWindow};
use query_engine::{
    BreakdownDimension, GeoDistribution, HttpErrorRanking, JsErrorRanking, PerformanceReport,
    RegionLevel, TopBreakdown, TrafficSummary, TrafficTrend,
};
use serde::Deserialize;

use crate::response::{ApiError, Envelope};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    pub app_id: String,
    /// Window start, epoch ms. Defaults to end minus the lookback.
    pub start_time: Option<i64>,
    /// Window end, epoch ms. Defaults to now.
    pub end_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendQuery {
    pub app_id: String,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    /// Bucket granularity, `hour` (default) or `day`.
    #[serde(rename = "type")]
    pub granularity: Option<Granularity>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopQuery {
    pub app_id: String,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    /// Breakdown dimension, `page` (default), `browser`, `os` or `device`.
    #[serde(rename = "type")]
    pub dimension: Option<BreakdownDimension>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoQuery {
    pub app_id: String,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    /// Rollup level, `province` (default) or `city`.
    pub level: Option<RegionLevel>,
}

fn resolve_window(
    start: Option<i64>,
    end: Option<i64>,
    lookback_ms: i64,
) -> Result<TimeWindow, Error> {
    let end = end.unwrap_or_else(|| Utc::now().timestamp_millis());
    let start = start.unwrap_or(end - lookback_ms);
    let window = TimeWindow::new(start, end);
    if window.is_empty() {
        return Err(Error::bad_request("endTime must be after startTime"));
    }
    Ok(window)
}

/// GET /api/analyse/stats — whole-window pv/uv/newUsers.
pub async fn stats_handler(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Envelope<TrafficSummary>>, ApiError> {
    let tenant = state.require_active_tenant(&query.app_id).await?;
    let window = resolve_window(query.start_time, query.end_time, MILLIS_PER_DAY)?;
    let summary = state.engine.traffic_summary(&tenant.app_id, window).await;
    Ok(Json(Envelope::ok(summary)))
}

/// GET /api/traffic/trend — zero-filled pv/uv series.
pub async fn trend_handler(
    State(state): State<AppState>,
    Query(query): Query<TrendQuery>,
) -> Result<Json<Envelope<TrafficTrend>>, ApiError> {
    let tenant = state.require_active_tenant(&query.app_id).await?;
    let granularity = query.granularity.unwrap_or(Granularity::Hour);
    let window = resolve_window(
        query.start_time,
        query.end_time,
        granularity.default_lookback_ms(),
    )?;
    let trend = state
        .engine
        .traffic_trend(&tenant.app_id, window, granularity)
        .await;
    Ok(Json(Envelope::ok(trend)))
}

/// GET /api/performance/avg — timing averages plus per-page rows.
pub async fn performance_handler(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Envelope<PerformanceReport>>, ApiError> {
    let tenant = state.require_active_tenant(&query.app_id).await?;
    let window = resolve_window(query.start_time, query.end_time, MILLIS_PER_DAY)?;
    let report = state.engine.performance_report(&tenant.app_id, window).await;
    Ok(Json(Envelope::ok(report)))
}

/// GET /api/http-error/rank — failing request URLs with the error rate.
pub async fn http_error_handler(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Envelope<HttpErrorRanking>>, ApiError> {
    let tenant = state.require_active_tenant(&query.app_id).await?;
    let window = resolve_window(query.start_time, query.end_time, MILLIS_PER_DAY)?;
    let ranking = state.engine.http_error_ranking(&tenant.app_id, window).await;
    Ok(Json(Envelope::ok(ranking)))
}

/// GET /api/js-error/rank — grouped JS errors with latest samples.
pub async fn js_error_handler(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Envelope<JsErrorRanking>>, ApiError> {
    let tenant = state.require_active_tenant(&query.app_id).await?;
    let window = resolve_window(query.start_time, query.end_time, MILLIS_PER_DAY)?;
    let ranking = state.engine.js_error_ranking(&tenant.app_id, window).await;
    Ok(Json(Envelope::ok(ranking)))
}

/// GET /api/top/analyse — top-N along one dimension.
pub async fn top_handler(
    State(state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> Result<Json<Envelope<TopBreakdown>>, ApiError> {
    let tenant = state.require_active_tenant(&query.app_id).await?;
    let window = resolve_window(query.start_time, query.end_time, MILLIS_PER_DAY)?;
    let dimension = query.dimension.unwrap_or(BreakdownDimension::Page);
    let breakdown = state
        .engine
        .top_breakdown(&tenant.app_id, window, dimension)
        .await;
    Ok(Json(Envelope::ok(breakdown)))
}

/// GET /api/geo/distribution — visitor geography.
pub async fn geo_handler(
    State(state): State<AppState>,
    Query(query): Query<GeoQuery>,
) -> Result<Json<Envelope<GeoDistribution>>, ApiError> {
    let tenant = state.require_active_tenant(&query.app_id).await?;
    let window = resolve_window(query.start_time, query.end_time, MILLIS_PER_DAY)?;
    let level = query.level.unwrap_or(RegionLevel::Province);
    let geo = state
        .engine
        .geo_distribution(&tenant.app_id, window, level)
        .await;
    Ok(Json(Envelope::ok(geo)))
}
