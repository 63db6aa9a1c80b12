//! Alert trigger endpoints.

use alerts::{BulkCheckSummary, TenantCheckReport};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::response::{ApiError, Envelope};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckQuery {
    pub app_id: String,
}

/// POST /api/alert/check?appId=… — evaluate one tenant now.
pub async fn check_handler(
    State(state): State<AppState>,
    Query(query): Query<CheckQuery>,
) -> Result<Json<Envelope<TenantCheckReport>>, ApiError> {
    let tenant = state.require_active_tenant(&query.app_id).await?;
    let report = state.evaluator.check_tenant(&tenant.app_id).await;
    Ok(Json(Envelope::ok(report)))
}

/// POST /api/alert/check-all — evaluate every active tenant.
pub async fn check_all_handler(
    State(state): State<AppState>,
) -> Result<Json<Envelope<BulkCheckSummary>>, ApiError> {
    let summary = state.evaluator.run_all().await?;
    Ok(Json(Envelope::ok(summary)))
}
