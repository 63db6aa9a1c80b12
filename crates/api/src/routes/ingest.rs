//! Report ingestion endpoint.

use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use monitor_core::limits::MAX_BATCH_SIZE_BYTES;
use monitor_core::{Error, RawEvent};
use pipeline::ClientContext;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extractors::{ClientIp, UserAgent};
use crate::response::{ApiError, Envelope};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub app_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub received: usize,
}

/// POST /api/report?appId=… — SDK batch ingestion.
///
/// Body is a JSON array of events; anything else is a 400. The batch is
/// all-or-nothing, so `received` always equals the submitted count on
/// success.
pub async fn report_handler(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
    ClientIp(ip): ClientIp,
    UserAgent(user_agent): UserAgent,
    body: Bytes,
) -> Result<Json<Envelope<ReportData>>, ApiError> {
    if body.len() > MAX_BATCH_SIZE_BYTES {
        return Err(Error::bad_request(format!(
            "payload size {}KB exceeds {}KB limit",
            body.len() / 1024,
            MAX_BATCH_SIZE_BYTES / 1024
        ))
        .into());
    }

    let events: Vec<RawEvent> = serde_json::from_slice(&body)
        .map_err(|e| Error::bad_request(format!("expected a JSON array of events: {}", e)))?;

    debug!(
        app_id = %query.app_id,
        events = events.len(),
        payload_size = body.len(),
        "Received report batch"
    );

    let received = state
        .ingestor
        .ingest(&query.app_id, events, ClientContext { ip, user_agent })
        .await?;

    Ok(Json(Envelope::ok(ReportData { received })))
}
