//! Batch inserts into the events table.

use crate::client::StoreClient;
use async_trait::async_trait;
use clickhouse::Row;
use monitor_core::{Error, EventRecord, RawPayload, Result};
use serde::Serialize;
use telemetry::metrics;
use tracing::debug;

/// Flattened event row matching `monitor.events` column order.
#[derive(Debug, Clone, Row, Serialize)]
pub struct EventRow {
    pub event_id: String,
    pub tenant_id: String,
    pub kind: String,
    pub occurred_at: i64, // DateTime64(3), epoch milliseconds
    pub received_at: i64,

    pub session_user_id: String,
    pub is_first_visit: u8,
    pub page_url: String,
    pub domain: String,

    // performance
    pub dns_time: Option<f64>,
    pub tcp_time: Option<f64>,
    pub white_time: Option<f64>,
    pub fcp: Option<f64>,
    pub ttfb: Option<f64>,
    pub lcp: Option<f64>,
    pub fid: Option<f64>,

    // pageStatus
    pub in_time: Option<i64>,
    pub leave_time: Option<i64>,
    pub residence: Option<i64>,

    // request
    pub req_url: String,
    pub method: String,
    pub status: u16,
    pub outcome: String,
    pub cost: Option<f64>,

    // jsError
    pub message: String,
    pub filename: String,
    pub lineno: u32,
    pub colno: u32,
    pub stack: String,

    // loadResourceError / rejectError / click
    pub resource_type: String,
    pub resource_url: String,
    pub reason: String,
    pub click_element: String,

    // enrichment
    pub browser_name: String,
    pub browser_version: String,
    pub os_name: String,
    pub os_version: String,
    pub device_vendor: String,
    pub device_model: String,
    pub user_agent: String,
    pub ip: String,
    pub country: String,
    pub province: String,
    pub city: String,
}

impl From<EventRecord> for EventRow {
    fn from(event: EventRecord) -> Self {
        let mut row = EventRow {
            event_id: event.event_id.to_string(),
            tenant_id: event.tenant_id,
            kind: event.payload.kind().as_str().to_string(),
            occurred_at: event.occurred_at,
            received_at: event.received_at,

            session_user_id: event.session_user_id,
            is_first_visit: if event.is_first_visit { 1 } else { 0 },
            page_url: event.page_url,
            domain: event.domain,

            dns_time: None,
            tcp_time: None,
            white_time: None,
            fcp: None,
            ttfb: None,
            lcp: None,
            fid: None,

            in_time: None,
            leave_time: None,
            residence: None,

            req_url: String::new(),
            method: String::new(),
            status: 0,
            outcome: String::new(),
            cost: None,

            message: String::new(),
            filename: String::new(),
            lineno: 0,
            colno: 0,
            stack: String::new(),

            resource_type: String::new(),
            resource_url: String::new(),
            reason: String::new(),
            click_element: String::new(),

            browser_name: event.enrichment.browser_name,
            browser_version: event.enrichment.browser_version,
            os_name: event.enrichment.os_name,
            os_version: event.enrichment.os_version,
            device_vendor: event.enrichment.device_vendor,
            device_model: event.enrichment.device_model,
            user_agent: event.enrichment.user_agent,
            ip: event.enrichment.ip,
            country: event.enrichment.country,
            province: event.enrichment.province,
            city: event.enrichment.city,
        };

        match event.payload {
            RawPayload::Performance(data) => {
                row.dns_time = Some(data.dns_time);
                row.tcp_time = Some(data.tcp_time);
                row.white_time = Some(data.white_time);
                row.fcp = Some(data.fcp);
                row.ttfb = Some(data.ttfb);
                row.lcp = Some(data.lcp);
                row.fid = Some(data.fid);
            }
            RawPayload::PageStatus(data) => {
                row.in_time = Some(data.in_time);
                row.leave_time = Some(data.leave_time);
                row.residence = Some(data.residence);
            }
            RawPayload::HttpRequest(data) => {
                row.req_url = data.url;
                row.method = data.method;
                row.status = data.status;
                row.outcome = data.request_type.as_str().to_string();
                row.cost = Some(data.cost);
            }
            RawPayload::JsError(data) => {
                row.message = data.message;
                row.filename = data.filename;
                row.lineno = data.lineno;
                row.colno = data.colno;
                row.stack = data.stack;
            }
            RawPayload::ResourceLoadError(data) => {
                row.resource_type = data.resource_type;
                row.resource_url = data.resource_url;
            }
            RawPayload::PromiseRejection(data) => {
                row.reason = data.reason;
            }
            RawPayload::Click(data) => {
                row.click_element = data.click_element;
            }
        }

        row
    }
}

/// Durable event sink. Fail-closed: any write error propagates to the
/// caller and nothing is acknowledged.
#[async_trait]
pub trait EventWriter: Send + Sync {
    /// Persist a batch in a single bulk write. Returns the stored count.
    async fn write_events(&self, events: Vec<EventRecord>) -> Result<usize>;
}

#[async_trait]
impl EventWriter for StoreClient {
    async fn write_events(&self, events: Vec<EventRecord>) -> Result<usize> {
        if events.is_empty() {
            return Ok(0);
        }

        let count = events.len();
        let start = std::time::Instant::now();

        let rows: Vec<EventRow> = events.into_iter().map(EventRow::from).collect();

        let mut insert = self.inner().insert("monitor.events").map_err(|e| {
            metrics().store_insert_errors.inc();
            Error::store_unavailable(format!("Insert error: {}", e))
        })?;

        for row in &rows {
            insert.write(row).await.map_err(|e| {
                metrics().store_insert_errors.inc();
                Error::store_unavailable(format!("Write error: {}", e))
            })?;
        }

        insert.end().await.map_err(|e| {
            metrics().store_insert_errors.inc();
            Error::store_unavailable(format!("End error: {}", e))
        })?;

        let elapsed = start.elapsed();
        metrics().store_insert_latency_ms.observe(elapsed.as_millis() as u64);
        metrics().store_inserts.inc();
        metrics().events_stored.inc_by(count as u64);

        debug!(
            count = count,
            latency_ms = %elapsed.as_millis(),
            "Inserted events"
        );

        Ok(count)
    }
}
