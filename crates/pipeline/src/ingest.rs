//! Batch ingestion.
//!
//! Order of operations is fixed: tenant gate, batch shape checks, field
//! validation, enrichment, one bulk write. A batch is all-or-nothing; a
//! rejected event rejects the whole submission and nothing is stored.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use monitor_core::limits::MAX_BATCH_EVENTS;
use monitor_core::{Error, EventRecord, RawEvent, Result, TenantDirectory};
use telemetry::metrics;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use event_store::EventWriter;

use crate::geo::GeoLocator;
use crate::ua::UaEnricher;

/// Request-level context attached by the HTTP layer.
#[derive(Debug, Clone, Default)]
pub struct ClientContext {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Ingestion pipeline front door.
pub struct Ingestor {
    directory: Arc<dyn TenantDirectory>,
    writer: Arc<dyn EventWriter>,
    geo: Arc<dyn GeoLocator>,
    ua: UaEnricher,
}

impl Ingestor {
    pub fn new(
        directory: Arc<dyn TenantDirectory>,
        writer: Arc<dyn EventWriter>,
        geo: Arc<dyn GeoLocator>,
    ) -> Self {
        Self {
            directory,
            writer,
            geo,
            ua: UaEnricher::new(),
        }
    }

    /// Ingest one reported batch for a tenant. Returns the stored count.
    pub async fn ingest(
        &self,
        app_id: &str,
        events: Vec<RawEvent>,
        ctx: ClientContext,
    ) -> Result<usize> {
        let start = Instant::now();
        metrics().batches_received.inc();
        metrics().events_received.inc_by(events.len() as u64);

        // Tenant gate comes before any payload inspection.
        let tenant = self
            .directory
            .get_tenant(app_id)
            .await?
            .ok_or_else(|| Error::TenantNotFound(app_id.to_string()))?;
        if !tenant.is_active() {
            return Err(Error::TenantDisabled(app_id.to_string()));
        }

        if events.is_empty() {
            return Err(Error::bad_request("event batch is empty"));
        }
        if events.len() > MAX_BATCH_EVENTS {
            return Err(Error::bad_request(format!(
                "event batch exceeds {} events",
                MAX_BATCH_EVENTS
            )));
        }

        for (i, event) in events.iter().enumerate() {
            if let Err(e) = event.validate().and_then(|_| event.payload.validate()) {
                metrics().events_rejected.inc_by(events.len() as u64);
                return Err(Error::bad_request(format!("event {} invalid: {}", i, e)));
            }
        }

        // One UA parse and one geo lookup per batch; all events of a
        // submission share the transport.
        let ip = ctx.ip.unwrap_or_default();
        let mut enrichment = self.ua.parse(ctx.user_agent.as_deref().unwrap_or(""));
        let location = self.geo.locate(&ip).await;
        enrichment.ip = if ip.is_empty() {
            monitor_core::UNKNOWN.to_string()
        } else {
            ip
        };
        enrichment.country = location.country;
        enrichment.province = location.province;
        enrichment.city = location.city;
        debug_assert!(enrichment.is_complete());

        let received_at = Utc::now().timestamp_millis();
        let records: Vec<EventRecord> = events
            .into_iter()
            .map(|event| EventRecord {
                event_id: Uuid::new_v4(),
                tenant_id: tenant.app_id.clone(),
                occurred_at: event.user_time_stamp,
                received_at,
                session_user_id: event.mark_user_id,
                is_first_visit: event.is_first,
                page_url: event.page_url,
                domain: event.domain,
                payload: event.payload,
                enrichment: enrichment.clone(),
            })
            .collect();

        let stored = self.writer.write_events(records).await?;
        metrics().ingest_latency_ms.observe(start.elapsed().as_millis() as u64);

        info!(
            tenant_id = %tenant.app_id,
            stored,
            latency_ms = start.elapsed().as_millis() as u64,
            "Ingested event batch"
        );
        Ok(stored)
    }
}
