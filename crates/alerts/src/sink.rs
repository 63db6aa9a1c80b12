//! Alert events and notification sinks.

use async_trait::async_trait;
use chrono::Utc;
use monitor_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Alert classification, stable wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    #[serde(rename = "ERROR_RATE_HIGH")]
    ErrorRateHigh,
    #[serde(rename = "PERFORMANCE_DEGRADED")]
    PerformanceDegraded,
    #[serde(rename = "JS_ERROR_SPIKE")]
    JsErrorSpike,
    #[serde(rename = "HTTP_ERROR_SPIKE")]
    HttpErrorSpike,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ErrorRateHigh => "ERROR_RATE_HIGH",
            Self::PerformanceDegraded => "PERFORMANCE_DEGRADED",
            Self::JsErrorSpike => "JS_ERROR_SPIKE",
            Self::HttpErrorSpike => "HTTP_ERROR_SPIKE",
        }
    }
}

/// Alert severity, ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// One raised alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    pub tenant_id: String,
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    /// Check-specific readings (rates, averages, counts).
    pub detail: serde_json::Value,
    /// Epoch milliseconds.
    pub triggered_at: i64,
}

impl AlertEvent {
    pub fn new(
        tenant_id: impl Into<String>,
        kind: AlertKind,
        severity: Severity,
        message: impl Into<String>,
        detail: serde_json::Value,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            kind,
            severity,
            message: message.into(),
            detail,
            triggered_at: Utc::now().timestamp_millis(),
        }
    }
}

/// Notification delivery seam.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, event: &AlertEvent) -> Result<()>;
}

/// Default sink: structured log line per alert.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn notify(&self, event: &AlertEvent) -> Result<()> {
        info!(
            tenant_id = %event.tenant_id,
            kind = event.kind.as_str(),
            severity = ?event.severity,
            message = %event.message,
            "Alert raised"
        );
        Ok(())
    }
}

/// POSTs each alert as JSON to a configured webhook.
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn notify(&self, event: &AlertEvent) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(event)
            .send()
            .await
            .map_err(|e| Error::internal(format!("Webhook send failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::internal(format!(
                "Webhook returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
