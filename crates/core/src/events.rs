//! Event type definitions for the monitoring engine.
//!
//! The wire format matches the browser SDK: camelCase fields, a `type` tag
//! selecting the payload variant, and epoch-millisecond timestamps. The
//! canonical stored record wraps the wire payload together with the
//! server-side enrichment fields; clients can never supply enrichment.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Marker used for enrichment fields that could not be resolved.
///
/// Enrichment fields are always non-empty strings; "absent" is expressed as
/// this marker, never as an empty string or a null.
pub const UNKNOWN: &str = "Unknown";

/// Classification of a stored event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Performance,
    PageStatus,
    HttpRequest,
    JsError,
    ResourceLoadError,
    PromiseRejection,
    Click,
}

impl EventKind {
    /// Returns the wire/storage name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Performance => "performance",
            Self::PageStatus => "pageStatus",
            Self::HttpRequest => "request",
            Self::JsError => "jsError",
            Self::ResourceLoadError => "loadResourceError",
            Self::PromiseRejection => "rejectError",
            Self::Click => "click",
        }
    }

    /// Whether this kind counts towards page views (pv).
    pub fn counts_as_page_view(&self) -> bool {
        matches!(self, Self::Performance | Self::PageStatus)
    }
}

/// Outcome of an instrumented HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestOutcome {
    Done,
    Error,
    Timeout,
}

impl RequestOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Error => "error",
            Self::Timeout => "timeout",
        }
    }
}

/// Page performance timings, all milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceData {
    /// DNS resolution time
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub dns_time: f64,
    /// TCP connect time
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub tcp_time: f64,
    /// White-screen time
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub white_time: f64,
    /// First Contentful Paint
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub fcp: f64,
    /// Time To First Byte
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub ttfb: f64,
    /// Largest Contentful Paint
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub lcp: f64,
    /// First Input Delay
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub fid: f64,
}

/// Page enter/leave lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PageStatusData {
    /// Page enter time (epoch ms)
    #[serde(default)]
    pub in_time: i64,
    /// Page leave time (epoch ms)
    #[serde(default)]
    pub leave_time: i64,
    /// Dwell time (ms)
    #[serde(default)]
    pub residence: i64,
}

/// Instrumented HTTP request result.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RequestData {
    #[validate(length(min = 1, max = 2048))]
    pub url: String,
    #[serde(default)]
    #[validate(length(max = 16))]
    pub method: String,
    /// HTTP status code, 0 when the request never completed
    #[serde(default)]
    pub status: u16,
    pub request_type: RequestOutcome,
    /// Request duration (ms)
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub cost: f64,
}

/// Uncaught JS exception.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JsErrorData {
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    #[serde(default)]
    #[validate(length(max = 2048))]
    pub filename: String,
    #[serde(default)]
    pub lineno: u32,
    #[serde(default)]
    pub colno: u32,
    #[serde(default)]
    #[validate(length(max = 8000))]
    pub stack: String,
}

/// Failed resource load (script/css/img).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResourceErrorData {
    #[serde(default)]
    #[validate(length(max = 64))]
    pub resource_type: String,
    #[validate(length(min = 1, max = 2048))]
    pub resource_url: String,
}

/// Unhandled promise rejection.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RejectErrorData {
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub reason: String,
}

/// User click on a tracked element.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClickData {
    #[serde(default)]
    #[validate(length(max = 256))]
    pub click_element: String,
}

/// Event payload variants, tagged by the wire `type` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RawPayload {
    #[serde(rename = "performance")]
    Performance(PerformanceData),
    #[serde(rename = "pageStatus")]
    PageStatus(PageStatusData),
    #[serde(rename = "request")]
    HttpRequest(RequestData),
    #[serde(rename = "jsError")]
    JsError(JsErrorData),
    #[serde(rename = "loadResourceError")]
    ResourceLoadError(ResourceErrorData),
    #[serde(rename = "rejectError")]
    PromiseRejection(RejectErrorData),
    #[serde(rename = "click")]
    Click(ClickData),
}

impl RawPayload {
    /// Returns the event kind for this payload.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Performance(_) => EventKind::Performance,
            Self::PageStatus(_) => EventKind::PageStatus,
            Self::HttpRequest(_) => EventKind::HttpRequest,
            Self::JsError(_) => EventKind::JsError,
            Self::ResourceLoadError(_) => EventKind::ResourceLoadError,
            Self::PromiseRejection(_) => EventKind::PromiseRejection,
            Self::Click(_) => EventKind::Click,
        }
    }

    /// Validate the variant-specific fields.
    pub fn validate(&self) -> Result<(), validator::ValidationErrors> {
        match self {
            Self::Performance(d) => d.validate(),
            Self::PageStatus(d) => d.validate(),
            Self::HttpRequest(d) => d.validate(),
            Self::JsError(d) => d.validate(),
            Self::ResourceLoadError(d) => d.validate(),
            Self::PromiseRejection(d) => d.validate(),
            Self::Click(d) => d.validate(),
        }
    }
}

/// A single raw event as submitted by the SDK.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    #[serde(flatten)]
    pub payload: RawPayload,

    /// Client-reported timestamp (epoch ms); drives all bucketing.
    pub user_time_stamp: i64,

    /// Stable pseudo-anonymous session/device identifier.
    #[validate(length(min = 1, max = 128))]
    pub mark_user_id: String,

    /// True only for the first event of a session for this tenant.
    #[serde(default)]
    pub is_first: bool,

    #[validate(length(min = 1, max = 2048))]
    pub page_url: String,

    #[serde(default)]
    #[validate(length(max = 256))]
    pub domain: String,
}

impl RawEvent {
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

/// Server-side enrichment, attached before persistence and never
/// client-supplied. Every field is a non-empty string ([`UNKNOWN`] on a
/// parse/lookup miss).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrichment {
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

impl Enrichment {
    /// Enrichment with every field at the unknown marker.
    pub fn unknown() -> Self {
        Self {
            browser_name: UNKNOWN.into(),
            browser_version: UNKNOWN.into(),
            os_name: UNKNOWN.into(),
            os_version: UNKNOWN.into(),
            device_vendor: UNKNOWN.into(),
            device_model: UNKNOWN.into(),
            user_agent: String::new(),
            ip: UNKNOWN.into(),
            country: UNKNOWN.into(),
            province: UNKNOWN.into(),
            city: UNKNOWN.into(),
        }
    }

    /// True when every resolvable field carries a value (possibly Unknown).
    pub fn is_complete(&self) -> bool {
        !self.browser_name.is_empty()
            && !self.os_name.is_empty()
            && !self.country.is_empty()
            && !self.province.is_empty()
            && !self.city.is_empty()
    }
}

/// Canonical stored event: write-once, fully enriched before persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: Uuid,
    pub tenant_id: String,
    pub occurred_at: i64,
    pub received_at: i64,
    pub session_user_id: String,
    pub is_first_visit: bool,
    pub page_url: String,
    pub domain: String,
    pub payload: RawPayload,
    pub enrichment: Enrichment,
}

impl EventRecord {
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}
