//! Response shapes served to the dashboard.
//!
//! All fields serialize camelCase to match the admin frontend. Percentages
//! are pre-formatted `"NN.NN%"` strings; averages are rounded to two
//! decimals. Empty shapes (zero counts, empty lists) are valid responses,
//! not errors.

use serde::{Deserialize, Serialize};

/// Whole-window traffic totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficSummary {
    pub pv: u64,
    pub uv: u64,
    pub new_users: u64,
}

/// One trend bucket. Buckets with no events carry explicit zeros.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// Bucket start, epoch milliseconds, aligned to the configured offset.
    pub time: i64,
    pub pv: u64,
    pub uv: u64,
}

/// Zero-filled pv/uv series over a window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficTrend {
    pub points: Vec<TrendPoint>,
}

/// Tenant-wide performance averages, two-decimal milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerfAverages {
    pub dns_time: f64,
    pub tcp_time: f64,
    pub white_time: f64,
    pub fcp: f64,
    pub ttfb: f64,
    pub lcp: f64,
    pub fid: f64,
    pub samples: u64,
}

/// Per-page performance averages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePerformance {
    pub page_url: String,
    pub samples: u64,
    pub white_time: f64,
    pub fcp: f64,
    pub lcp: f64,
    pub ttfb: f64,
}

/// Performance report: overall averages plus the busiest pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub averages: PerfAverages,
    pub pages: Vec<PagePerformance>,
}

/// One failing request URL in the error ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpErrorItem {
    pub url: String,
    pub error_count: u64,
    /// Share of all failed requests, `"NN.NN%"`.
    pub proportion: String,
    pub avg_cost: f64,
    pub top_status: u16,
    pub last_method: String,
    pub last_page: String,
    pub last_seen: i64,
}

/// Request failure ranking with the overall error rate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpErrorRanking {
    pub total_requests: u64,
    pub error_requests: u64,
    /// `"NN.NN%"`; `"0.00%"` when the window has no requests.
    pub error_rate: String,
    pub items: Vec<HttpErrorItem>,
}

/// One JS error message group with its most recent sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsErrorItem {
    pub message: String,
    pub count: u64,
    /// Share of all JS errors, `"NN.NN%"`.
    pub proportion: String,
    pub filename: String,
    pub lineno: u32,
    pub colno: u32,
    pub stack: String,
    pub last_page: String,
    pub last_seen: i64,
}

/// JS error ranking with spike-detection totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsErrorRanking {
    pub total_errors: u64,
    pub affected_users: u64,
    pub items: Vec<JsErrorItem>,
}

/// Breakdown dimension for top-N queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakdownDimension {
    Page,
    Browser,
    Os,
    Device,
}

/// One breakdown row. `uv` is only populated for the page dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownItem {
    pub label: String,
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uv: Option<u64>,
    /// Share of the listed rows, `"NN.NN%"`.
    pub proportion: String,
}

/// Top-N breakdown along one dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopBreakdown {
    pub dimension: BreakdownDimension,
    pub items: Vec<BreakdownItem>,
}

/// Geographic rollup level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionLevel {
    Province,
    City,
}

/// One region row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionItem {
    pub name: String,
    pub pv: u64,
    pub uv: u64,
    /// Share of listed page views, `"NN.NN%"`.
    pub share: String,
}

/// Visitor geography at one rollup level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoDistribution {
    pub level: RegionLevel,
    pub items: Vec<RegionItem>,
}
