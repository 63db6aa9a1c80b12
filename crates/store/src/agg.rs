//! Aggregation primitives over the events table.
//!
//! Every query filters on `tenant_id` before anything else; there is no way
//! to ask the store a cross-tenant question through this interface. Rows
//! come back in `SELECT` column order, so struct field order must match the
//! projection of each query.

use async_trait::async_trait;
use clickhouse::Row;
use monitor_core::{Error, Result, TimeWindow};
use serde::Deserialize;
use telemetry::metrics;
use tracing::debug;

use crate::client::StoreClient;

/// Half-open window filter shared by every aggregation query.
const WINDOW_FILTER: &str =
    "tenant_id = ? AND occurred_at >= fromUnixTimestamp64Milli(?) AND occurred_at < fromUnixTimestamp64Milli(?)";

/// Breakdown column for single-dimension term counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermsColumn {
    Browser,
    Os,
    DeviceVendor,
}

impl TermsColumn {
    fn column(&self) -> &'static str {
        match self {
            Self::Browser => "browser_name",
            Self::Os => "os_name",
            Self::DeviceVendor => "device_vendor",
        }
    }
}

/// Geographic rollup level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoLevel {
    Province,
    City,
}

impl GeoLevel {
    fn column(&self) -> &'static str {
        match self {
            Self::Province => "province",
            Self::City => "city",
        }
    }
}

/// Whole-window traffic totals.
#[derive(Debug, Clone, Copy, Default, Row, Deserialize)]
pub struct TrafficTotalsRow {
    pub pv: u64,
    pub uv: u64,
    pub new_users: u64,
}

/// One non-empty trend bucket.
#[derive(Debug, Clone, Copy, Default, Row, Deserialize)]
pub struct TrendRow {
    pub bucket_start: i64,
    pub pv: u64,
    pub uv: u64,
}

/// Tenant-wide performance averages.
#[derive(Debug, Clone, Copy, Default, Row, Deserialize)]
pub struct PerfAvgRow {
    pub dns_time: Option<f64>,
    pub tcp_time: Option<f64>,
    pub white_time: Option<f64>,
    pub fcp: Option<f64>,
    pub ttfb: Option<f64>,
    pub lcp: Option<f64>,
    pub fid: Option<f64>,
    pub samples: u64,
}

/// Per-page performance averages.
#[derive(Debug, Clone, Default, Row, Deserialize)]
pub struct PagePerfRow {
    pub page_url: String,
    pub samples: u64,
    pub white_time: Option<f64>,
    pub fcp: Option<f64>,
    pub lcp: Option<f64>,
    pub ttfb: Option<f64>,
}

/// Request totals for rate computation.
#[derive(Debug, Clone, Copy, Default, Row, Deserialize)]
pub struct HttpTotalsRow {
    pub total_requests: u64,
    pub error_requests: u64,
}

/// One failing request URL group.
#[derive(Debug, Clone, Default, Row, Deserialize)]
pub struct HttpErrorGroupRow {
    pub url: String,
    pub error_count: u64,
    pub avg_cost: Option<f64>,
    pub top_status: u16,
    pub last_method: String,
    pub last_page: String,
    pub last_seen: i64,
}

/// JS error totals for spike detection.
#[derive(Debug, Clone, Copy, Default, Row, Deserialize)]
pub struct JsTotalsRow {
    pub total_errors: u64,
    pub affected_users: u64,
}

/// One JS error message group with its latest sample.
#[derive(Debug, Clone, Default, Row, Deserialize)]
pub struct JsErrorGroupRow {
    pub message: String,
    pub occurrences: u64,
    pub filename: String,
    pub lineno: u32,
    pub colno: u32,
    pub stack: String,
    pub last_page: String,
    pub last_seen: i64,
}

/// Generic label/count pair for breakdowns.
#[derive(Debug, Clone, Default, Row, Deserialize)]
pub struct TermsRow {
    pub label: String,
    pub count: u64,
}

/// Per-page pv/uv pair.
#[derive(Debug, Clone, Default, Row, Deserialize)]
pub struct PageTermsRow {
    pub label: String,
    pub pv: u64,
    pub uv: u64,
}

/// Geographic pv/uv pair.
#[derive(Debug, Clone, Default, Row, Deserialize)]
pub struct GeoRow {
    pub name: String,
    pub pv: u64,
    pub uv: u64,
}

/// Read-side seam between the store and the query engine.
///
/// Methods return raw aggregation rows; shaping, zero-filling and rounding
/// happen in the query engine, not here.
#[async_trait]
pub trait AggSource: Send + Sync {
    async fn traffic_totals(&self, tenant_id: &str, window: TimeWindow) -> Result<TrafficTotalsRow>;

    async fn trend_buckets(
        &self,
        tenant_id: &str,
        window: TimeWindow,
        bucket_ms: i64,
        offset_ms: i64,
    ) -> Result<Vec<TrendRow>>;

    async fn perf_averages(&self, tenant_id: &str, window: TimeWindow) -> Result<PerfAvgRow>;

    async fn perf_by_page(
        &self,
        tenant_id: &str,
        window: TimeWindow,
        limit: u32,
    ) -> Result<Vec<PagePerfRow>>;

    async fn http_totals(&self, tenant_id: &str, window: TimeWindow) -> Result<HttpTotalsRow>;

    async fn http_error_groups(
        &self,
        tenant_id: &str,
        window: TimeWindow,
        limit: u32,
    ) -> Result<Vec<HttpErrorGroupRow>>;

    async fn js_error_totals(&self, tenant_id: &str, window: TimeWindow) -> Result<JsTotalsRow>;

    async fn js_error_groups(
        &self,
        tenant_id: &str,
        window: TimeWindow,
        limit: u32,
    ) -> Result<Vec<JsErrorGroupRow>>;

    async fn page_terms(
        &self,
        tenant_id: &str,
        window: TimeWindow,
        limit: u32,
    ) -> Result<Vec<PageTermsRow>>;

    async fn top_terms(
        &self,
        tenant_id: &str,
        window: TimeWindow,
        column: TermsColumn,
        limit: u32,
    ) -> Result<Vec<TermsRow>>;

    async fn geo_terms(
        &self,
        tenant_id: &str,
        window: TimeWindow,
        level: GeoLevel,
        limit: u32,
    ) -> Result<Vec<GeoRow>>;
}

fn query_error(e: clickhouse::error::Error) -> Error {
    metrics().agg_query_errors.inc();
    Error::store_unavailable(format!("Query error: {}", e))
}

#[async_trait]
impl AggSource for StoreClient {
    async fn traffic_totals(&self, tenant_id: &str, window: TimeWindow) -> Result<TrafficTotalsRow> {
        let sql = format!(
            "SELECT \
                countIf(kind IN ('performance', 'pageStatus')) AS pv, \
                uniqExact(session_user_id) AS uv, \
                uniqExactIf(session_user_id, is_first_visit = 1) AS new_users \
             FROM monitor.events WHERE {WINDOW_FILTER}"
        );
        metrics().agg_queries.inc();
        self.inner()
            .query(&sql)
            .bind(tenant_id)
            .bind(window.start_ms)
            .bind(window.end_ms)
            .fetch_one::<TrafficTotalsRow>()
            .await
            .map_err(query_error)
    }

    async fn trend_buckets(
        &self,
        tenant_id: &str,
        window: TimeWindow,
        bucket_ms: i64,
        offset_ms: i64,
    ) -> Result<Vec<TrendRow>> {
        // Same floor arithmetic as monitor_core::window::floor_bucket, so
        // returned keys line up with the zero-fill basis exactly.
        let sql = format!(
            "SELECT \
                intDiv(toUnixTimestamp64Milli(occurred_at) + ?, ?) * ? - ? AS bucket_start, \
                countIf(kind IN ('performance', 'pageStatus')) AS pv, \
                uniqExact(session_user_id) AS uv \
             FROM monitor.events WHERE {WINDOW_FILTER} \
             GROUP BY bucket_start ORDER BY bucket_start"
        );
        metrics().agg_queries.inc();
        let rows = self
            .inner()
            .query(&sql)
            .bind(offset_ms)
            .bind(bucket_ms)
            .bind(bucket_ms)
            .bind(offset_ms)
            .bind(tenant_id)
            .bind(window.start_ms)
            .bind(window.end_ms)
            .fetch_all::<TrendRow>()
            .await
            .map_err(query_error)?;
        debug!(tenant_id, buckets = rows.len(), "Fetched trend buckets");
        Ok(rows)
    }

    async fn perf_averages(&self, tenant_id: &str, window: TimeWindow) -> Result<PerfAvgRow> {
        let sql = format!(
            "SELECT \
                avg(dns_time) AS dns_time, avg(tcp_time) AS tcp_time, \
                avg(white_time) AS white_time, avg(fcp) AS fcp, \
                avg(ttfb) AS ttfb, avg(lcp) AS lcp, avg(fid) AS fid, \
                count() AS samples \
             FROM monitor.events WHERE {WINDOW_FILTER} AND kind = 'performance'"
        );
        metrics().agg_queries.inc();
        self.inner()
            .query(&sql)
            .bind(tenant_id)
            .bind(window.start_ms)
            .bind(window.end_ms)
            .fetch_one::<PerfAvgRow>()
            .await
            .map_err(query_error)
    }

    async fn perf_by_page(
        &self,
        tenant_id: &str,
        window: TimeWindow,
        limit: u32,
    ) -> Result<Vec<PagePerfRow>> {
        let sql = format!(
            "SELECT \
                page_url, count() AS samples, \
                avg(white_time) AS white_time, avg(fcp) AS fcp, \
                avg(lcp) AS lcp, avg(ttfb) AS ttfb \
             FROM monitor.events WHERE {WINDOW_FILTER} AND kind = 'performance' \
             GROUP BY page_url ORDER BY samples DESC LIMIT ?"
        );
        metrics().agg_queries.inc();
        self.inner()
            .query(&sql)
            .bind(tenant_id)
            .bind(window.start_ms)
            .bind(window.end_ms)
            .bind(limit)
            .fetch_all::<PagePerfRow>()
            .await
            .map_err(query_error)
    }

    async fn http_totals(&self, tenant_id: &str, window: TimeWindow) -> Result<HttpTotalsRow> {
        // Denominator counts every instrumented request; timeouts are not
        // errors for rate purposes.
        let sql = format!(
            "SELECT \
                count() AS total_requests, \
                countIf(outcome = 'error') AS error_requests \
             FROM monitor.events WHERE {WINDOW_FILTER} AND kind = 'request'"
        );
        metrics().agg_queries.inc();
        self.inner()
            .query(&sql)
            .bind(tenant_id)
            .bind(window.start_ms)
            .bind(window.end_ms)
            .fetch_one::<HttpTotalsRow>()
            .await
            .map_err(query_error)
    }

    async fn http_error_groups(
        &self,
        tenant_id: &str,
        window: TimeWindow,
        limit: u32,
    ) -> Result<Vec<HttpErrorGroupRow>> {
        let sql = format!(
            "SELECT \
                req_url AS url, count() AS error_count, avg(cost) AS avg_cost, \
                anyHeavy(status) AS top_status, \
                argMax(method, occurred_at) AS last_method, \
                argMax(page_url, occurred_at) AS last_page, \
                max(toUnixTimestamp64Milli(occurred_at)) AS last_seen \
             FROM monitor.events \
             WHERE {WINDOW_FILTER} AND kind = 'request' AND outcome = 'error' \
             GROUP BY req_url ORDER BY error_count DESC LIMIT ?"
        );
        metrics().agg_queries.inc();
        self.inner()
            .query(&sql)
            .bind(tenant_id)
            .bind(window.start_ms)
            .bind(window.end_ms)
            .bind(limit)
            .fetch_all::<HttpErrorGroupRow>()
            .await
            .map_err(query_error)
    }

    async fn js_error_totals(&self, tenant_id: &str, window: TimeWindow) -> Result<JsTotalsRow> {
        let sql = format!(
            "SELECT \
                count() AS total_errors, \
                uniqExact(session_user_id) AS affected_users \
             FROM monitor.events WHERE {WINDOW_FILTER} AND kind = 'jsError'"
        );
        metrics().agg_queries.inc();
        self.inner()
            .query(&sql)
            .bind(tenant_id)
            .bind(window.start_ms)
            .bind(window.end_ms)
            .fetch_one::<JsTotalsRow>()
            .await
            .map_err(query_error)
    }

    async fn js_error_groups(
        &self,
        tenant_id: &str,
        window: TimeWindow,
        limit: u32,
    ) -> Result<Vec<JsErrorGroupRow>> {
        let sql = format!(
            "SELECT \
                message, count() AS occurrences, \
                argMax(filename, occurred_at) AS filename, \
                argMax(lineno, occurred_at) AS lineno, \
                argMax(colno, occurred_at) AS colno, \
                argMax(stack, occurred_at) AS stack, \
                argMax(page_url, occurred_at) AS last_page, \
                max(toUnixTimestamp64Milli(occurred_at)) AS last_seen \
             FROM monitor.events WHERE {WINDOW_FILTER} AND kind = 'jsError' \
             GROUP BY message ORDER BY occurrences DESC LIMIT ?"
        );
        metrics().agg_queries.inc();
        self.inner()
            .query(&sql)
            .bind(tenant_id)
            .bind(window.start_ms)
            .bind(window.end_ms)
            .bind(limit)
            .fetch_all::<JsErrorGroupRow>()
            .await
            .map_err(query_error)
    }

    async fn page_terms(
        &self,
        tenant_id: &str,
        window: TimeWindow,
        limit: u32,
    ) -> Result<Vec<PageTermsRow>> {
        let sql = format!(
            "SELECT \
                page_url AS label, \
                countIf(kind IN ('performance', 'pageStatus')) AS pv, \
                uniqExact(session_user_id) AS uv \
             FROM monitor.events WHERE {WINDOW_FILTER} \
             GROUP BY page_url ORDER BY pv DESC LIMIT ?"
        );
        metrics().agg_queries.inc();
        self.inner()
            .query(&sql)
            .bind(tenant_id)
            .bind(window.start_ms)
            .bind(window.end_ms)
            .bind(limit)
            .fetch_all::<PageTermsRow>()
            .await
            .map_err(query_error)
    }

    async fn top_terms(
        &self,
        tenant_id: &str,
        window: TimeWindow,
        column: TermsColumn,
        limit: u32,
    ) -> Result<Vec<TermsRow>> {
        // Column name comes from a closed enum, never from the caller.
        let sql = format!(
            "SELECT {col} AS label, \
                countIf(kind IN ('performance', 'pageStatus')) AS count \
             FROM monitor.events WHERE {WINDOW_FILTER} \
             GROUP BY label ORDER BY count DESC LIMIT ?",
            col = column.column()
        );
        metrics().agg_queries.inc();
        self.inner()
            .query(&sql)
            .bind(tenant_id)
            .bind(window.start_ms)
            .bind(window.end_ms)
            .bind(limit)
            .fetch_all::<TermsRow>()
            .await
            .map_err(query_error)
    }

    async fn geo_terms(
        &self,
        tenant_id: &str,
        window: TimeWindow,
        level: GeoLevel,
        limit: u32,
    ) -> Result<Vec<GeoRow>> {
        let sql = format!(
            "SELECT {col} AS name, \
                countIf(kind IN ('performance', 'pageStatus')) AS pv, \
                uniqExact(session_user_id) AS uv \
             FROM monitor.events WHERE {WINDOW_FILTER} \
             GROUP BY name ORDER BY pv DESC LIMIT ?",
            col = level.column()
        );
        metrics().agg_queries.inc();
        self.inner()
            .query(&sql)
            .bind(tenant_id)
            .bind(window.start_ms)
            .bind(window.end_ms)
            .bind(limit)
            .fetch_all::<GeoRow>()
            .await
            .map_err(query_error)
    }
}
