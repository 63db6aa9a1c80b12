//! Query engine over the aggregation source.
//!
//! Two entry styles per shape: `fetch_*` propagates store failures (the
//! alert evaluator and tests need to tell "store down" from "no data"),
//! while the plain methods fail open and hand the dashboard an explicitly
//! zeroed shape instead of an error page.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use event_store::{AggSource, GeoLevel, TermsColumn};
use monitor_core::window::{bucket_starts, MILLIS_PER_HOUR};
use monitor_core::{Granularity, Result, TimeWindow};
use serde::{Deserialize, Serialize};
use telemetry::metrics;
use tracing::warn;

use crate::shapes::*;

/// Query engine configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineConfig {
    /// UTC offset for day-bucket alignment, hours east of UTC.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    /// Rows returned by error rankings.
    #[serde(default = "default_rank_limit")]
    pub rank_limit: u32,
    /// Rows returned by breakdowns and geo rollups.
    #[serde(default = "default_top_limit")]
    pub top_limit: u32,
}

fn default_utc_offset_hours() -> i32 {
    8
}

fn default_rank_limit() -> u32 {
    10
}

fn default_top_limit() -> u32 {
    10
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: default_utc_offset_hours(),
            rank_limit: default_rank_limit(),
            top_limit: default_top_limit(),
        }
    }
}

impl EngineConfig {
    pub fn offset_ms(&self) -> i64 {
        self.utc_offset_hours as i64 * MILLIS_PER_HOUR
    }
}

/// Round to two decimals at the response boundary.
fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Percentage string `"NN.NN%"`; zero denominator yields `"0.00%"`.
fn percent(numer: u64, denom: u64) -> String {
    if denom == 0 {
        "0.00%".to_string()
    } else {
        format!("{:.2}%", numer as f64 / denom as f64 * 100.0)
    }
}

/// Dashboard query engine.
#[derive(Clone)]
pub struct QueryEngine {
    source: Arc<dyn AggSource>,
    config: EngineConfig,
}

impl QueryEngine {
    pub fn new(source: Arc<dyn AggSource>, config: EngineConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ----- fallible fetchers -----

    pub async fn fetch_traffic_summary(
        &self,
        tenant_id: &str,
        window: TimeWindow,
    ) -> Result<TrafficSummary> {
        let row = self.source.traffic_totals(tenant_id, window).await?;
        Ok(TrafficSummary {
            pv: row.pv,
            uv: row.uv,
            new_users: row.new_users,
        })
    }

    pub async fn fetch_traffic_trend(
        &self,
        tenant_id: &str,
        window: TimeWindow,
        granularity: Granularity,
    ) -> Result<TrafficTrend> {
        let bucket_ms = granularity.bucket_ms();
        let offset_ms = self.config.offset_ms();
        let rows = self
            .source
            .trend_buckets(tenant_id, window, bucket_ms, offset_ms)
            .await?;
        let by_start: HashMap<i64, (u64, u64)> = rows
            .into_iter()
            .map(|r| (r.bucket_start, (r.pv, r.uv)))
            .collect();

        let points = bucket_starts(window, bucket_ms, offset_ms)
            .into_iter()
            .map(|start| {
                let (pv, uv) = by_start.get(&start).copied().unwrap_or((0, 0));
                TrendPoint { time: start, pv, uv }
            })
            .collect();

        Ok(TrafficTrend { points })
    }

    pub async fn fetch_performance_report(
        &self,
        tenant_id: &str,
        window: TimeWindow,
    ) -> Result<PerformanceReport> {
        let avg = self.source.perf_averages(tenant_id, window).await?;
        let pages = self
            .source
            .perf_by_page(tenant_id, window, self.config.rank_limit)
            .await?;

        Ok(PerformanceReport {
            averages: PerfAverages {
                dns_time: round2(avg.dns_time.unwrap_or(0.0)),
                tcp_time: round2(avg.tcp_time.unwrap_or(0.0)),
                white_time: round2(avg.white_time.unwrap_or(0.0)),
                fcp: round2(avg.fcp.unwrap_or(0.0)),
                ttfb: round2(avg.ttfb.unwrap_or(0.0)),
                lcp: round2(avg.lcp.unwrap_or(0.0)),
                fid: round2(avg.fid.unwrap_or(0.0)),
                samples: avg.samples,
            },
            pages: pages
                .into_iter()
                .map(|p| PagePerformance {
                    page_url: p.page_url,
                    samples: p.samples,
                    white_time: round2(p.white_time.unwrap_or(0.0)),
                    fcp: round2(p.fcp.unwrap_or(0.0)),
                    lcp: round2(p.lcp.unwrap_or(0.0)),
                    ttfb: round2(p.ttfb.unwrap_or(0.0)),
                })
                .collect(),
        })
    }

    pub async fn fetch_http_error_ranking(
        &self,
        tenant_id: &str,
        window: TimeWindow,
    ) -> Result<HttpErrorRanking> {
        let totals = self.source.http_totals(tenant_id, window).await?;
        let groups = self
            .source
            .http_error_groups(tenant_id, window, self.config.rank_limit)
            .await?;

        let items = groups
            .into_iter()
            .map(|g| HttpErrorItem {
                url: g.url,
                error_count: g.error_count,
                proportion: percent(g.error_count, totals.error_requests),
                avg_cost: round2(g.avg_cost.unwrap_or(0.0)),
                top_status: g.top_status,
                last_method: g.last_method,
                last_page: g.last_page,
                last_seen: g.last_seen,
            })
            .collect();

        Ok(HttpErrorRanking {
            total_requests: totals.total_requests,
            error_requests: totals.error_requests,
            error_rate: percent(totals.error_requests, totals.total_requests),
            items,
        })
    }

    pub async fn fetch_js_error_ranking(
        &self,
        tenant_id: &str,
        window: TimeWindow,
    ) -> Result<JsErrorRanking> {
        let totals = self.source.js_error_totals(tenant_id, window).await?;
        let groups = self
            .source
            .js_error_groups(tenant_id, window, self.config.rank_limit)
            .await?;

        let items = groups
            .into_iter()
            .map(|g| JsErrorItem {
                message: g.message,
                count: g.occurrences,
                proportion: percent(g.occurrences, totals.total_errors),
                filename: g.filename,
                lineno: g.lineno,
                colno: g.colno,
                stack: g.stack,
                last_page: g.last_page,
                last_seen: g.last_seen,
            })
            .collect();

        Ok(JsErrorRanking {
            total_errors: totals.total_errors,
            affected_users: totals.affected_users,
            items,
        })
    }

    pub async fn fetch_top_breakdown(
        &self,
        tenant_id: &str,
        window: TimeWindow,
        dimension: BreakdownDimension,
    ) -> Result<TopBreakdown> {
        let limit = self.config.top_limit;
        // Shares are over the window pv total, not the listed rows, so a
        // truncated top-N list does not inflate the proportions.
        let total = self.source.traffic_totals(tenant_id, window).await?.pv;
        let items = match dimension {
            BreakdownDimension::Page => {
                let rows = self.source.page_terms(tenant_id, window, limit).await?;
                rows.into_iter()
                    .map(|r| BreakdownItem {
                        proportion: percent(r.pv, total),
                        label: r.label,
                        count: r.pv,
                        uv: Some(r.uv),
                    })
                    .collect()
            }
            _ => {
                let column = match dimension {
                    BreakdownDimension::Browser => TermsColumn::Browser,
                    BreakdownDimension::Os => TermsColumn::Os,
                    _ => TermsColumn::DeviceVendor,
                };
                let rows = self.source.top_terms(tenant_id, window, column, limit).await?;
                rows.into_iter()
                    .map(|r| BreakdownItem {
                        proportion: percent(r.count, total),
                        label: r.label,
                        count: r.count,
                        uv: None,
                    })
                    .collect()
            }
        };

        Ok(TopBreakdown { dimension, items })
    }

    pub async fn fetch_geo_distribution(
        &self,
        tenant_id: &str,
        window: TimeWindow,
        level: RegionLevel,
    ) -> Result<GeoDistribution> {
        let geo_level = match level {
            RegionLevel::Province => GeoLevel::Province,
            RegionLevel::City => GeoLevel::City,
        };
        let total = self.source.traffic_totals(tenant_id, window).await?.pv;
        let rows = self
            .source
            .geo_terms(tenant_id, window, geo_level, self.config.top_limit)
            .await?;
        let items = rows
            .into_iter()
            .map(|r| RegionItem {
                share: percent(r.pv, total),
                name: r.name,
                pv: r.pv,
                uv: r.uv,
            })
            .collect();

        Ok(GeoDistribution { level, items })
    }

    // ----- fail-open dashboard entry points -----

    pub async fn traffic_summary(&self, tenant_id: &str, window: TimeWindow) -> TrafficSummary {
        let start = Instant::now();
        let out = match self.fetch_traffic_summary(tenant_id, window).await {
            Ok(shape) => shape,
            Err(e) => {
                warn!(tenant_id, error = %e, "Traffic summary failed open to zeros");
                TrafficSummary::default()
            }
        };
        metrics().query_latency_ms.observe(start.elapsed().as_millis() as u64);
        out
    }

    pub async fn traffic_trend(
        &self,
        tenant_id: &str,
        window: TimeWindow,
        granularity: Granularity,
    ) -> TrafficTrend {
        let start = Instant::now();
        let out = match self.fetch_traffic_trend(tenant_id, window, granularity).await {
            Ok(shape) => shape,
            Err(e) => {
                warn!(tenant_id, error = %e, "Traffic trend failed open to zeros");
                // The zero shape still carries every bucket.
                let points = bucket_starts(window, granularity.bucket_ms(), self.config.offset_ms())
                    .into_iter()
                    .map(|start| TrendPoint { time: start, pv: 0, uv: 0 })
                    .collect();
                TrafficTrend { points }
            }
        };
        metrics().query_latency_ms.observe(start.elapsed().as_millis() as u64);
        out
    }

    pub async fn performance_report(
        &self,
        tenant_id: &str,
        window: TimeWindow,
    ) -> PerformanceReport {
        let start = Instant::now();
        let out = match self.fetch_performance_report(tenant_id, window).await {
            Ok(shape) => shape,
            Err(e) => {
                warn!(tenant_id, error = %e, "Performance report failed open to zeros");
                PerformanceReport::default()
            }
        };
        metrics().query_latency_ms.observe(start.elapsed().as_millis() as u64);
        out
    }

    pub async fn http_error_ranking(
        &self,
        tenant_id: &str,
        window: TimeWindow,
    ) -> HttpErrorRanking {
        let start = Instant::now();
        let out = match self.fetch_http_error_ranking(tenant_id, window).await {
            Ok(shape) => shape,
            Err(e) => {
                warn!(tenant_id, error = %e, "HTTP error ranking failed open to zeros");
                HttpErrorRanking {
                    error_rate: "0.00%".to_string(),
                    ..Default::default()
                }
            }
        };
        metrics().query_latency_ms.observe(start.elapsed().as_millis() as u64);
        out
    }

    pub async fn js_error_ranking(&self, tenant_id: &str, window: TimeWindow) -> JsErrorRanking {
        let start = Instant::now();
        let out = match self.fetch_js_error_ranking(tenant_id, window).await {
            Ok(shape) => shape,
            Err(e) => {
                warn!(tenant_id, error = %e, "JS error ranking failed open to zeros");
                JsErrorRanking::default()
            }
        };
        metrics().query_latency_ms.observe(start.elapsed().as_millis() as u64);
        out
    }

    pub async fn top_breakdown(
        &self,
        tenant_id: &str,
        window: TimeWindow,
        dimension: BreakdownDimension,
    ) -> TopBreakdown {
        let start = Instant::now();
        let out = match self.fetch_top_breakdown(tenant_id, window, dimension).await {
            Ok(shape) => shape,
            Err(e) => {
                warn!(tenant_id, error = %e, "Top breakdown failed open to empty");
                TopBreakdown { dimension, items: Vec::new() }
            }
        };
        metrics().query_latency_ms.observe(start.elapsed().as_millis() as u64);
        out
    }

    pub async fn geo_distribution(
        &self,
        tenant_id: &str,
        window: TimeWindow,
        level: RegionLevel,
    ) -> GeoDistribution {
        let start = Instant::now();
        let out = match self.fetch_geo_distribution(tenant_id, window, level).await {
            Ok(shape) => shape,
            Err(e) => {
                warn!(tenant_id, error = %e, "Geo distribution failed open to empty");
                GeoDistribution { level, items: Vec::new() }
            }
        };
        metrics().query_latency_ms.observe(start.elapsed().as_millis() as u64);
        out
    }
}
