//! Dashboard query endpoint tests.
//!
//! Queries are fail-open: a dead store yields the zero shape with a 200,
//! never an error. Formatting (two decimals, percentage strings) happens
//! at this boundary and is asserted on the wire.

use event_store::{
    GeoRow, HttpErrorGroupRow, HttpTotalsRow, JsErrorGroupRow, JsTotalsRow, PerfAvgRow, TermsRow,
    TrafficTotalsRow, TrendRow,
};
use integration_tests::setup::TestContext;
use serde_json::Value;

#[tokio::test]
async fn stats_returns_window_totals() {
    let ctx = TestContext::new();
    ctx.source.set_traffic(
        "a1",
        TrafficTotalsRow {
            pv: 120,
            uv: 30,
            new_users: 7,
        },
    );

    let response = ctx
        .server
        .get("/api/analyse/stats")
        .add_query_param("appId", "a1")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["code"], 1000);
    assert_eq!(body["data"]["pv"], 120);
    assert_eq!(body["data"]["uv"], 30);
    assert_eq!(body["data"]["newUsers"], 7);
}

#[tokio::test]
async fn trend_zero_fills_empty_buckets() {
    let ctx = TestContext::new();
    ctx.source.set_trend(
        "a1",
        vec![TrendRow {
            bucket_start: 3_600_000,
            pv: 5,
            uv: 2,
        }],
    );

    let response = ctx
        .server
        .get("/api/traffic/trend")
        .add_query_param("appId", "a1")
        .add_query_param("startTime", "0")
        .add_query_param("endTime", "10800000")
        .add_query_param("type", "hour")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let points = body["data"]["points"].as_array().unwrap();
    assert_eq!(points.len(), 3);
    assert_eq!(points[0]["time"], 0);
    assert_eq!(points[0]["pv"], 0);
    assert_eq!(points[1]["time"], 3_600_000);
    assert_eq!(points[1]["pv"], 5);
    assert_eq!(points[1]["uv"], 2);
    assert_eq!(points[2]["pv"], 0);
}

#[tokio::test]
async fn trend_fails_open_with_every_bucket_zeroed() {
    let ctx = TestContext::new();
    ctx.source.set_should_fail(true);

    let response = ctx
        .server
        .get("/api/traffic/trend")
        .add_query_param("appId", "a1")
        .add_query_param("startTime", "0")
        .add_query_param("endTime", "10800000")
        .add_query_param("type", "hour")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["code"], 1000);
    let points = body["data"]["points"].as_array().unwrap();
    assert_eq!(points.len(), 3);
    assert!(points.iter().all(|p| p["pv"] == 0 && p["uv"] == 0));
}

#[tokio::test]
async fn stats_fails_open_with_zero_totals() {
    let ctx = TestContext::new();
    ctx.source.set_should_fail(true);

    let response = ctx
        .server
        .get("/api/analyse/stats")
        .add_query_param("appId", "a1")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["code"], 1000);
    assert_eq!(body["data"]["pv"], 0);
    assert_eq!(body["data"]["newUsers"], 0);
}

#[tokio::test]
async fn performance_report_rounds_to_two_decimals() {
    let ctx = TestContext::new();
    ctx.source.set_perf(
        "a1",
        PerfAvgRow {
            fcp: Some(850.456),
            lcp: Some(1400.004),
            ttfb: Some(120.0),
            samples: 10,
            ..Default::default()
        },
    );

    let response = ctx
        .server
        .get("/api/performance/avg")
        .add_query_param("appId", "a1")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["averages"]["fcp"], 850.46);
    assert_eq!(body["data"]["averages"]["lcp"], 1400.0);
    assert_eq!(body["data"]["averages"]["samples"], 10);
}

#[tokio::test]
async fn http_error_rank_formats_rate_and_proportions() {
    let ctx = TestContext::new();
    ctx.source.set_http(
        "a1",
        HttpTotalsRow {
            total_requests: 100,
            error_requests: 10,
        },
    );
    ctx.source.set_http_groups(
        "a1",
        vec![HttpErrorGroupRow {
            url: "/api/orders".into(),
            error_count: 7,
            avg_cost: Some(310.5),
            top_status: 502,
            last_method: "POST".into(),
            last_page: "https://shop.example.com/checkout".into(),
            last_seen: 1_700_000_000_000,
        }],
    );

    let response = ctx
        .server
        .get("/api/http-error/rank")
        .add_query_param("appId", "a1")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["totalRequests"], 100);
    assert_eq!(body["data"]["errorRate"], "10.00%");
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items[0]["url"], "/api/orders");
    assert_eq!(items[0]["proportion"], "70.00%");
    assert_eq!(items[0]["topStatus"], 502);
}

#[tokio::test]
async fn empty_window_error_rate_is_zero_percent() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .get("/api/http-error/rank")
        .add_query_param("appId", "a1")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["errorRate"], "0.00%");
    assert!(body["data"]["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn js_error_rank_carries_latest_samples() {
    let ctx = TestContext::new();
    ctx.source.set_js(
        "a1",
        JsTotalsRow {
            total_errors: 20,
            affected_users: 4,
        },
    );
    ctx.source.set_js_groups(
        "a1",
        vec![JsErrorGroupRow {
            message: "TypeError: x is undefined".into(),
            occurrences: 15,
            filename: "app.js".into(),
            lineno: 42,
            colno: 7,
            stack: "at render (app.js:42:7)".into(),
            last_page: "https://shop.example.com/home".into(),
            last_seen: 1_700_000_000_000,
        }],
    );

    let response = ctx
        .server
        .get("/api/js-error/rank")
        .add_query_param("appId", "a1")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["totalErrors"], 20);
    assert_eq!(body["data"]["affectedUsers"], 4);
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items[0]["count"], 15);
    assert_eq!(items[0]["proportion"], "75.00%");
    assert_eq!(items[0]["lineno"], 42);
}

#[tokio::test]
async fn browser_breakdown_shares_are_over_window_total() {
    let ctx = TestContext::new();
    ctx.source.set_traffic(
        "a1",
        TrafficTotalsRow {
            pv: 100,
            uv: 50,
            new_users: 0,
        },
    );
    ctx.source.set_terms(
        "a1",
        vec![
            TermsRow {
                label: "Chrome".into(),
                count: 60,
            },
            TermsRow {
                label: "Safari".into(),
                count: 40,
            },
        ],
    );

    let response = ctx
        .server
        .get("/api/top/analyse")
        .add_query_param("appId", "a1")
        .add_query_param("type", "browser")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["dimension"], "browser");
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items[0]["label"], "Chrome");
    assert_eq!(items[0]["proportion"], "60.00%");
    assert!(items[0].get("uv").is_none());
    assert_eq!(items[1]["proportion"], "40.00%");
}

#[tokio::test]
async fn geo_distribution_defaults_to_province_level() {
    let ctx = TestContext::new();
    ctx.source.set_traffic(
        "a1",
        TrafficTotalsRow {
            pv: 100,
            uv: 30,
            new_users: 0,
        },
    );
    ctx.source.set_geo(
        "a1",
        vec![
            GeoRow {
                name: "Zhejiang".into(),
                pv: 70,
                uv: 20,
            },
            GeoRow {
                name: "Beijing".into(),
                pv: 30,
                uv: 10,
            },
        ],
    );

    let response = ctx
        .server
        .get("/api/geo/distribution")
        .add_query_param("appId", "a1")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["level"], "province");
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items[0]["share"], "70.00%");
    assert_eq!(items[1]["share"], "30.00%");
}

#[tokio::test]
async fn tenant_rows_never_leak_into_another_tenant() {
    let ctx = TestContext::new();
    ctx.directory.add("a2", monitor_core::TenantStatus::Active);
    ctx.source.set_traffic(
        "a1",
        TrafficTotalsRow {
            pv: 120,
            uv: 30,
            new_users: 7,
        },
    );
    ctx.source.set_http(
        "a1",
        HttpTotalsRow {
            total_requests: 100,
            error_requests: 10,
        },
    );
    ctx.source.set_geo(
        "a1",
        vec![GeoRow {
            name: "Zhejiang".into(),
            pv: 70,
            uv: 20,
        }],
    );

    let stats = ctx
        .server
        .get("/api/analyse/stats")
        .add_query_param("appId", "a2")
        .await;
    let body: Value = stats.json();
    assert_eq!(body["data"]["pv"], 0);
    assert_eq!(body["data"]["uv"], 0);

    let rank = ctx
        .server
        .get("/api/http-error/rank")
        .add_query_param("appId", "a2")
        .await;
    let body: Value = rank.json();
    assert_eq!(body["data"]["totalRequests"], 0);
    assert_eq!(body["data"]["errorRate"], "0.00%");

    let geo = ctx
        .server
        .get("/api/geo/distribution")
        .add_query_param("appId", "a2")
        .await;
    let body: Value = geo.json();
    assert!(body["data"]["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn repeated_query_over_unchanged_rows_is_identical() {
    let ctx = TestContext::new();
    ctx.source.set_traffic(
        "a1",
        TrafficTotalsRow {
            pv: 120,
            uv: 30,
            new_users: 7,
        },
    );
    ctx.source.set_trend(
        "a1",
        vec![TrendRow {
            bucket_start: 3_600_000,
            pv: 5,
            uv: 2,
        }],
    );

    let first = ctx
        .server
        .get("/api/traffic/trend")
        .add_query_param("appId", "a1")
        .add_query_param("startTime", "0")
        .add_query_param("endTime", "10800000")
        .add_query_param("type", "hour")
        .await;
    let second = ctx
        .server
        .get("/api/traffic/trend")
        .add_query_param("appId", "a1")
        .add_query_param("startTime", "0")
        .add_query_param("endTime", "10800000")
        .add_query_param("type", "hour")
        .await;

    first.assert_status_ok();
    second.assert_status_ok();
    assert_eq!(first.text(), second.text());
}

#[tokio::test]
async fn queries_gate_unknown_tenants() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .get("/api/analyse/stats")
        .add_query_param("appId", "nope")
        .await;

    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert_eq!(body["code"], 1001);
}

#[tokio::test]
async fn inverted_window_is_a_400() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .get("/api/analyse/stats")
        .add_query_param("appId", "a1")
        .add_query_param("startTime", "2000")
        .add_query_param("endTime", "1000")
        .await;

    assert_eq!(response.status_code(), 400);
}
