//! Alert endpoint tests.
//!
//! Thresholds are strict: readings at the threshold never alert. Store
//! failures surface as failed checks in the report, never as raised
//! alerts.

use event_store::{HttpTotalsRow, JsTotalsRow, PerfAvgRow};
use integration_tests::setup::TestContext;
use serde_json::Value;

#[tokio::test]
async fn error_rate_above_warning_raises_and_notifies() {
    let ctx = TestContext::new();
    ctx.source.set_http(
        "a1",
        HttpTotalsRow {
            total_requests: 100,
            error_requests: 6,
        },
    );

    let response = ctx
        .server
        .post("/api/alert/check")
        .add_query_param("appId", "a1")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["code"], 1000);
    let alerts = body["data"]["alerts"].as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["kind"], "ERROR_RATE_HIGH");
    assert_eq!(alerts[0]["severity"], "warning");
    assert_eq!(alerts[0]["detail"]["errorRate"], "6.00%");
    assert_eq!(alerts[0]["detail"]["threshold"]["warningPct"], 5.0);
    assert_eq!(alerts[0]["detail"]["threshold"]["criticalPct"], 10.0);
    assert!(body["data"]["failedChecks"].as_array().unwrap().is_empty());

    let notified = ctx.sink.captured();
    assert_eq!(notified.len(), 1);
    assert_eq!(notified[0].tenant_id, "a1");
}

#[tokio::test]
async fn error_rate_at_exactly_the_threshold_stays_silent() {
    let ctx = TestContext::new();
    ctx.source.set_http(
        "a1",
        HttpTotalsRow {
            total_requests: 100,
            error_requests: 5,
        },
    );

    let response = ctx
        .server
        .post("/api/alert/check")
        .add_query_param("appId", "a1")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["data"]["alerts"].as_array().unwrap().is_empty());
    assert_eq!(ctx.sink.count(), 0);
}

#[tokio::test]
async fn error_rate_above_critical_is_critical() {
    let ctx = TestContext::new();
    ctx.source.set_http(
        "a1",
        HttpTotalsRow {
            total_requests: 100,
            error_requests: 11,
        },
    );

    let response = ctx
        .server
        .post("/api/alert/check")
        .add_query_param("appId", "a1")
        .await;

    let body: Value = response.json();
    let alerts = body["data"]["alerts"].as_array().unwrap();
    assert_eq!(alerts[0]["severity"], "critical");
}

#[tokio::test]
async fn slow_core_web_vitals_degrade_performance() {
    let ctx = TestContext::new();
    ctx.source.set_perf(
        "a1",
        PerfAvgRow {
            fcp: Some(3500.0),
            lcp: Some(2000.0),
            samples: 40,
            ..Default::default()
        },
    );

    let response = ctx
        .server
        .post("/api/alert/check")
        .add_query_param("appId", "a1")
        .await;

    let body: Value = response.json();
    let alerts = body["data"]["alerts"].as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["kind"], "PERFORMANCE_DEGRADED");
    assert_eq!(alerts[0]["detail"]["avgFcp"], 3500.0);
    assert_eq!(alerts[0]["detail"]["threshold"]["fcpMs"], 3000.0);
    assert_eq!(alerts[0]["detail"]["threshold"]["lcpMs"], 4000.0);
}

#[tokio::test]
async fn js_error_spike_above_critical() {
    let ctx = TestContext::new();
    ctx.source.set_js(
        "a1",
        JsTotalsRow {
            total_errors: 101,
            affected_users: 12,
        },
    );

    let response = ctx
        .server
        .post("/api/alert/check")
        .add_query_param("appId", "a1")
        .await;

    let body: Value = response.json();
    let alerts = body["data"]["alerts"].as_array().unwrap();
    assert_eq!(alerts[0]["kind"], "JS_ERROR_SPIKE");
    assert_eq!(alerts[0]["severity"], "critical");
    assert_eq!(alerts[0]["detail"]["threshold"]["critical"], 100);
}

#[tokio::test]
async fn empty_window_is_healthy_not_alerting() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/api/alert/check")
        .add_query_param("appId", "a1")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["data"]["alerts"].as_array().unwrap().is_empty());
    assert!(body["data"]["failedChecks"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn store_failure_reports_failed_checks_without_alerts() {
    let ctx = TestContext::new();
    ctx.source.set_should_fail(true);

    let response = ctx
        .server
        .post("/api/alert/check")
        .add_query_param("appId", "a1")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["data"]["alerts"].as_array().unwrap().is_empty());
    let failed = body["data"]["failedChecks"].as_array().unwrap();
    assert_eq!(failed.len(), 3);
    assert_eq!(ctx.sink.count(), 0);
}

#[tokio::test]
async fn check_gates_unknown_tenants() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/api/alert/check")
        .add_query_param("appId", "nope")
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn check_all_summarizes_every_active_tenant() {
    let ctx = TestContext::new();
    ctx.directory.add("a2", monitor_core::TenantStatus::Active);
    ctx.directory.add("off", monitor_core::TenantStatus::Disabled);
    ctx.source.set_http(
        "a2",
        HttpTotalsRow {
            total_requests: 50,
            error_requests: 10,
        },
    );

    let response = ctx.server.post("/api/alert/check-all").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["code"], 1000);
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["succeeded"], 2);
    assert_eq!(body["data"]["failed"], 0);
    assert_eq!(body["data"]["alertsRaised"], 1);

    let notified = ctx.sink.captured();
    assert_eq!(notified.len(), 1);
    assert_eq!(notified[0].tenant_id, "a2");
}
