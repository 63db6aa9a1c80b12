//! End-to-end ingestion tests over the real router.
//!
//! POST /api/report runs the full pipeline: tenant gate, validation,
//! enrichment, bulk write into the mock writer.

use integration_tests::fixtures;
use integration_tests::setup::TestContext;
use monitor_core::{TenantStatus, UNKNOWN};
use serde_json::{json, Value};

#[tokio::test]
async fn report_batch_is_stored_and_acknowledged() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/api/report")
        .add_query_param("appId", "a1")
        .json(&fixtures::performance_batch(5))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["code"], 1000);
    assert_eq!(body["message"], "success");
    assert_eq!(body["data"]["received"], 5);
    assert_eq!(ctx.writer.count(), 5);
}

#[tokio::test]
async fn stored_records_carry_complete_enrichment() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/api/report")
        .add_query_param("appId", "a1")
        .add_header("X-Forwarded-For", "10.0.0.7")
        .add_header("User-Agent", fixtures::CHROME_UA)
        .json(&json!([fixtures::performance_event("mk-1", true)]))
        .await;

    response.assert_status_ok();
    let records = ctx.writer.captured();
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record.tenant_id, "a1");
    assert_eq!(record.occurred_at, fixtures::BASE_TS);
    assert!(record.is_first_visit);
    assert_eq!(record.enrichment.browser_name, "Chrome");
    assert_eq!(record.enrichment.os_name, "Windows 10");
    assert_eq!(record.enrichment.ip, "10.0.0.7");
    assert_eq!(record.enrichment.province, "Internal");
    assert!(record.enrichment.is_complete());
}

#[tokio::test]
async fn missing_transport_headers_degrade_to_unknown() {
    let ctx = TestContext::new();

    ctx.server
        .post("/api/report")
        .add_query_param("appId", "a1")
        .json(&json!([fixtures::js_error_event("mk-1", "boom")]))
        .await
        .assert_status_ok();

    let records = ctx.writer.captured();
    assert_eq!(records[0].enrichment.ip, UNKNOWN);
    assert_eq!(records[0].enrichment.browser_name, UNKNOWN);
    assert!(records[0].enrichment.is_complete());
}

#[tokio::test]
async fn unknown_tenant_gets_404_with_failure_envelope() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/api/report")
        .add_query_param("appId", "nope")
        .json(&json!([fixtures::performance_event("mk-1", false)]))
        .await;

    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert_eq!(body["code"], 1001);
    assert!(body["data"].is_null());
    assert_eq!(ctx.writer.count(), 0);
}

#[tokio::test]
async fn disabled_tenant_gets_403() {
    let ctx = TestContext::new();
    ctx.directory.add("paused", TenantStatus::Disabled);

    let response = ctx
        .server
        .post("/api/report")
        .add_query_param("appId", "paused")
        .json(&json!([fixtures::performance_event("mk-1", false)]))
        .await;

    assert_eq!(response.status_code(), 403);
    let body: Value = response.json();
    assert_eq!(body["code"], 1001);
    assert_eq!(ctx.writer.count(), 0);
}

#[tokio::test]
async fn non_array_body_is_a_400() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/api/report")
        .add_query_param("appId", "a1")
        .json(&json!({"events": []}))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], 1001);
}

#[tokio::test]
async fn one_invalid_event_rejects_the_whole_batch() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/api/report")
        .add_query_param("appId", "a1")
        .json(&json!([
            fixtures::performance_event("mk-1", false),
            fixtures::invalid_event(),
        ]))
        .await;

    assert_eq!(response.status_code(), 400);
    assert_eq!(ctx.writer.count(), 0);
}

#[tokio::test]
async fn store_failure_surfaces_as_500_and_stores_nothing() {
    let ctx = TestContext::new();
    ctx.writer.set_should_fail(true);

    let response = ctx
        .server
        .post("/api/report")
        .add_query_param("appId", "a1")
        .json(&fixtures::performance_batch(2))
        .await;

    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert_eq!(body["code"], 1001);
    assert_eq!(ctx.writer.count(), 0);
}
