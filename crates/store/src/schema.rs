//! ClickHouse table schemas.
//!
//! One wide events table per deployment:
//! - tenant_id first in the sort key, so every query prunes to one tenant
//! - LowCardinality for enum-like fields
//! - DateTime64(3) for millisecond precision
//! - payload columns default to '' / 0 / NULL for kinds that do not use them

/// SQL for creating the database.
pub const CREATE_DATABASE: &str = "CREATE DATABASE IF NOT EXISTS monitor";

/// SQL for creating the events table.
///
/// Write-once: no mutations or upserts ever run against this table.
pub const CREATE_EVENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS monitor.events (
    -- Core identifiers
    event_id String,
    tenant_id String,
    kind LowCardinality(String),
    occurred_at DateTime64(3),
    received_at DateTime64(3),

    -- Session
    session_user_id String,
    is_first_visit UInt8,
    page_url String,
    domain String,

    -- performance
    dns_time Nullable(Float64),
    tcp_time Nullable(Float64),
    white_time Nullable(Float64),
    fcp Nullable(Float64),
    ttfb Nullable(Float64),
    lcp Nullable(Float64),
    fid Nullable(Float64),

    -- pageStatus
    in_time Nullable(Int64),
    leave_time Nullable(Int64),
    residence Nullable(Int64),

    -- request
    req_url String DEFAULT '',
    method LowCardinality(String) DEFAULT '',
    status UInt16 DEFAULT 0,
    outcome LowCardinality(String) DEFAULT '',
    cost Nullable(Float64),

    -- jsError
    message String DEFAULT '',
    filename String DEFAULT '',
    lineno UInt32 DEFAULT 0,
    colno UInt32 DEFAULT 0,
    stack String DEFAULT '',

    -- loadResourceError / rejectError / click
    resource_type String DEFAULT '',
    resource_url String DEFAULT '',
    reason String DEFAULT '',
    click_element String DEFAULT '',

    -- Enrichment (server-side, never client-supplied)
    browser_name LowCardinality(String),
    browser_version String,
    os_name LowCardinality(String),
    os_version String,
    device_vendor LowCardinality(String),
    device_model String,
    user_agent String,
    ip String,
    country LowCardinality(String),
    province LowCardinality(String),
    city LowCardinality(String),

    -- Metadata
    created_at DateTime DEFAULT now()
)
ENGINE = MergeTree()
PARTITION BY toYYYYMM(occurred_at)
ORDER BY (tenant_id, occurred_at, event_id)
TTL toDateTime(occurred_at) + INTERVAL 180 DAY
SETTINGS index_granularity = 8192
"#;

/// All DDL statements in creation order.
pub fn all_ddl() -> Vec<&'static str> {
    vec![CREATE_DATABASE, CREATE_EVENTS_TABLE]
}
