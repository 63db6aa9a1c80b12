//! Mock implementations for testing.
//!
//! Each mock implements the same seam trait as its production counterpart,
//! so tests run the real router, pipeline, engine and evaluator with only
//! the external collaborators replaced.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use alerts::{AlertEvent, NotificationSink};
use event_store::{
    AggSource, EventWriter, GeoLevel, GeoRow, HttpErrorGroupRow, HttpTotalsRow, JsErrorGroupRow,
    JsTotalsRow, PagePerfRow, PageTermsRow, PerfAvgRow, TermsColumn, TermsRow, TrafficTotalsRow,
    TrendRow,
};
use monitor_core::{
    Error, EventRecord, Result, Tenant, TenantDirectory, TenantStatus, TimeWindow,
};

/// In-memory tenant directory.
pub struct MockDirectory {
    tenants: Mutex<HashMap<String, Tenant>>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self {
            tenants: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_active(app_id: &str) -> Self {
        let dir = Self::new();
        dir.add(app_id, TenantStatus::Active);
        dir
    }

    pub fn add(&self, app_id: &str, status: TenantStatus) {
        self.tenants.lock().insert(
            app_id.to_string(),
            Tenant {
                app_id: app_id.to_string(),
                app_name: format!("test-{}", app_id),
                status,
            },
        );
    }
}

impl Default for MockDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TenantDirectory for MockDirectory {
    async fn get_tenant(&self, app_id: &str) -> Result<Option<Tenant>> {
        Ok(self.tenants.lock().get(app_id).cloned())
    }

    async fn list_active_tenants(&self) -> Result<Vec<Tenant>> {
        let mut tenants: Vec<Tenant> = self
            .tenants
            .lock()
            .values()
            .filter(|t| t.is_active())
            .cloned()
            .collect();
        tenants.sort_by(|a, b| a.app_id.cmp(&b.app_id));
        Ok(tenants)
    }
}

/// Event writer that captures records in memory.
#[derive(Default)]
pub struct MockWriter {
    records: Mutex<Vec<EventRecord>>,
    should_fail: Mutex<bool>,
}

impl MockWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn captured(&self) -> Vec<EventRecord> {
        self.records.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.records.lock().len()
    }

    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }
}

#[async_trait]
impl EventWriter for MockWriter {
    async fn write_events(&self, events: Vec<EventRecord>) -> Result<usize> {
        if *self.should_fail.lock() {
            return Err(Error::store_unavailable("mock writer failure"));
        }
        let count = events.len();
        self.records.lock().extend(events);
        Ok(count)
    }
}

/// Scripted aggregation rows keyed by tenant.
#[derive(Default)]
struct ScriptedRows {
    traffic: TrafficTotalsRow,
    trend: Vec<TrendRow>,
    perf: PerfAvgRow,
    perf_pages: Vec<PagePerfRow>,
    http: HttpTotalsRow,
    http_groups: Vec<HttpErrorGroupRow>,
    js: JsTotalsRow,
    js_groups: Vec<JsErrorGroupRow>,
    page_terms: Vec<PageTermsRow>,
    terms: Vec<TermsRow>,
    geo: Vec<GeoRow>,
}

/// Aggregation source backed by scripted per-tenant rows.
///
/// Unscripted tenants read as empty windows. The failure toggle makes
/// every read return a store error, for fail-open and fail-closed tests.
#[derive(Default)]
pub struct MockAggSource {
    rows: Mutex<HashMap<String, ScriptedRows>>,
    should_fail: Mutex<bool>,
}

impl MockAggSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }

    pub fn set_traffic(&self, tenant: &str, row: TrafficTotalsRow) {
        self.rows.lock().entry(tenant.to_string()).or_default().traffic = row;
    }

    pub fn set_trend(&self, tenant: &str, rows: Vec<TrendRow>) {
        self.rows.lock().entry(tenant.to_string()).or_default().trend = rows;
    }

    pub fn set_perf(&self, tenant: &str, row: PerfAvgRow) {
        self.rows.lock().entry(tenant.to_string()).or_default().perf = row;
    }

    pub fn set_perf_pages(&self, tenant: &str, rows: Vec<PagePerfRow>) {
        self.rows.lock().entry(tenant.to_string()).or_default().perf_pages = rows;
    }

    pub fn set_http(&self, tenant: &str, row: HttpTotalsRow) {
        self.rows.lock().entry(tenant.to_string()).or_default().http = row;
    }

    pub fn set_http_groups(&self, tenant: &str, rows: Vec<HttpErrorGroupRow>) {
        self.rows.lock().entry(tenant.to_string()).or_default().http_groups = rows;
    }

    pub fn set_js(&self, tenant: &str, row: JsTotalsRow) {
        self.rows.lock().entry(tenant.to_string()).or_default().js = row;
    }

    pub fn set_js_groups(&self, tenant: &str, rows: Vec<JsErrorGroupRow>) {
        self.rows.lock().entry(tenant.to_string()).or_default().js_groups = rows;
    }

    pub fn set_page_terms(&self, tenant: &str, rows: Vec<PageTermsRow>) {
        self.rows.lock().entry(tenant.to_string()).or_default().page_terms = rows;
    }

    pub fn set_terms(&self, tenant: &str, rows: Vec<TermsRow>) {
        self.rows.lock().entry(tenant.to_string()).or_default().terms = rows;
    }

    pub fn set_geo(&self, tenant: &str, rows: Vec<GeoRow>) {
        self.rows.lock().entry(tenant.to_string()).or_default().geo = rows;
    }

    fn read<T>(&self, tenant: &str, f: impl FnOnce(&ScriptedRows) -> T) -> Result<T>
    where
        T: Default,
    {
        if *self.should_fail.lock() {
            return Err(Error::store_unavailable("mock aggregation failure"));
        }
        Ok(self.rows.lock().get(tenant).map(f).unwrap_or_default())
    }
}

#[async_trait]
impl AggSource for MockAggSource {
    async fn traffic_totals(&self, tenant_id: &str, _: TimeWindow) -> Result<TrafficTotalsRow> {
        self.read(tenant_id, |r| r.traffic)
    }

    async fn trend_buckets(
        &self,
        tenant_id: &str,
        _: TimeWindow,
        _: i64,
        _: i64,
    ) -> Result<Vec<TrendRow>> {
        self.read(tenant_id, |r| r.trend.clone())
    }

    async fn perf_averages(&self, tenant_id: &str, _: TimeWindow) -> Result<PerfAvgRow> {
        self.read(tenant_id, |r| r.perf)
    }

    async fn perf_by_page(
        &self,
        tenant_id: &str,
        _: TimeWindow,
        _: u32,
    ) -> Result<Vec<PagePerfRow>> {
        self.read(tenant_id, |r| r.perf_pages.clone())
    }

    async fn http_totals(&self, tenant_id: &str, _: TimeWindow) -> Result<HttpTotalsRow> {
        self.read(tenant_id, |r| r.http)
    }

    async fn http_error_groups(
        &self,
        tenant_id: &str,
        _: TimeWindow,
        _: u32,
    ) -> Result<Vec<HttpErrorGroupRow>> {
        self.read(tenant_id, |r| r.http_groups.clone())
    }

    async fn js_error_totals(&self, tenant_id: &str, _: TimeWindow) -> Result<JsTotalsRow> {
        self.read(tenant_id, |r| r.js)
    }

    async fn js_error_groups(
        &self,
        tenant_id: &str,
        _: TimeWindow,
        _: u32,
    ) -> Result<Vec<JsErrorGroupRow>> {
        self.read(tenant_id, |r| r.js_groups.clone())
    }

    async fn page_terms(
        &self,
        tenant_id: &str,
        _: TimeWindow,
        _: u32,
    ) -> Result<Vec<PageTermsRow>> {
        self.read(tenant_id, |r| r.page_terms.clone())
    }

    async fn top_terms(
        &self,
        tenant_id: &str,
        _: TimeWindow,
        _: TermsColumn,
        _: u32,
    ) -> Result<Vec<TermsRow>> {
        self.read(tenant_id, |r| r.terms.clone())
    }

    async fn geo_terms(
        &self,
        tenant_id: &str,
        _: TimeWindow,
        _: GeoLevel,
        _: u32,
    ) -> Result<Vec<GeoRow>> {
        self.read(tenant_id, |r| r.geo.clone())
    }
}

/// Notification sink that captures alert events in memory.
#[derive(Default)]
pub struct MockSink {
    events: Mutex<Vec<AlertEvent>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn captured(&self) -> Vec<AlertEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().len()
    }
}

#[async_trait]
impl NotificationSink for MockSink {
    async fn notify(&self, event: &AlertEvent) -> Result<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// Convenience: the mocks are always shared behind Arc.
pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
