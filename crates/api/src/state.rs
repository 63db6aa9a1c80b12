//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use alerts::AlertEvaluator;
use async_trait::async_trait;
use moka::future::Cache;
use monitor_core::{Error, Result, Tenant, TenantDirectory, TenantStatus};
use pipeline::Ingestor;
use query_engine::QueryEngine;
use tracing::{debug, warn};

/// Cache TTL for tenant lookups (30 seconds).
const TENANT_CACHE_TTL: Duration = Duration::from_secs(30);

/// Maximum cached tenants.
const TENANT_CACHE_MAX_CAPACITY: u64 = 10_000;

/// Tenant directory client.
///
/// Calls the admin service's tenant endpoints and caches lookups for 30
/// seconds. An empty or "mock" base URL switches to mock mode, where any
/// app id resolves to an active tenant.
#[derive(Clone)]
pub struct HttpTenantDirectory {
    base_url: String,
    http_client: reqwest::Client,
    cache: Cache<String, Option<Tenant>>,
    mock_mode: bool,
}

impl HttpTenantDirectory {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        let mock_mode = base_url.is_empty() || base_url == "mock";

        Ok(Self {
            base_url,
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .map_err(|e| Error::internal(format!("HTTP client build failed: {}", e)))?,
            cache: Cache::builder()
                .max_capacity(TENANT_CACHE_MAX_CAPACITY)
                .time_to_live(TENANT_CACHE_TTL)
                .build(),
            mock_mode,
        })
    }

    async fn remote_get(&self, app_id: &str) -> Result<Option<Tenant>> {
        let url = format!("{}/internal/tenants/{}", self.base_url, app_id);
        debug!(url = %url, "Tenant directory lookup");

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            warn!(error = %e, "Tenant directory request failed");
            Error::directory_unavailable(format!("Directory unavailable: {}", e))
        })?;

        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::directory_unavailable(format!(
                "Directory returned {}",
                response.status()
            )));
        }

        let tenant: Tenant = response.json().await.map_err(|e| {
            Error::directory_unavailable(format!("Invalid directory response: {}", e))
        })?;
        Ok(Some(tenant))
    }

    fn mock_get(&self, app_id: &str) -> Option<Tenant> {
        debug!("Using mock tenant directory");
        Some(Tenant {
            app_id: app_id.to_string(),
            app_name: format!("mock-{}", app_id),
            status: TenantStatus::Active,
        })
    }
}

#[async_trait]
impl TenantDirectory for HttpTenantDirectory {
    async fn get_tenant(&self, app_id: &str) -> Result<Option<Tenant>> {
        if let Some(cached) = self.cache.get(app_id).await {
            debug!("Tenant cache hit");
            return Ok(cached);
        }

        let tenant = if self.mock_mode {
            self.mock_get(app_id)
        } else {
            self.remote_get(app_id).await?
        };

        self.cache.insert(app_id.to_string(), tenant.clone()).await;
        Ok(tenant)
    }

    async fn list_active_tenants(&self) -> Result<Vec<Tenant>> {
        if self.mock_mode {
            return Ok(self.mock_get("demo").into_iter().collect());
        }

        let url = format!("{}/internal/tenants?status=active", self.base_url);
        let response = self.http_client.get(&url).send().await.map_err(|e| {
            Error::directory_unavailable(format!("Directory unavailable: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(Error::directory_unavailable(format!(
                "Directory returned {}",
                response.status()
            )));
        }

        response.json().await.map_err(|e| {
            Error::directory_unavailable(format!("Invalid directory response: {}", e))
        })
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Ingestion pipeline
    pub ingestor: Arc<Ingestor>,
    /// Dashboard query engine
    pub engine: QueryEngine,
    /// Alert evaluator
    pub evaluator: Arc<AlertEvaluator>,
    /// Tenant directory (shared with the pipeline and evaluator)
    pub directory: Arc<dyn TenantDirectory>,
}

impl AppState {
    pub fn new(
        ingestor: Arc<Ingestor>,
        engine: QueryEngine,
        evaluator: Arc<AlertEvaluator>,
        directory: Arc<dyn TenantDirectory>,
    ) -> Self {
        Self {
            ingestor,
            engine,
            evaluator,
            directory,
        }
    }

    /// Resolve and gate a tenant: 404 for unknown, 403 for disabled.
    pub async fn require_active_tenant(&self, app_id: &str) -> Result<Tenant> {
        let tenant = self
            .directory
            .get_tenant(app_id)
            .await?
            .ok_or_else(|| Error::TenantNotFound(app_id.to_string()))?;
        if !tenant.is_active() {
            return Err(Error::TenantDisabled(app_id.to_string()));
        }
        Ok(tenant)
    }
}
