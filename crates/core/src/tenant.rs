//! Tenant types and the tenant-directory collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tenant lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    Active,
    Disabled,
}

/// A registered monitored application, the unit of data isolation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    /// Stable tenant identifier (the SDK's appId)
    pub app_id: String,
    /// Display name
    pub app_name: String,
    pub status: TenantStatus,
}

impl Tenant {
    pub fn is_active(&self) -> bool {
        self.status == TenantStatus::Active
    }
}

/// Tenant directory collaborator.
///
/// Owned by an external service; the engine only reads identity and status
/// through this trait. Tests substitute an in-memory implementation.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Look up a tenant by app id. `Ok(None)` means unknown.
    async fn get_tenant(&self, app_id: &str) -> Result<Option<Tenant>>;

    /// List every active tenant (bulk alert evaluation).
    async fn list_active_tenants(&self) -> Result<Vec<Tenant>>;
}
