//! IP geolocation.
//!
//! The engine does not ship a geo database. [`StaticGeoLocator`] resolves
//! private/loopback addresses to a configured location (useful for intranet
//! deployments) and everything else to the unknown marker; deployments with
//! a real geo backend plug in their own [`GeoLocator`].

use std::net::IpAddr;

use async_trait::async_trait;
use monitor_core::UNKNOWN;
use serde::{Deserialize, Serialize};

/// Resolved location for one IP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoLocation {
    pub country: String,
    pub province: String,
    pub city: String,
}

impl GeoLocation {
    pub fn unknown() -> Self {
        Self {
            country: UNKNOWN.to_string(),
            province: UNKNOWN.to_string(),
            city: UNKNOWN.to_string(),
        }
    }
}

impl Default for GeoLocation {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Geolocation collaborator. Lookups never fail; misses resolve to the
/// unknown marker.
#[async_trait]
pub trait GeoLocator: Send + Sync {
    async fn locate(&self, ip: &str) -> GeoLocation;
}

/// True for addresses that can never appear in a public geo database.
fn is_internal(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => {
            v4.is_loopback() || v4.is_private() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            // fc00::/7 unique-local
            v6.is_loopback() || v6.is_unspecified() || (v6.segments()[0] & 0xfe00) == 0xfc00
        }
    }
}

/// Database-free locator: internal addresses map to a fixed location,
/// public addresses to unknown.
pub struct StaticGeoLocator {
    internal_location: GeoLocation,
}

impl StaticGeoLocator {
    pub fn new(internal_location: GeoLocation) -> Self {
        Self { internal_location }
    }
}

impl Default for StaticGeoLocator {
    fn default() -> Self {
        Self::new(GeoLocation {
            country: "Internal".to_string(),
            province: "Internal".to_string(),
            city: "Internal".to_string(),
        })
    }
}

#[async_trait]
impl GeoLocator for StaticGeoLocator {
    async fn locate(&self, ip: &str) -> GeoLocation {
        match ip.parse::<IpAddr>() {
            Ok(addr) if is_internal(addr) => self.internal_location.clone(),
            _ => GeoLocation::unknown(),
        }
    }
}
