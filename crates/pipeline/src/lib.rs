//! Ingestion pipeline.
//!
//! Gate on tenant, validate the batch, enrich every event, persist in one
//! bulk write. Gating and persistence are fail-closed; enrichment never
//! fails, it degrades to the unknown marker.

pub mod geo;
pub mod ingest;
pub mod ua;

pub use geo::{GeoLocation, GeoLocator, StaticGeoLocator};
pub use ingest::{ClientContext, Ingestor};
pub use ua::UaEnricher;
