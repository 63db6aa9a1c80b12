//! ClickHouse-backed event store.
//!
//! One wide `monitor.events` table holds every event kind; payload columns
//! not used by a kind stay at their defaults. The [`EventWriter`] and
//! [`AggSource`] traits are the seams the ingestion pipeline and the query
//! engine talk through; tests substitute in-memory implementations.

pub mod agg;
pub mod client;
pub mod config;
pub mod health;
pub mod insert;
pub mod schema;

pub use agg::{
    AggSource, GeoLevel, GeoRow, HttpErrorGroupRow, HttpTotalsRow, JsErrorGroupRow, JsTotalsRow,
    PagePerfRow, PageTermsRow, PerfAvgRow, TermsColumn, TermsRow, TrafficTotalsRow, TrendRow,
};
pub use client::StoreClient;
pub use config::StoreConfig;
pub use insert::{EventRow, EventWriter};
