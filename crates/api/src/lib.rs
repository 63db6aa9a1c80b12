//! HTTP API for the monitoring engine.

pub mod extractors;
pub mod response;
pub mod routes;
pub mod state;

pub use response::{ApiError, Envelope};
pub use routes::router;
pub use state::{AppState, HttpTenantDirectory};
