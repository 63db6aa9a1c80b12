//! Internal telemetry for the monitoring engine.
//!
//! In-process counters and health state, exposed over the admin surface.
//! No external metrics backend; the snapshot endpoint is the export.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
