//! Dashboard query engine.
//!
//! Turns raw aggregation rows from the event store into the response
//! shapes the dashboard consumes: zero-filled trends, ranked error lists,
//! rounded averages and percentage strings. Rounding happens here and only
//! here; the store returns full-precision values.

pub mod engine;
pub mod shapes;

pub use engine::{EngineConfig, QueryEngine};
pub use shapes::*;
