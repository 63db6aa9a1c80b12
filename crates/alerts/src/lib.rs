//! Threshold alerting.
//!
//! Three checks per tenant over a trailing window: request error rate,
//! page performance, JS error volume. Checks read through the same
//! aggregation source as the dashboard but never fail open; a store
//! failure is a recorded check failure, not a zero reading.

pub mod evaluator;
pub mod scheduler;
pub mod sink;

pub use evaluator::{AlertConfig, AlertEvaluator, BulkCheckSummary, TenantCheckReport};
pub use scheduler::AlertScheduler;
pub use sink::{AlertEvent, AlertKind, LogSink, NotificationSink, Severity, WebhookSink};
