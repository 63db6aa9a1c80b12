//! Internal metrics collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) -> u64 {
        self.0.swap(0, Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(&self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, 10s
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000, 10000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        for (i, &bound) in Self::BUCKET_BOUNDS.iter().enumerate() {
            if ms <= bound {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        // Value exceeds all buckets, add to last
        self.buckets[10].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns bucket counts.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for the monitoring engine.
#[derive(Debug, Default)]
pub struct Metrics {
    // Ingestion
    pub batches_received: Counter,
    pub events_received: Counter,
    pub events_rejected: Counter,
    pub events_stored: Counter,

    // Event store
    pub store_inserts: Counter,
    pub store_insert_errors: Counter,

    // Aggregation queries
    pub agg_queries: Counter,
    pub agg_query_errors: Counter,

    // Alert evaluation
    pub alert_checks_run: Counter,
    pub alert_check_failures: Counter,
    pub alerts_raised: Counter,
    pub notifications_sent: Counter,
    pub notification_errors: Counter,

    // Latency histograms
    pub ingest_latency_ms: Histogram,
    pub store_insert_latency_ms: Histogram,
    pub query_latency_ms: Histogram,
    pub alert_check_latency_ms: Histogram,

    // Gauges
    pub active_tenants: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub batches_received: u64,
    pub events_received: u64,
    pub events_rejected: u64,
    pub events_stored: u64,
    pub store_inserts: u64,
    pub store_insert_errors: u64,
    pub agg_queries: u64,
    pub agg_query_errors: u64,
    pub alert_checks_run: u64,
    pub alert_check_failures: u64,
    pub alerts_raised: u64,
    pub notifications_sent: u64,
    pub notification_errors: u64,
    pub ingest_latency_mean_ms: f64,
    pub store_insert_latency_mean_ms: f64,
    pub query_latency_mean_ms: f64,
    pub alert_check_latency_mean_ms: f64,
    pub active_tenants: u64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            batches_received: self.batches_received.get(),
            events_received: self.events_received.get(),
            events_rejected: self.events_rejected.get(),
            events_stored: self.events_stored.get(),
            store_inserts: self.store_inserts.get(),
            store_insert_errors: self.store_insert_errors.get(),
            agg_queries: self.agg_queries.get(),
            agg_query_errors: self.agg_query_errors.get(),
            alert_checks_run: self.alert_checks_run.get(),
            alert_check_failures: self.alert_check_failures.get(),
            alerts_raised: self.alerts_raised.get(),
            notifications_sent: self.notifications_sent.get(),
            notification_errors: self.notification_errors.get(),
            ingest_latency_mean_ms: self.ingest_latency_ms.mean(),
            store_insert_latency_mean_ms: self.store_insert_latency_ms.mean(),
            query_latency_mean_ms: self.query_latency_ms.mean(),
            alert_check_latency_mean_ms: self.alert_check_latency_ms.mean(),
            active_tenants: self.active_tenants.get(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
