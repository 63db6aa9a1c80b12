//! Aggregation windows and time bucketing.
//!
//! A window is a half-open range `[start, end)` in epoch milliseconds.
//! Bucket boundaries are aligned to a configurable UTC offset so that
//! day buckets roll over at local midnight; the same arithmetic runs in
//! SQL and in the zero-fill, so bucket keys always line up.

use chrono::Utc;
use serde::{Deserialize, Serialize};

pub const MILLIS_PER_HOUR: i64 = 3_600_000;
pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Bucket granularity for trend shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    Day,
}

impl Granularity {
    /// Bucket width in milliseconds.
    pub fn bucket_ms(&self) -> i64 {
        match self {
            Self::Hour => MILLIS_PER_HOUR,
            Self::Day => MILLIS_PER_DAY,
        }
    }

    /// Default lookback when the caller omits a range: 24 hours of hourly
    /// buckets, 7 days of daily buckets.
    pub fn default_lookback_ms(&self) -> i64 {
        match self {
            Self::Hour => 24 * MILLIS_PER_HOUR,
            Self::Day => 7 * MILLIS_PER_DAY,
        }
    }
}

/// A half-open query window `[start_ms, end_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeWindow {
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self { start_ms, end_ms }
    }

    /// Trailing window of `duration_ms` ending now (alert evaluation).
    pub fn trailing(duration_ms: i64) -> Self {
        let end = Utc::now().timestamp_millis();
        Self {
            start_ms: end - duration_ms,
            end_ms: end,
        }
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    pub fn is_empty(&self) -> bool {
        self.end_ms <= self.start_ms
    }
}

/// Floor `ts` to the start of its bucket, aligned to `offset_ms`.
pub fn floor_bucket(ts: i64, bucket_ms: i64, offset_ms: i64) -> i64 {
    (ts + offset_ms).div_euclid(bucket_ms) * bucket_ms - offset_ms
}

/// Bucket starts covering the window, from `floor(start)` up to (but not
/// including) `end`. Zero-fill basis: every returned start must appear in a
/// trend response even when the store has no rows for it.
pub fn bucket_starts(window: TimeWindow, bucket_ms: i64, offset_ms: i64) -> Vec<i64> {
    if window.is_empty() || bucket_ms <= 0 {
        return Vec::new();
    }
    let mut starts = Vec::new();
    let mut cursor = floor_bucket(window.start_ms, bucket_ms, offset_ms);
    while cursor < window.end_ms {
        starts.push(cursor);
        cursor += bucket_ms;
    }
    starts
}
