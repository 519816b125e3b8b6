//! Search attempt counters.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Point-in-time view of attempt counters. Counts never decrease over the
/// lifetime of one manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Provider searches attempted.
    pub total_searches: u64,
    /// Attempts that returned results (possibly empty).
    pub successful_searches: u64,
    /// Attempts that returned an error, timed out or panicked.
    pub failed_searches: u64,
}

impl MetricsSnapshot {
    /// Fraction of attempts that succeeded, `0.0` before any attempt.
    pub fn success_rate(&self) -> f64 {
        if self.total_searches == 0 {
            return 0.0;
        }
        self.successful_searches as f64 / self.total_searches as f64
    }
}

/// Shared counters, updated as each attempt completes.
#[derive(Debug, Default)]
pub(crate) struct Metrics {
    inner: Mutex<MetricsSnapshot>,
}

impl Metrics {
    pub(crate) fn record(&self, success: bool) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.total_searches += 1;
        if success {
            inner.successful_searches += 1;
        } else {
            inner.failed_searches += 1;
        }
    }

    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_accumulate() {
        let metrics = Metrics::default();
        metrics.record(true);
        metrics.record(false);
        metrics.record(true);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_searches, 3);
        assert_eq!(snapshot.successful_searches, 2);
        assert_eq!(snapshot.failed_searches, 1);
        assert!((snapshot.success_rate() - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn success_rate_without_attempts_is_zero() {
        assert_eq!(MetricsSnapshot::default().success_rate(), 0.0);
    }

    #[test]
    fn snapshot_serializes() {
        let snapshot = MetricsSnapshot {
            total_searches: 2,
            successful_searches: 1,
            failed_searches: 1,
        };
        let json = serde_json::to_value(snapshot).expect("serialize");
        assert_eq!(json["total_searches"], 2);
        assert_eq!(json["failed_searches"], 1);
    }
}
