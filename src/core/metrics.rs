//! Appender metrics for observability
//!
//! Counters for records handed to the producer and their eventual outcome.

use std::sync::atomic::{AtomicU64, Ordering};

/// Delivery counters for a single appender
///
/// # Example
///
/// ```
/// use kafka_log_appender::AppenderMetrics;
///
/// let metrics = AppenderMetrics::new();
/// metrics.record_submitted();
/// metrics.record_failed();
///
/// assert_eq!(metrics.submitted(), 1);
/// assert_eq!(metrics.pending(), 0);
/// ```
#[derive(Debug)]
pub struct AppenderMetrics {
    /// Records accepted by the producer queue
    submitted: AtomicU64,

    /// Records acknowledged by the broker
    delivered: AtomicU64,

    /// Records whose delivery report carried an error
    failed: AtomicU64,

    /// Records refused before they reached the producer queue
    rejected: AtomicU64,
}

impl AppenderMetrics {
    pub const fn new() -> Self {
        Self {
            submitted: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Records submitted whose delivery report has not arrived yet
    pub fn pending(&self) -> u64 {
        self.submitted()
            .saturating_sub(self.delivered() + self.failed())
    }

    #[inline]
    pub fn record_submitted(&self) -> u64 {
        self.submitted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_delivered(&self) -> u64 {
        self.delivered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_failed(&self) -> u64 {
        self.failed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_rejected(&self) -> u64 {
        self.rejected.fetch_add(1, Ordering::Relaxed)
    }

    /// Failed deliveries as a percentage of completed ones
    pub fn failure_rate(&self) -> f64 {
        let failed = self.failed();
        let completed = failed + self.delivered();
        if completed == 0 {
            0.0
        } else {
            (failed as f64 / completed as f64) * 100.0
        }
    }
}

impl Default for AppenderMetrics {
    fn default() -> Self {
        Self::new()
    }
}
