use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Request counters shared by every connection task.
#[derive(Debug, Clone, Default)]
pub struct ServerMetrics {
    avg_response_time: Arc<AtomicU64>, // In milliseconds
    total_requests: Arc<AtomicU64>,
    successful_requests: Arc<AtomicU64>,
    failed_requests: Arc<AtomicU64>,
}

/// Point-in-time copy of [`ServerMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub avg_response_time_ms: u64,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id assigned to the new request.
    pub fn begin_request(&self) -> u64 {
        self.total_requests.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_success(&self, elapsed_ms: u64) {
        self.successful_requests.fetch_add(1, Ordering::Relaxed);
        self.update_response_time(elapsed_ms);
    }

    pub fn record_failure(&self) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    fn update_response_time(&self, new_time: u64) {
        // Exponential moving average; the first sample seeds it.
        let _ = self
            .avg_response_time
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                if current == 0 {
                    Some(new_time)
                } else {
                    Some((current * 9 + new_time) / 10)
                }
            });
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            avg_response_time_ms: self.avg_response_time.load(Ordering::Relaxed),
        }
    }
}
