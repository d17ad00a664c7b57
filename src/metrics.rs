//! Metrics and observability for exif_info

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use serde::{Deserialize, Serialize};

/// Global metrics collector
pub struct Metrics {
    pub total_requests: AtomicU64,
    pub successful_requests: AtomicU64,
    pub failed_requests: AtomicU64,
    pub total_latency_ms: AtomicU64,

    // Per-operation counters
    pub batch_submit_count: AtomicU64,
    pub batch_tiles_count: AtomicU64,
    pub batch_inspect_count: AtomicU64,
    pub batch_status_count: AtomicU64,
    pub capabilities_count: AtomicU64,

    // Pipeline completions dropped by the batch generation guard
    pub stale_discards: AtomicU64,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_request(&self, op: &str, success: bool, latency_ms: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }

        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);

        // Increment operation-specific counter
        match op {
            "batch.submit" => self.batch_submit_count.fetch_add(1, Ordering::Relaxed),
            "batch.tiles" => self.batch_tiles_count.fetch_add(1, Ordering::Relaxed),
            "batch.inspect" => self.batch_inspect_count.fetch_add(1, Ordering::Relaxed),
            "batch.status" => self.batch_status_count.fetch_add(1, Ordering::Relaxed),
            "service.capabilities" => self.capabilities_count.fetch_add(1, Ordering::Relaxed),
            _ => 0,
        };
    }

    pub fn record_stale_discard(&self) {
        self.stale_discards.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let total = self.total_requests.load(Ordering::Relaxed);
        let successful = self.successful_requests.load(Ordering::Relaxed);
        let failed = self.failed_requests.load(Ordering::Relaxed);
        let total_latency = self.total_latency_ms.load(Ordering::Relaxed);

        MetricsSnapshot {
            total_requests: total,
            successful_requests: successful,
            failed_requests: failed,
            error_rate: if total > 0 { failed as f64 / total as f64 } else { 0.0 },
            avg_latency_ms: if total > 0 { total_latency / total } else { 0 },
            stale_discards: self.stale_discards.load(Ordering::Relaxed),
            operations: OperationMetrics {
                batch_submit: self.batch_submit_count.load(Ordering::Relaxed),
                batch_tiles: self.batch_tiles_count.load(Ordering::Relaxed),
                batch_inspect: self.batch_inspect_count.load(Ordering::Relaxed),
                batch_status: self.batch_status_count.load(Ordering::Relaxed),
                capabilities: self.capabilities_count.load(Ordering::Relaxed),
            },
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            successful_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            batch_submit_count: AtomicU64::new(0),
            batch_tiles_count: AtomicU64::new(0),
            batch_inspect_count: AtomicU64::new(0),
            batch_status_count: AtomicU64::new(0),
            capabilities_count: AtomicU64::new(0),
            stale_discards: AtomicU64::new(0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub error_rate: f64,
    pub avg_latency_ms: u64,
    pub stale_discards: u64,
    pub operations: OperationMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationMetrics {
    pub batch_submit: u64,
    pub batch_tiles: u64,
    pub batch_inspect: u64,
    pub batch_status: u64,
    pub capabilities: u64,
}

/// Timer for tracking operation latency
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
