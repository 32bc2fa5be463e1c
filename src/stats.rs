//! Statistics tracking for the resolver.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for query outcomes, one per resolution path.
pub struct Stats {
    requests: AtomicU64,
    sinkholed: AtomicU64,
    cache_hits: AtomicU64,
    authoritative: AtomicU64,
    recursive: AtomicU64,
    failed: AtomicU64,
    /// Cumulative handling time in microseconds, for averaging.
    total_handle_time_us: AtomicU64,
}

impl Stats {
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            sinkholed: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            authoritative: AtomicU64::new(0),
            recursive: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            total_handle_time_us: AtomicU64::new(0),
        }
    }

    pub fn record_sinkholed(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.sinkholed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_authoritative(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.authoritative.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_recursive(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.recursive.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_handle_time(&self, elapsed_ms: f64) {
        self.total_handle_time_us
            .fetch_add((elapsed_ms * 1000.0) as u64, Ordering::Relaxed);
    }

    pub fn snapshot_and_reset(&self) -> StatsSnapshot {
        let requests = self.requests.swap(0, Ordering::Relaxed);
        let total_us = self.total_handle_time_us.swap(0, Ordering::Relaxed);

        let avg_handle_ms = if requests > 0 {
            (total_us as f64 / requests as f64) / 1000.0
        } else {
            0.0
        };

        StatsSnapshot {
            requests,
            sinkholed: self.sinkholed.swap(0, Ordering::Relaxed),
            cache_hits: self.cache_hits.swap(0, Ordering::Relaxed),
            authoritative: self.authoritative.swap(0, Ordering::Relaxed),
            recursive: self.recursive.swap(0, Ordering::Relaxed),
            failed: self.failed.swap(0, Ordering::Relaxed),
            avg_handle_ms,
        }
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

pub struct StatsSnapshot {
    pub requests: u64,
    pub sinkholed: u64,
    pub cache_hits: u64,
    pub authoritative: u64,
    pub recursive: u64,
    pub failed: u64,
    pub avg_handle_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_resets_counters() {
        let stats = Stats::new();
        stats.record_sinkholed();
        stats.record_cache_hit();
        stats.record_cache_hit();
        stats.record_handle_time(1.5);

        let snapshot = stats.snapshot_and_reset();
        assert_eq!(snapshot.requests, 3);
        assert_eq!(snapshot.sinkholed, 1);
        assert_eq!(snapshot.cache_hits, 2);
        assert!(snapshot.avg_handle_ms > 0.0);

        let empty = stats.snapshot_and_reset();
        assert_eq!(empty.requests, 0);
        assert_eq!(empty.avg_handle_ms, 0.0);
    }
}
