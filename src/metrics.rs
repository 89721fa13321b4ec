//! Metrics collection for resolution and propagation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics collector for resolver and propagation operations.
///
/// Counters double as call-count instrumentation: tests assert on
/// `exact_store_hits` and `fuzzy_scans` to prove that repeat traffic is
/// served from the cache tiers.
#[derive(Debug, Clone, Default)]
pub struct ResolverMetrics {
    /// Total resolution attempts.
    pub resolutions: Arc<AtomicU64>,
    /// Positive-cache hits.
    pub cache_hits: Arc<AtomicU64>,
    /// Positive-cache misses.
    pub cache_misses: Arc<AtomicU64>,
    /// Negative-cache hits (scan skipped).
    pub negative_hits: Arc<AtomicU64>,
    /// Exact matches served by the durable store.
    pub exact_store_hits: Arc<AtomicU64>,
    /// Full fuzzy scans over the rule snapshot.
    pub fuzzy_scans: Arc<AtomicU64>,
    /// Fuzzy scans that produced a match.
    pub fuzzy_hits: Arc<AtomicU64>,
    /// Cache operations that failed and were degraded to misses.
    pub cache_failures: Arc<AtomicU64>,
    /// Durable-store operations that failed.
    pub store_failures: Arc<AtomicU64>,
    /// Principals whose sessions were successfully updated.
    pub propagation_successes: Arc<AtomicU64>,
    /// Principals whose session update failed.
    pub propagation_failures: Arc<AtomicU64>,
}

impl ResolverMetrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of a resolution.
    pub fn record_resolution(&self) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a positive-cache hit.
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a positive-cache miss.
    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a negative-cache hit.
    pub fn record_negative_hit(&self) {
        self.negative_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an exact match from the durable store.
    pub fn record_exact_store_hit(&self) {
        self.exact_store_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a full fuzzy scan, and whether it matched.
    pub fn record_fuzzy_scan(&self, matched: bool) {
        self.fuzzy_scans.fetch_add(1, Ordering::Relaxed);
        if matched {
            self.fuzzy_hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a degraded cache operation.
    pub fn record_cache_failure(&self) {
        self.cache_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed durable-store operation.
    pub fn record_store_failure(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one principal's propagation.
    pub fn record_propagation(&self, succeeded: u64, failed: u64) {
        self.propagation_successes
            .fetch_add(succeeded, Ordering::Relaxed);
        self.propagation_failures.fetch_add(failed, Ordering::Relaxed);
    }

    /// Positive-cache hit ratio over all cache lookups.
    pub fn cache_hit_ratio(&self) -> f64 {
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let misses = self.cache_misses.load(Ordering::Relaxed);
        let total = hits + misses;

        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Get a point-in-time summary.
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            resolutions: self.resolutions.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            cache_hit_ratio: self.cache_hit_ratio(),
            negative_hits: self.negative_hits.load(Ordering::Relaxed),
            exact_store_hits: self.exact_store_hits.load(Ordering::Relaxed),
            fuzzy_scans: self.fuzzy_scans.load(Ordering::Relaxed),
            fuzzy_hits: self.fuzzy_hits.load(Ordering::Relaxed),
            cache_failures: self.cache_failures.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            propagation_successes: self.propagation_successes.load(Ordering::Relaxed),
            propagation_failures: self.propagation_failures.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.resolutions.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
        self.negative_hits.store(0, Ordering::Relaxed);
        self.exact_store_hits.store(0, Ordering::Relaxed);
        self.fuzzy_scans.store(0, Ordering::Relaxed);
        self.fuzzy_hits.store(0, Ordering::Relaxed);
        self.cache_failures.store(0, Ordering::Relaxed);
        self.store_failures.store(0, Ordering::Relaxed);
        self.propagation_successes.store(0, Ordering::Relaxed);
        self.propagation_failures.store(0, Ordering::Relaxed);
    }
}

/// Summary of metrics.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricsSummary {
    pub resolutions: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_ratio: f64,
    pub negative_hits: u64,
    pub exact_store_hits: u64,
    pub fuzzy_scans: u64,
    pub fuzzy_hits: u64,
    pub cache_failures: u64,
    pub store_failures: u64,
    pub propagation_successes: u64,
    pub propagation_failures: u64,
}
