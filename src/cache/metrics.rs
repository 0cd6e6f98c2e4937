use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Tracks resolution counters and timings for models and fact sheets
#[derive(Debug, Default)]
pub struct AssetMetrics {
    load_times: RwLock<HashMap<String, Duration>>,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    origin_fetches: AtomicU64,
    origin_cache_hits: AtomicU64,
    stale_evictions: AtomicU64,
    fact_fetches: AtomicU64,
    fact_fallbacks: AtomicU64,
    total_memory: AtomicU64,
}

impl AssetMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record how long a full resolution took
    pub fn record_load_time(&self, identifier: String, duration: Duration) {
        self.load_times.write().insert(identifier, duration);
    }

    /// Record a memoized (in-session) hit
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_origin_fetch(&self) {
        self.origin_fetches.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a payload served from the persistent origin cache
    pub fn record_origin_cache_hit(&self) {
        self.origin_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_eviction(&self) {
        self.stale_evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fact_fetch(&self) {
        self.fact_fetches.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a fact sheet served from the local store after a remote failure
    pub fn record_fact_fallback(&self) {
        self.fact_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_memory_usage(&self, bytes: usize) {
        self.total_memory.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Get the memo hit rate as a percentage
    pub fn cache_hit_rate(&self) -> f32 {
        let hits = self.cache_hits.load(Ordering::Relaxed) as f32;
        let misses = self.cache_misses.load(Ordering::Relaxed) as f32;

        if hits + misses > 0.0 {
            hits / (hits + misses) * 100.0
        } else {
            0.0
        }
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn origin_fetches(&self) -> u64 {
        self.origin_fetches.load(Ordering::Relaxed)
    }

    pub fn origin_cache_hits(&self) -> u64 {
        self.origin_cache_hits.load(Ordering::Relaxed)
    }

    pub fn stale_evictions(&self) -> u64 {
        self.stale_evictions.load(Ordering::Relaxed)
    }

    pub fn fact_fetches(&self) -> u64 {
        self.fact_fetches.load(Ordering::Relaxed)
    }

    pub fn fact_fallbacks(&self) -> u64 {
        self.fact_fallbacks.load(Ordering::Relaxed)
    }

    /// Get the total memory used by parsed scenes in bytes
    pub fn total_memory_usage(&self) -> u64 {
        self.total_memory.load(Ordering::Relaxed)
    }

    pub fn load_time(&self, identifier: &str) -> Option<Duration> {
        self.load_times.read().get(identifier).cloned()
    }
}

/// A thread-safe wrapper around AssetMetrics
#[derive(Debug, Clone, Default)]
pub struct AssetMetricsHandle(Arc<AssetMetrics>);

impl AssetMetricsHandle {
    pub fn new() -> Self {
        Self(Arc::new(AssetMetrics::new()))
    }
}

impl std::ops::Deref for AssetMetricsHandle {
    type Target = AssetMetrics;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let metrics = AssetMetricsHandle::new();
        assert_eq!(metrics.cache_hit_rate(), 0.0);

        metrics.record_cache_miss();
        metrics.record_cache_hit();
        assert_eq!(metrics.cache_hit_rate(), 50.0);
    }

    #[test]
    fn test_handles_share_counters() {
        let metrics = AssetMetricsHandle::new();
        let other = metrics.clone();
        other.record_origin_fetch();
        other.record_fact_fetch();
        other.record_load_time("a-1".into(), Duration::from_millis(5));

        assert_eq!(metrics.origin_fetches(), 1);
        assert_eq!(metrics.fact_fetches(), 1);
        assert_eq!(metrics.load_time("a-1"), Some(Duration::from_millis(5)));
    }
}
