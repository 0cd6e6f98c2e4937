//! Two-tier model cache
//!
//! Identifiers resolve to a fact sheet plus a parsed scene graph. Parsed
//! results are memoized for the session; raw payloads live in a persistent
//! origin cache that never holds two versions of the same logical name.

pub mod metrics;
pub mod origin;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use crate::catalog::{logical_name, ModelId};
use crate::error::Result;
use crate::facts::{FactProvider, FactSheet};
use crate::loader::{decompress, parse_scene};
use crate::model::SceneGraph;
use crate::net::OriginFetcher;
use metrics::AssetMetricsHandle;
pub use origin::{MemoryOriginCache, OriginCache};
#[cfg(feature = "runtime-tokio")]
pub use origin::DiskOriginCache;

/// A fully resolved model: its fact sheet and parsed scene
#[derive(Debug, Clone)]
pub struct ResolvedModel {
    pub id: ModelId,
    pub facts: Arc<FactSheet>,
    pub scene: SceneGraph,
}

/// Resolves model identifiers with session memoization
#[derive(Debug)]
pub struct AssetCache {
    fetcher: Arc<dyn OriginFetcher>,
    origin: Arc<dyn OriginCache>,
    facts: FactProvider,
    resolved: RwLock<HashMap<String, Arc<ResolvedModel>>>,
    /// Performance metrics for resolution and caching
    metrics: AssetMetricsHandle,
}

impl AssetCache {
    pub fn new(
        fetcher: Arc<dyn OriginFetcher>,
        origin: Arc<dyn OriginCache>,
        facts: FactProvider,
    ) -> Self {
        let metrics = AssetMetricsHandle::new();
        Self {
            fetcher,
            origin,
            facts: facts.with_metrics(metrics.clone()),
            resolved: RwLock::new(HashMap::new()),
            metrics,
        }
    }

    /// Get the performance metrics for this cache
    pub fn metrics(&self) -> &AssetMetricsHandle {
        &self.metrics
    }

    pub fn facts(&self) -> &FactProvider {
        &self.facts
    }

    pub fn origin(&self) -> &Arc<dyn OriginCache> {
        &self.origin
    }

    /// Whether `id` has already been resolved this session
    pub fn is_resolved(&self, id: &ModelId) -> bool {
        self.resolved.read().contains_key(id.as_str())
    }

    /// Resolve `id` to its fact sheet and scene graph
    ///
    /// Fact resolution and payload acquisition run concurrently; either
    /// failing fails the whole resolution.
    pub async fn resolve(&self, id: &ModelId) -> Result<Arc<ResolvedModel>> {
        if let Some(model) = self.resolved.read().get(id.as_str()) {
            self.metrics.record_cache_hit();
            return Ok(Arc::clone(model));
        }
        self.metrics.record_cache_miss();

        let start_time = Instant::now();
        let name = id.logical_name();
        let (facts, payload) =
            futures::try_join!(self.facts.resolve(id, name), self.acquire_payload(id))?;

        let bytes = decompress(payload).await?;
        let scene = parse_scene(bytes).await?;

        self.metrics
            .record_load_time(id.to_string(), start_time.elapsed());
        self.metrics.record_memory_usage(scene.estimated_size());

        let model = Arc::new(ResolvedModel {
            id: id.clone(),
            facts,
            scene,
        });
        self.resolved
            .write()
            .insert(id.as_str().to_string(), Arc::clone(&model));
        Ok(model)
    }

    /// Compressed payload for `id`, from the origin cache or the network
    async fn acquire_payload(&self, id: &ModelId) -> Result<Vec<u8>> {
        match self.origin.match_entry(id.as_str()).await {
            Ok(Some(payload)) => {
                self.metrics.record_origin_cache_hit();
                return Ok(payload);
            }
            Ok(None) => {}
            Err(e) => log::warn!("Origin cache lookup for {id} failed: {e}"),
        }

        self.evict_stale(id).await;

        self.metrics.record_origin_fetch();
        let payload = self.fetcher.fetch(id.as_str()).await?;

        if let Err(e) = self.origin.put(id.as_str(), &payload).await {
            log::warn!("Failed to store {id} in {}: {e}", self.origin.name());
        }
        Ok(payload)
    }

    /// Delete every cached version of `id`'s logical name other than `id`
    ///
    /// Each delete completes before this returns. Failures are logged only.
    async fn evict_stale(&self, id: &ModelId) {
        let keys = match self.origin.keys().await {
            Ok(keys) => keys,
            Err(e) => {
                log::warn!("Could not list {}: {e}", self.origin.name());
                return;
            }
        };

        let name = id.logical_name();
        for key in keys {
            if key == id.as_str() || logical_name(&key) != name {
                continue;
            }
            match self.origin.delete(&key).await {
                Ok(true) => {
                    self.metrics.record_stale_eviction();
                    log::info!("Evicted stale cache entry {key} (superseded by {id})");
                }
                Ok(false) => log::debug!("Stale entry {key} was already gone"),
                Err(e) => log::warn!("Failed to evict {key}: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{FactStore, MemoryStore, MockEncyclopedia, PageSummary};
    use crate::fixtures::{glb_with_nodes, gzip, ROVER_PAGE};
    use crate::net::MockFetcher;
    use crate::ViewerError;
    use futures::executor::block_on;

    const OLD_ID: &str = "static/models/perseverance-0a1b.glb.gz";
    const NEW_ID: &str = "static/models/perseverance-9f8e.glb.gz";

    struct Harness {
        cache: AssetCache,
        fetcher: MockFetcher,
        origin: MemoryOriginCache,
        source: MockEncyclopedia,
    }

    fn harness() -> Harness {
        let fetcher = MockFetcher::new();
        let origin = MemoryOriginCache::default();
        let source = MockEncyclopedia::new();
        source.serve(
            "Perseverance_(rover)",
            ROVER_PAGE,
            PageSummary {
                title: "Perseverance (rover)".into(),
                extract: "Rover.".into(),
            },
        );
        let store = FactStore::new(Arc::new(MemoryStore::new()), "wikis");
        let facts = FactProvider::new(Arc::new(source.clone()), store).unwrap();
        let cache = AssetCache::new(Arc::new(fetcher.clone()), Arc::new(origin.clone()), facts);
        Harness {
            cache,
            fetcher,
            origin,
            source,
        }
    }

    fn rover_payload() -> Vec<u8> {
        gzip(&glb_with_nodes("rover", &["Wheels-F_R"]))
    }

    #[test]
    fn test_second_resolve_is_memoized() {
        let h = harness();
        h.fetcher.serve(NEW_ID, rover_payload());
        let id = ModelId::new(NEW_ID).unwrap();

        let first = block_on(h.cache.resolve(&id)).unwrap();
        let second = block_on(h.cache.resolve(&id)).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(h.fetcher.request_count(NEW_ID), 1);
        assert_eq!(h.source.total_requests(), 1);
        assert_eq!(h.cache.metrics().cache_hits(), 1);
        assert!(first.scene.find_by_name("Wheels-F_R").is_some());
    }

    #[test]
    fn test_origin_cache_hit_skips_network() {
        let h = harness();
        block_on(h.origin.put(NEW_ID, &rover_payload())).unwrap();
        let id = ModelId::new(NEW_ID).unwrap();

        block_on(h.cache.resolve(&id)).unwrap();
        assert_eq!(h.fetcher.total_requests(), 0);
        assert_eq!(h.cache.metrics().origin_cache_hits(), 1);
    }

    #[test]
    fn test_stale_version_evicted() {
        let h = harness();
        block_on(h.origin.put(OLD_ID, b"old")).unwrap();
        block_on(h.origin.put("static/models/ingenuity-77.glb.gz", b"other")).unwrap();
        h.fetcher.serve(NEW_ID, rover_payload());

        block_on(h.cache.resolve(&ModelId::new(NEW_ID).unwrap())).unwrap();

        assert_eq!(
            h.origin.stored_keys(),
            vec![
                "static/models/ingenuity-77.glb.gz".to_string(),
                NEW_ID.to_string()
            ]
        );
        assert_eq!(h.cache.metrics().stale_evictions(), 1);
    }

    #[test]
    fn test_cache_write_failure_does_not_block() {
        let h = harness();
        h.origin.set_fail_writes(true);
        h.fetcher.serve(NEW_ID, rover_payload());

        assert!(block_on(h.cache.resolve(&ModelId::new(NEW_ID).unwrap())).is_ok());
        assert!(h.origin.is_empty());
    }

    #[test]
    fn test_not_found_is_network_error() {
        let h = harness();
        h.fetcher.respond(NEW_ID, 404, Vec::new());

        let result = block_on(h.cache.resolve(&ModelId::new(NEW_ID).unwrap()));
        assert!(matches!(result, Err(ViewerError::Network { .. })));
        assert!(!h.cache.is_resolved(&ModelId::new(NEW_ID).unwrap()));
    }

    #[test]
    fn test_corrupt_payload_is_decode_error() {
        let h = harness();
        let mut payload = rover_payload();
        payload.truncate(payload.len() / 2);
        h.fetcher.serve(NEW_ID, payload);

        let result = block_on(h.cache.resolve(&ModelId::new(NEW_ID).unwrap()));
        assert!(matches!(result, Err(ViewerError::Decode(_))));
    }

    #[test]
    fn test_malformed_model_is_parse_error() {
        let h = harness();
        h.fetcher.serve(NEW_ID, gzip(b"not a glb"));

        let result = block_on(h.cache.resolve(&ModelId::new(NEW_ID).unwrap()));
        assert!(matches!(result, Err(ViewerError::Parse(_))));
    }

    #[test]
    fn test_missing_facts_fail_resolution() {
        let h = harness();
        h.source.set_offline(true);
        h.fetcher.serve(NEW_ID, rover_payload());

        let result = block_on(h.cache.resolve(&ModelId::new(NEW_ID).unwrap()));
        assert!(matches!(result, Err(ViewerError::FactUnavailable(_))));
    }
}
