//! Fact sheets for the vehicles
//!
//! The provider fetches an encyclopedia page, falls back to the last stored
//! snapshot when the remote side fails, and writes fresh sheets back to the
//! local store. Results are memoized per identifier for the session.

pub mod infobox;
pub mod source;
pub mod store;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::cache::metrics::AssetMetricsHandle;
use crate::catalog::{ModelId, Vehicle};
use crate::error::{Result, ViewerError};
use infobox::InfoboxParser;
pub use source::{EncyclopediaSource, MockEncyclopedia, PageSummary};
#[cfg(feature = "net-http")]
pub use source::WikipediaSource;
pub use store::{FactStore, FileStore, KeyValueStore, MemoryStore};

/// Attributes shown on the info card, in display order
pub const VISIBLE_ATTRIBUTES: [&str; 6] = [
    "Dimensions",
    "Dry mass",
    "Power",
    "Deployed",
    "Location",
    "Travelled",
];

/// Structured encyclopedia metadata about a vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactSheet {
    /// Encyclopedia topic the sheet was fetched from
    #[serde(default)]
    pub topic: String,
    pub title: String,
    pub extract: String,
    /// Ordered (label, value) attribute pairs
    pub infobox: Vec<(String, String)>,
}

impl FactSheet {
    /// First value recorded under `label`
    pub fn attribute(&self, label: &str) -> Option<&str> {
        self.infobox
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    /// Attributes whose label is on the info card, in source order
    pub fn visible_attributes(&self) -> Vec<(&str, &str)> {
        self.infobox
            .iter()
            .filter(|(label, _)| VISIBLE_ATTRIBUTES.contains(&label.as_str()))
            .map(|(l, v)| (l.as_str(), v.as_str()))
            .collect()
    }
}

/// Resolves identifiers to fact sheets
#[derive(Debug)]
pub struct FactProvider {
    source: Arc<dyn EncyclopediaSource>,
    store: FactStore,
    parser: InfoboxParser,
    memo: RwLock<HashMap<String, Arc<FactSheet>>>,
    metrics: AssetMetricsHandle,
}

impl FactProvider {
    pub fn new(source: Arc<dyn EncyclopediaSource>, store: FactStore) -> Result<Self> {
        Ok(Self {
            source,
            store,
            parser: InfoboxParser::new()?,
            memo: RwLock::new(HashMap::new()),
            metrics: AssetMetricsHandle::new(),
        })
    }

    /// Share counters with the owning cache
    pub fn with_metrics(mut self, metrics: AssetMetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn store(&self) -> &FactStore {
        &self.store
    }

    /// Fact sheet for `id`, remote first, then the stored snapshot
    pub async fn resolve(&self, id: &ModelId, logical_name: &str) -> Result<Arc<FactSheet>> {
        if let Some(sheet) = self.memo.read().get(id.as_str()) {
            return Ok(Arc::clone(sheet));
        }

        let sheet = match self.fetch_remote(id).await {
            Ok(sheet) => {
                if let Err(e) = self.store.save(logical_name, &sheet) {
                    log::warn!("Failed to store fact sheet for {logical_name}: {e}");
                }
                sheet
            }
            Err(remote) => {
                log::warn!("Remote facts for {id} failed ({remote}); trying local store");
                let stored = self.store.load(logical_name).unwrap_or_else(|e| {
                    log::warn!("Local fact store unreadable: {e}");
                    None
                });
                match stored {
                    Some(sheet) => {
                        self.metrics.record_fact_fallback();
                        sheet
                    }
                    None => return Err(ViewerError::FactUnavailable(id.to_string())),
                }
            }
        };

        let sheet = Arc::new(sheet);
        self.memo
            .write()
            .insert(id.as_str().to_string(), Arc::clone(&sheet));
        Ok(sheet)
    }

    async fn fetch_remote(&self, id: &ModelId) -> Result<FactSheet> {
        let topic = Vehicle::from_identifier(id)
            .map(Vehicle::wiki_topic)
            .ok_or_else(|| ViewerError::FactUnavailable(format!("no encyclopedia topic for {id}")))?;

        self.metrics.record_fact_fetch();
        let html = self.source.page_html(topic).await?;
        let summary = self.source.summary(topic).await?;
        let infobox = self.parser.extract(&html);
        log::debug!(
            "Fetched {} attributes for {topic} from {}",
            infobox.len(),
            self.source.backend_name()
        );

        Ok(FactSheet {
            topic: topic.to_string(),
            title: summary.title,
            extract: summary.extract,
            infobox,
        })
    }
}
