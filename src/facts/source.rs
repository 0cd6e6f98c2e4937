//! Remote encyclopedia back-ends

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;

use crate::error::{Result, ViewerError};

/// Summary block of an encyclopedia page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PageSummary {
    pub title: String,
    #[serde(default)]
    pub extract: String,
}

/// Remote encyclopedia the fact provider reads from
#[async_trait::async_trait]
pub trait EncyclopediaSource: Send + Sync + Debug {
    /// Full HTML of the page for `topic`
    async fn page_html(&self, topic: &str) -> Result<String>;

    /// Title and plain-text extract for `topic`
    async fn summary(&self, topic: &str) -> Result<PageSummary>;

    fn backend_name(&self) -> &'static str;
}

#[derive(Debug, Default)]
struct MockPages {
    pages: HashMap<String, (String, PageSummary)>,
    requests: HashMap<String, usize>,
}

/// In-memory encyclopedia with request counting and an offline switch
#[derive(Clone, Debug, Default)]
pub struct MockEncyclopedia {
    state: Arc<Mutex<MockPages>>,
    offline: Arc<AtomicBool>,
}

impl MockEncyclopedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page
    pub fn serve(&self, topic: impl Into<String>, html: impl Into<String>, summary: PageSummary) -> &Self {
        self.state
            .lock()
            .pages
            .insert(topic.into(), (html.into(), summary));
        self
    }

    /// Simulate the network being unavailable
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of page fetches attempted for `topic`
    pub fn request_count(&self, topic: &str) -> usize {
        self.state.lock().requests.get(topic).copied().unwrap_or(0)
    }

    pub fn total_requests(&self) -> usize {
        self.state.lock().requests.values().sum()
    }

    fn lookup(&self, topic: &str) -> Result<(String, PageSummary)> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ViewerError::network(topic, "offline"));
        }
        self.state
            .lock()
            .pages
            .get(topic)
            .cloned()
            .ok_or_else(|| ViewerError::network(topic, "HTTP 404"))
    }
}

#[async_trait::async_trait]
impl EncyclopediaSource for MockEncyclopedia {
    async fn page_html(&self, topic: &str) -> Result<String> {
        *self
            .state
            .lock()
            .requests
            .entry(topic.to_string())
            .or_default() += 1;
        self.lookup(topic).map(|(html, _)| html)
    }

    async fn summary(&self, topic: &str) -> Result<PageSummary> {
        self.lookup(topic).map(|(_, summary)| summary)
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(feature = "net-http")]
pub use wikipedia::WikipediaSource;

#[cfg(feature = "net-http")]
mod wikipedia {
    use std::time::Duration;

    use super::{EncyclopediaSource, PageSummary};
    use crate::error::{Result, ViewerError};

    /// Wikipedia REST API client
    #[derive(Clone, Debug)]
    pub struct WikipediaSource {
        client: reqwest::Client,
        base_url: String,
    }

    impl WikipediaSource {
        pub fn new(base_url: impl Into<String>) -> Self {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new());
            Self {
                client,
                base_url: base_url.into().trim_end_matches('/').to_string(),
            }
        }

        async fn get(&self, endpoint: &str, topic: &str) -> Result<reqwest::Response> {
            let url = format!("{}/api/rest_v1/page/{endpoint}/{topic}", self.base_url);
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| ViewerError::network(url.as_str(), e))?;
            if !response.status().is_success() {
                return Err(ViewerError::network(
                    url,
                    format!("HTTP {}", response.status().as_u16()),
                ));
            }
            Ok(response)
        }
    }

    #[async_trait::async_trait]
    impl EncyclopediaSource for WikipediaSource {
        async fn page_html(&self, topic: &str) -> Result<String> {
            self.get("html", topic)
                .await?
                .text()
                .await
                .map_err(|e| ViewerError::network(topic, e))
        }

        async fn summary(&self, topic: &str) -> Result<PageSummary> {
            self.get("summary", topic)
                .await?
                .json::<PageSummary>()
                .await
                .map_err(|e| ViewerError::Parse(format!("summary for {topic}: {e}")))
        }

        fn backend_name(&self) -> &'static str {
            "wikipedia"
        }
    }
}
