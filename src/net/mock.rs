//! In-memory origin for tests
//!
//! Serves registered payloads, counts requests per URI and can hold a request
//! open until the test releases it, which is how completion order between
//! concurrent resolutions is controlled.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::channel::oneshot;
use parking_lot::Mutex;

use super::OriginFetcher;
use crate::error::{Result, ViewerError};

#[derive(Debug, Clone)]
struct MockResponse {
    status: u16,
    body: Vec<u8>,
}

#[derive(Debug, Default)]
struct MockOriginState {
    responses: HashMap<String, MockResponse>,
    requests: HashMap<String, usize>,
    holds: HashMap<String, oneshot::Receiver<()>>,
}

/// Mock origin server
///
/// Clones share state, so a test can keep one handle for assertions after
/// moving another into the cache.
#[derive(Clone, Debug, Default)]
pub struct MockFetcher {
    state: Arc<Mutex<MockOriginState>>,
    offline: Arc<AtomicBool>,
}

/// Releases a held request when dropped or released
#[derive(Debug)]
pub struct HoldGuard {
    tx: Option<oneshot::Sender<()>>,
}

impl HoldGuard {
    pub fn release(mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for HoldGuard {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(());
        }
    }
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 under `uri`
    pub fn serve(&self, uri: impl Into<String>, body: Vec<u8>) -> &Self {
        self.respond(uri, 200, body)
    }

    /// Serve an arbitrary status and body under `uri`
    pub fn respond(&self, uri: impl Into<String>, status: u16, body: Vec<u8>) -> &Self {
        self.state
            .lock()
            .responses
            .insert(uri.into(), MockResponse { status, body });
        self
    }

    /// Hold the next request for `uri` until the guard is released
    pub fn hold(&self, uri: impl Into<String>) -> HoldGuard {
        let (tx, rx) = oneshot::channel();
        self.state.lock().holds.insert(uri.into(), rx);
        HoldGuard { tx: Some(tx) }
    }

    /// Simulate a network outage
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn request_count(&self, uri: &str) -> usize {
        self.state.lock().requests.get(uri).copied().unwrap_or(0)
    }

    pub fn total_requests(&self) -> usize {
        self.state.lock().requests.values().sum()
    }
}

#[async_trait::async_trait]
impl OriginFetcher for MockFetcher {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
        let hold = {
            let mut state = self.state.lock();
            *state.requests.entry(uri.to_string()).or_insert(0) += 1;
            state.holds.remove(uri)
        };
        if let Some(hold) = hold {
            let _ = hold.await;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(ViewerError::network(uri, "connection refused"));
        }

        let response = self.state.lock().responses.get(uri).cloned();
        match response {
            Some(r) if (200..300).contains(&r.status) => Ok(r.body),
            Some(r) => Err(ViewerError::network(uri, format!("HTTP {}", r.status))),
            None => Err(ViewerError::network(uri, "HTTP 404")),
        }
    }

    fn backend_name(&self) -> &'static str {
        "Mock"
    }
}
