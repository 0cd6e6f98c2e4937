//! Origin fetch abstraction
//!
//! Model payloads come from an origin server as gzip-compressed GLB files
//! addressed by versioned identifiers. The fetcher is a trait so the asset
//! cache works against HTTP in production and against [`MockFetcher`] in
//! tests.

pub mod mock;
#[cfg(feature = "net-http")]
pub mod http;

use std::fmt::Debug;

use crate::error::Result;

/// Fetches raw payloads from the origin
///
/// Implementations must map any non-2xx response to
/// [`ViewerError::Network`](crate::ViewerError::Network).
#[async_trait::async_trait]
pub trait OriginFetcher: Send + Sync + Debug {
    /// Fetch the full payload stored under `uri`
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>>;

    /// Get the name of this fetch backend (for debugging)
    fn backend_name(&self) -> &'static str;
}

/// Join a possibly relative identifier onto a base URL
pub fn join_url(base: &str, uri: &str) -> String {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        uri.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), uri.trim_start_matches('/'))
    }
}

pub use mock::MockFetcher;

#[cfg(feature = "net-http")]
pub use http::HttpFetcher;
