//! HTTP origin fetcher

use std::time::Duration;

use reqwest::Client;

use super::{join_url, OriginFetcher};
use crate::error::{Result, ViewerError};

const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Fetches payloads over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait::async_trait]
impl OriginFetcher for HttpFetcher {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
        let url = join_url(&self.base_url, uri);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ViewerError::network(&url, e))?;

        if !response.status().is_success() {
            return Err(ViewerError::network(
                &url,
                format!("Model request response not valid: {}", response.status()),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ViewerError::network(&url, e))?;
        Ok(bytes.to_vec())
    }

    fn backend_name(&self) -> &'static str {
        "HTTP"
    }
}
