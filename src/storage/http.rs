// Plain HTTP(S) source fetcher

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

use super::{StorageError, UrlFetcher};

/// [`UrlFetcher`] over a shared reqwest client
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::Io(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl UrlFetcher for HttpFetcher {
    async fn fetch_url(&self, url: &str) -> Result<Bytes, StorageError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StorageError::Io(format!("HTTP fetch failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(StorageError::Io(format!(
                "HTTP request failed with status: {status}"
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| StorageError::Io(format!("Failed to read HTTP body: {e}")))
    }
}
