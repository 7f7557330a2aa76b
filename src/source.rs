//! Remote image source
//!
//! Sources only perform the transfer; response validation belongs to the
//! dispatcher so every source is judged by the same rules.

use crate::config::EndpointConfig;
use crate::error::FetchError;
use std::future::Future;

/// Raw outcome of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Something that can return image bytes for a slot
pub trait ResourceSource: Send + Sync + 'static {
    /// Perform one request. `Err` means no response was obtained at all.
    fn fetch(&self) -> impl Future<Output = Result<SourceResponse, FetchError>> + Send;
}

/// HTTP source hitting a fixed templated URL
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn from_endpoint(endpoint: &EndpointConfig) -> Self {
        Self::new(endpoint.url())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ResourceSource for HttpSource {
    async fn fetch(&self) -> Result<SourceResponse, FetchError> {
        log::debug!("Fetching image from URL: {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .header("Content-Type", "image/jpeg")
            .header("User-Agent", concat!("grid_cache/", env!("CARGO_PKG_VERSION")))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(SourceResponse { status, body })
    }
}
