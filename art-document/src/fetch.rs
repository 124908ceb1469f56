//! Remote background fetching.

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::FetchError;

/// Fetches the raw bytes behind a background URL.
///
/// Implementations must be cancel-safe: the controller aborts the task that
/// awaits [`fetch`](Self::fetch) when a newer background supersedes it.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Download `url` and return its body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success response.
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
}

/// HTTP fetcher backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    http: Client,
}

impl HttpImageFetcher {
    /// Create a fetcher that identifies itself with `user_agent`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client fails to build.
    pub fn new(user_agent: &str) -> Result<Self, FetchError> {
        let http = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { http })
    }

    /// Wrap an existing client.
    #[must_use]
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        tracing::debug!(url = %url, "Fetching background image");
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = response.bytes().await?;
        tracing::debug!(url = %url, bytes = body.len(), "Fetched background image");
        Ok(body.to_vec())
    }
}
