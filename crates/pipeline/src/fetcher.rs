//! Source fetcher: retrieves the submitted artifact as raw text.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::FetchError;

/// Default timeout for a single fetch.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Retrieves a submission artifact by its source reference.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetch the artifact at `source_ref` as text.
    async fn fetch(&self, source_ref: &str) -> Result<String, FetchError>;
}

/// HTTP fetcher for raw submission URLs (e.g. raw GitHub content links).
pub struct HttpSourceFetcher {
    client: reqwest::Client,
}

impl HttpSourceFetcher {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client construction cannot fail with static options");
        Self { client }
    }
}

impl Default for HttpSourceFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    async fn fetch(&self, source_ref: &str) -> Result<String, FetchError> {
        let response = self.client.get(source_ref.trim()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: source_ref.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}
