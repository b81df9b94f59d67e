//! Raw image downloads.

use reqwest::Client;
use storyforge_error::{ExportError, ExportErrorKind, StoryforgeResult};
use storyforge_interface::ImageFetcher;
use tracing::{debug, instrument};

/// Downloads remote images over HTTP.
#[derive(Debug, Clone, Default)]
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    /// Fetcher with a fresh HTTP client.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ImageFetcher for HttpImageFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> StoryforgeResult<Vec<u8>> {
        let fetch_err = |message: String| {
            ExportError::new(ExportErrorKind::Fetch {
                url: url.to_string(),
                message,
            })
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_err(format!("status {}", status)).into());
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;
        debug!(bytes = bytes.len(), "Fetched image");
        Ok(bytes.to_vec())
    }
}
