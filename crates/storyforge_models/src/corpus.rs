//! Plain-text corpus download.

use derive_getters::Getters;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use storyforge_core::CorpusCategory;
use storyforge_error::{HttpError, StoryforgeResult};
use storyforge_interface::CorpusSource;
use tracing::{debug, error, instrument};

/// Where each corpus is downloaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct CorpusUrls {
    /// Solo corpus URL
    solo: String,
    /// Couple corpus URL
    couple: String,
    /// Detail corpus URL
    detail: String,
}

impl CorpusUrls {
    /// URLs for each category.
    pub fn new(
        solo: impl Into<String>,
        couple: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            solo: solo.into(),
            couple: couple.into(),
            detail: detail.into(),
        }
    }

    /// URL for one category.
    pub fn get(&self, category: CorpusCategory) -> &str {
        match category {
            CorpusCategory::Solo => &self.solo,
            CorpusCategory::Couple => &self.couple,
            CorpusCategory::Detail => &self.detail,
        }
    }
}

/// Downloads corpora over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCorpusSource {
    client: Client,
    urls: CorpusUrls,
}

impl HttpCorpusSource {
    /// Source downloading from `urls`.
    pub fn new(urls: CorpusUrls) -> Self {
        Self {
            client: Client::new(),
            urls,
        }
    }
}

#[async_trait::async_trait]
impl CorpusSource for HttpCorpusSource {
    #[instrument(skip(self), fields(url = self.urls.get(category)))]
    async fn fetch(&self, category: CorpusCategory) -> StoryforgeResult<String> {
        let url = self.urls.get(category);

        let response = self.client.get(url).send().await.map_err(|e| {
            error!(error = ?e, "Failed to request corpus");
            HttpError::request(url, e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, "Corpus endpoint returned error");
            return Err(HttpError::request(url, status.canonical_reason().unwrap_or("request failed"))
                .with_status(status.as_u16())
                .into());
        }

        let text = response.text().await.map_err(|e| {
            error!(error = ?e, "Failed to read corpus body");
            HttpError::request(url, format!("Failed to read body: {}", e))
                .with_status(status.as_u16())
        })?;

        debug!(bytes = text.len(), "Fetched corpus");
        Ok(text)
    }
}
