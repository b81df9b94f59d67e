//! Client for the StoryDiffusion image generation API.

use reqwest::Client;
use storyforge_core::{ImageRequest, ImageResponse};
use storyforge_error::{ModelsError, ModelsErrorKind, StoryforgeResult};
use storyforge_interface::ImageBackend;
use tracing::{debug, error, info, instrument};

/// StoryDiffusion image API client.
///
/// Posts an [`ImageRequest`] as JSON and reads back base64 images. The
/// client sets no timeout of its own; callers bound the call.
#[derive(Debug, Clone)]
pub struct StoryDiffusionClient {
    client: Client,
    url: String,
}

impl StoryDiffusionClient {
    /// Creates a client for the API at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), url)
    }

    /// Creates a client reusing an existing HTTP client.
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        let url = url.into();
        debug!(url = %url, "Creating StoryDiffusion client");
        Self { client, url }
    }

    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl ImageBackend for StoryDiffusionClient {
    #[instrument(skip(self, request), fields(width = request.width(), height = request.height(), seed = request.seed()))]
    async fn generate(&self, request: &ImageRequest) -> StoryforgeResult<ImageResponse> {
        debug!("Sending request to image API");

        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, "Failed to send request to image API");
                ModelsError::new(ModelsErrorKind::Http(format!("Request failed: {}", e)))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Image API returned error");
            return Err(ModelsError::new(ModelsErrorKind::Api {
                status: status.as_u16(),
                message: body,
            })
            .into());
        }

        let image_response: ImageResponse = response.json().await.map_err(|e| {
            error!(error = ?e, "Failed to parse image API response");
            ModelsError::new(ModelsErrorKind::Parse(format!(
                "Failed to parse response: {}",
                e
            )))
        })?;

        info!(
            images = image_response.images().len(),
            request_id = image_response.request_id().as_deref().unwrap_or("unknown"),
            "Received images"
        );
        Ok(image_response)
    }

    fn backend_name(&self) -> &str {
        "storydiffusion"
    }
}
