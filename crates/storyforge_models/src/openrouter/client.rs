use crate::openrouter::ChatCompletionResponse;
use reqwest::Client;
use storyforge_core::{ChatRequest, ChatResponse};
use storyforge_error::{ModelsError, ModelsErrorKind, StoryforgeResult};
use storyforge_interface::ChatBackend;
use tracing::{debug, error, instrument};

/// Default OpenRouter chat completions endpoint.
pub const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default environment variable holding the OpenRouter key.
pub const OPENROUTER_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// OpenRouter chat completion client.
#[derive(Clone)]
pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    url: String,
}

impl std::fmt::Debug for OpenRouterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterClient")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl OpenRouterClient {
    /// Creates a client for the default endpoint.
    ///
    /// # Arguments
    ///
    /// * `api_key` - OpenRouter API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_url(api_key, OPENROUTER_API_URL)
    }

    /// Creates a client for an OpenAI-compatible endpoint at `url`.
    pub fn with_url(api_key: impl Into<String>, url: impl Into<String>) -> Self {
        debug!("Creating new OpenRouter client");
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            url: url.into(),
        }
    }

    /// Creates a client with the key read from the environment variable `var`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelsErrorKind::MissingApiKey`] if the variable is unset or blank.
    pub fn from_env(var: &str, url: impl Into<String>) -> StoryforgeResult<Self> {
        let api_key = std::env::var(var)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ModelsError::new(ModelsErrorKind::MissingApiKey(var.to_string())))?;
        Ok(Self::with_url(api_key, url))
    }

    /// Sends a chat completion request.
    #[instrument(skip(self, request), fields(model = %request.model()))]
    pub async fn chat_completion(
        &self,
        request: &ChatRequest,
    ) -> Result<ChatCompletionResponse, ModelsError> {
        debug!(messages = request.messages().len(), "Sending request to OpenRouter");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, "Failed to send request to OpenRouter");
                ModelsError::new(ModelsErrorKind::Http(format!("Request failed: {}", e)))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "OpenRouter returned error");
            return Err(ModelsError::new(ModelsErrorKind::Api {
                status: status.as_u16(),
                message: body,
            }));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            error!(error = ?e, "Failed to parse OpenRouter response");
            ModelsError::new(ModelsErrorKind::Parse(format!(
                "Failed to parse response: {}",
                e
            )))
        })?;

        debug!(
            id = completion.id().as_deref().unwrap_or("unknown"),
            choices = completion.choices().len(),
            "Received response from OpenRouter"
        );
        Ok(completion)
    }
}

#[async_trait::async_trait]
impl ChatBackend for OpenRouterClient {
    #[instrument(skip(self, request))]
    async fn complete(&self, request: &ChatRequest) -> StoryforgeResult<ChatResponse> {
        let completion = self.chat_completion(request).await?;
        let content = completion.first_content().ok_or_else(|| {
            error!("OpenRouter response had no message content");
            ModelsError::new(ModelsErrorKind::Parse(
                "Response has no choices[0].message.content".to_string(),
            ))
        })?;
        Ok(ChatResponse::new(content))
    }

    fn provider_name(&self) -> &'static str {
        "openrouter"
    }
}
