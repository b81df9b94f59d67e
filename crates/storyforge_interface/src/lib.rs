//! Trait definitions for the remote services Storyforge talks to.
//!
//! - [`ImageBackend`] - the image generation API
//! - [`ChatBackend`] - the chat-completion API used for scene enhancement
//! - [`CorpusSource`] - the newline-delimited scene corpora
//! - [`ImageFetcher`] - raw bytes behind a remote image URL
//!
//! Concrete HTTP implementations live in `storyforge_models`; tests provide
//! their own in-memory implementations.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use storyforge_core::{ChatRequest, ChatResponse, CorpusCategory, ImageRequest, ImageResponse};
use storyforge_error::StoryforgeResult;

/// Backend that turns assembled prompts into images.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Generate one image per scene prompt in the request.
    async fn generate(&self, request: &ImageRequest) -> StoryforgeResult<ImageResponse>;

    /// Backend name for logs (e.g., "storydiffusion").
    fn backend_name(&self) -> &str;
}

/// Chat-completion backend used to rewrite scene lists.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Complete the conversation, returning the first choice's text.
    async fn complete(&self, request: &ChatRequest) -> StoryforgeResult<ChatResponse>;

    /// Provider name (e.g., "openrouter").
    fn provider_name(&self) -> &'static str;
}

/// Source of the raw scene corpora.
#[async_trait]
pub trait CorpusSource: Send + Sync {
    /// Fetch the full newline-delimited text for one category.
    async fn fetch(&self, category: CorpusCategory) -> StoryforgeResult<String>;
}

/// Fetches bytes for remote image URLs.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Download the image at `url`.
    async fn fetch(&self, url: &str) -> StoryforgeResult<Vec<u8>>;
}

#[async_trait]
impl<T: ImageBackend + ?Sized> ImageBackend for std::sync::Arc<T> {
    async fn generate(&self, request: &ImageRequest) -> StoryforgeResult<ImageResponse> {
        (**self).generate(request).await
    }

    fn backend_name(&self) -> &str {
        (**self).backend_name()
    }
}

#[async_trait]
impl<T: ChatBackend + ?Sized> ChatBackend for std::sync::Arc<T> {
    async fn complete(&self, request: &ChatRequest) -> StoryforgeResult<ChatResponse> {
        (**self).complete(request).await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }
}

#[async_trait]
impl<T: CorpusSource + ?Sized> CorpusSource for std::sync::Arc<T> {
    async fn fetch(&self, category: CorpusCategory) -> StoryforgeResult<String> {
        (**self).fetch(category).await
    }
}

#[async_trait]
impl<T: ImageFetcher + ?Sized> ImageFetcher for std::sync::Arc<T> {
    async fn fetch(&self, url: &str) -> StoryforgeResult<Vec<u8>> {
        (**self).fetch(url).await
    }
}
