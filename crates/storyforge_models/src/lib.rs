//! HTTP clients for the services Storyforge talks to.
//!
//! - [`StoryDiffusionClient`] implements [`ImageBackend`](storyforge_interface::ImageBackend)
//! - [`OpenRouterClient`] implements [`ChatBackend`](storyforge_interface::ChatBackend)
//! - [`HttpCorpusSource`] implements [`CorpusSource`](storyforge_interface::CorpusSource)
//! - [`HttpImageFetcher`] implements [`ImageFetcher`](storyforge_interface::ImageFetcher)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod corpus;
mod fetch;
mod openrouter;
mod storydiffusion;

pub use corpus::{CorpusUrls, HttpCorpusSource};
pub use fetch::HttpImageFetcher;
pub use openrouter::{
    ChatCompletionResponse, CompletionChoice, CompletionMessage, OPENROUTER_API_KEY_ENV,
    OPENROUTER_API_URL, OpenRouterClient,
};
pub use storydiffusion::StoryDiffusionClient;
