//! Core data types for the Storyforge image generation client.
//!
//! This crate provides the settings, scene lists, image records and API
//! payloads shared by every other Storyforge crate.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chat;
mod corpus;
mod image;
mod request;
mod scene;
mod settings;
mod size;

pub use chat::{ChatMessage, ChatMessageBuilder, ChatRequest, ChatRequestBuilder, ChatResponse, ChatRole};
pub use corpus::CorpusCategory;
pub use image::{GeneratedImage, Generation};
pub use request::{ImageRequest, ImageRequestBuilder, ImageResponse, mime_for_format};
pub use scene::{SCENE_DELIMITER, SceneList};
pub use settings::{DEFAULT_LLM_MODEL, GenerationSettings, PromptSettings};
pub use size::ImageSize;
