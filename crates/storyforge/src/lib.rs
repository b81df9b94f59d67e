//! Storyforge - character and scene driven image generation.
//!
//! Storyforge turns a character description and a short list of scenes into
//! a batch of images, one per scene. Scenes are sampled from three text
//! corpora and optionally rewritten by an LLM. Every batch is kept in a
//! capped, quota-aware history, and discarded images go to a trash they can
//! be restored from.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use storyforge::{GenerationOutcome, Studio, StudioConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StudioConfig::load()?;
//!     let studio = Studio::from_config(&config)?;
//!
//!     studio
//!         .update_prompt_settings(|p| p.character_name = "Aria".to_string())
//!         .await;
//!
//!     if let GenerationOutcome::Completed(report) = studio.generate().await? {
//!         println!("{} images", report.generation().images().len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `storyforge_error` - Error types
//! - `storyforge_core` - Settings, scene lists, image records, API payloads
//! - `storyforge_interface` - Backend traits
//! - `storyforge_prompt` - Prompt assembly and scene generation
//! - `storyforge_models` - HTTP clients for the image, chat and corpus APIs
//! - `storyforge_storage` - Document stores and the history/trash archive
//! - `storyforge_export` - Single image and zip export
//!
//! This crate (`storyforge`) adds configuration, logging setup and the
//! [`Studio`] orchestrator, and re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod observability;
mod recovery;
mod studio;

pub use config::{GenerationConfig, ImageApiConfig, LlmConfig, StorageConfig, StudioConfig};
pub use observability::{ObservabilityConfig, init_observability};
pub use recovery::{TrashRecovery, has_image_data, restore_trash_to_dir};
pub use studio::{
    GenerationOutcome, GenerationReport, HistoryStatus, Studio, StudioOptions,
    StudioOptionsBuilder,
};

pub use storyforge_core::*;
pub use storyforge_error::*;
pub use storyforge_export::*;
pub use storyforge_interface::*;
pub use storyforge_models::*;
pub use storyforge_prompt::*;
pub use storyforge_storage::*;
