//! Generated images and the batches that produced them.

use crate::{GenerationSettings, PromptSettings};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One produced image with an immutable snapshot of its inputs.
///
/// # Examples
///
/// ```
/// use storyforge_core::{GeneratedImage, GenerationSettings, PromptSettings};
///
/// let image = GeneratedImage::new(
///     "data:image/webp;base64,AAAA",
///     42,
///     GenerationSettings::default(),
///     PromptSettings::default(),
/// );
/// assert_eq!(*image.seed(), 42);
/// assert!(image.is_embedded());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct GeneratedImage {
    /// Unique image identifier
    id: Uuid,
    /// Remote URL or embedded data URI; empty once dropped by compression
    #[serde(default)]
    url: String,
    /// Seed of the batch that produced the image
    seed: u64,
    /// Creation time
    timestamp: DateTime<Utc>,
    /// Settings at generation time
    settings: GenerationSettings,
    /// Prompts at generation time
    prompts: PromptSettings,
}

impl GeneratedImage {
    /// Create an image record with a fresh id and the current time.
    pub fn new(
        url: impl Into<String>,
        seed: u64,
        settings: GenerationSettings,
        prompts: PromptSettings,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            seed,
            timestamp: Utc::now(),
            settings,
            prompts,
        }
    }

    /// Replace the creation time.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Whether the image data is embedded as a `data:` URI.
    pub fn is_embedded(&self) -> bool {
        self.url.starts_with("data:")
    }

    /// Case-insensitive match on character name, style, base and background.
    pub fn matches_search(&self, term: &str) -> bool {
        snapshot_matches(&self.settings, &self.prompts, term)
    }
}

/// One generation batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct Generation {
    /// Unique generation identifier
    id: Uuid,
    /// Images in batch order
    images: Vec<GeneratedImage>,
    /// Creation time
    timestamp: DateTime<Utc>,
    /// Settings at generation time
    settings: GenerationSettings,
    /// Prompts at generation time, including the generated scenes
    prompts: PromptSettings,
}

impl Generation {
    /// Create a batch record with a fresh id and the current time.
    pub fn new(
        images: Vec<GeneratedImage>,
        settings: GenerationSettings,
        prompts: PromptSettings,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            images,
            timestamp: Utc::now(),
            settings,
            prompts,
        }
    }

    /// Consume the batch, yielding its images.
    pub fn into_images(self) -> Vec<GeneratedImage> {
        self.images
    }

    /// Case-insensitive match on character name, style, base and background.
    pub fn matches_search(&self, term: &str) -> bool {
        snapshot_matches(&self.settings, &self.prompts, term)
    }
}

fn snapshot_matches(settings: &GenerationSettings, prompts: &PromptSettings, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    [
        prompts.character_name.as_str(),
        settings.style.as_str(),
        prompts.character_base.as_str(),
        prompts.background.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
}
