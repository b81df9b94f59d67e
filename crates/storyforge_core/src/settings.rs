//! Generation and prompt settings edited by the user.

use crate::{ImageSize, SceneList};
use serde::{Deserialize, Serialize};
use storyforge_error::{ValidationError, ValidationErrorKind};

/// Default LLM used to enhance scene lists.
pub const DEFAULT_LLM_MODEL: &str = "aion-labs/aion-1.0-mini";

/// Per-request image generation configuration.
///
/// `style` selects the organization whose artist tags are injected during
/// prompt assembly.
///
/// # Examples
///
/// ```
/// use storyforge_core::{GenerationSettings, ImageSize};
///
/// let settings = GenerationSettings::default();
/// assert_eq!(settings.style, "Realistic");
/// assert_eq!(settings.size, ImageSize::Landscape);
/// assert_eq!((settings.start, settings.mid, settings.end), (30, 60, 90));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    /// Template label carried with saved records
    #[serde(default)]
    pub template: String,
    /// Organization/style preset name
    pub style: String,
    /// Whether scene lists are rewritten by the LLM
    #[serde(default)]
    pub ai_enhancer: bool,
    /// Seed shared by every image of the next batch
    pub seed: u64,
    /// Output dimensions
    pub size: ImageSize,
    /// Lines drawn from the solo corpus
    #[serde(default)]
    pub start: u32,
    /// Lines drawn from the couple corpus
    #[serde(default)]
    pub mid: u32,
    /// Lines drawn from the detail corpus
    #[serde(default)]
    pub end: u32,
    /// LLM model identifier for scene enhancement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_model: Option<String>,
    /// Lora reference passed to the image API (`modelId@versionId`)
    #[serde(default, rename = "civitaiLora", skip_serializing_if = "Option::is_none")]
    pub lora: Option<String>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            template: String::new(),
            style: "Realistic".to_string(),
            ai_enhancer: true,
            seed: 0,
            size: ImageSize::default(),
            start: 30,
            mid: 60,
            end: 90,
            llm_model: Some(DEFAULT_LLM_MODEL.to_string()),
            lora: None,
        }
    }
}

impl GenerationSettings {
    /// Model to use for enhancement, falling back to the default model.
    pub fn llm_model_or_default(&self) -> &str {
        self.llm_model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_LLM_MODEL)
    }

    /// Lora reference to send, if one is set.
    pub fn lora_air(&self) -> Option<&str> {
        self.lora.as_deref().map(str::trim).filter(|l| !l.is_empty())
    }
}

/// Free-text narrative fields describing character, scene and negatives.
///
/// # Examples
///
/// ```
/// use storyforge_core::PromptSettings;
///
/// let mut prompts = PromptSettings::default();
/// assert!(prompts.validate().is_err());
///
/// prompts.character_name = "Aria".to_string();
/// assert!(prompts.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptSettings {
    /// Character name, wrapped in brackets in every prompt
    pub character_name: String,
    /// Base appearance description
    #[serde(default)]
    pub character_base: String,
    /// Clothing description
    #[serde(default)]
    pub clothing_details: String,
    /// Per-scene character details
    #[serde(default)]
    pub character_scene_details: String,
    /// Background description
    #[serde(default)]
    pub background: String,
    /// Quality tags appended to scene prompts
    #[serde(default)]
    pub final_detail_quality_tags: String,
    /// Generated scene list
    #[serde(default)]
    pub prompt_scenes: SceneList,
    /// Extra instructions for the enhancement LLM
    #[serde(default)]
    pub arguments: String,
    /// Scene count chosen in the editor, kept as entered
    #[serde(default)]
    pub max_prompts: String,
    /// Negative prompt
    #[serde(default)]
    pub negative_prompt: String,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            character_name: String::new(),
            character_base: String::new(),
            clothing_details: String::new(),
            character_scene_details: String::new(),
            background: String::new(),
            final_detail_quality_tags: "high detail, 8k, ultra realistic".to_string(),
            prompt_scenes: SceneList::new(),
            arguments: String::new(),
            max_prompts: String::new(),
            negative_prompt: "deformed, distorted, disfigured, low quality".to_string(),
        }
    }
}

impl PromptSettings {
    /// Check the fields required before any network call is made.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the character name is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.character_name.trim().is_empty() {
            return Err(ValidationError::new(ValidationErrorKind::MissingField(
                "character name".to_string(),
            )));
        }
        Ok(())
    }
}
