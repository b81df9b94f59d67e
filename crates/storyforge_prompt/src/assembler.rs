//! Turns settings and prompts into the strings the image API expects.

use crate::{Organization, normalize};
use derive_getters::Getters;
use storyforge_core::{GenerationSettings, PromptSettings};

/// Separator between per-scene prompts.
pub const SCENE_PROMPT_SEPARATOR: &str = ";\n";

/// Separator between refinement prompts.
pub const HIRES_PROMPT_SEPARATOR: &str = " / ";

/// Prompt strings for one image request.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct AssembledPrompts {
    /// Character prompt
    character_prompt: String,
    /// One prompt per scene, joined by [`SCENE_PROMPT_SEPARATOR`]
    scene_prompts: String,
    /// One refinement prompt per scene, joined by [`HIRES_PROMPT_SEPARATOR`]
    hiresfix_prompt: String,
    /// Number of scenes, and so of images requested
    scene_count: usize,
}

/// Builds [`AssembledPrompts`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptAssembler;

impl PromptAssembler {
    /// Assemble the character, scene and refinement prompts.
    ///
    /// The organization named by `settings.style` contributes artist tags.
    /// Blank scenes are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use storyforge_core::{GenerationSettings, PromptSettings, SceneList};
    /// use storyforge_prompt::PromptAssembler;
    ///
    /// let settings = GenerationSettings { style: "project3".into(), ..Default::default() };
    /// let prompts = PromptSettings {
    ///     character_name: "Aria".into(),
    ///     character_base: "silver hair".into(),
    ///     background: "harbor".into(),
    ///     final_detail_quality_tags: "8k".into(),
    ///     prompt_scenes: SceneList::from_delimited("waving/sitting"),
    ///     ..Default::default()
    /// };
    ///
    /// let assembled = PromptAssembler::assemble(&settings, &prompts);
    /// assert_eq!(assembled.character_prompt(), "[Aria], proj3 patreon, silver hair, harbor");
    /// assert_eq!(assembled.scene_prompts(), "[Aria], waving, 8k;\n[Aria], sitting, 8k");
    /// assert_eq!(*assembled.scene_count(), 2);
    /// ```
    pub fn assemble(settings: &GenerationSettings, prompts: &PromptSettings) -> AssembledPrompts {
        let tags = Organization::artist_tags(&settings.style);
        let name = &prompts.character_name;

        let character_prompt = normalize(&format!(
            "[{}], {}, {}, {}",
            name, tags.base, prompts.character_base, prompts.background
        ));

        let hires_lead = if tags.hires.is_empty() {
            String::new()
        } else {
            format!("{}, ", tags.hires)
        };

        let scenes: Vec<&str> = prompts
            .prompt_scenes
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();

        let scene_prompts: Vec<String> = scenes
            .iter()
            .map(|scene| {
                normalize(&format!(
                    "[{}], {}, {}, {}",
                    name,
                    scene,
                    prompts.character_scene_details,
                    prompts.final_detail_quality_tags
                ))
            })
            .collect();

        let hires_prompts: Vec<String> = scenes
            .iter()
            .map(|scene| {
                normalize(&format!(
                    "{}{}, {}, {}, {}, {}",
                    hires_lead,
                    prompts.character_base,
                    scene,
                    prompts.character_scene_details,
                    prompts.background,
                    prompts.final_detail_quality_tags
                ))
            })
            .collect();

        tracing::debug!(
            style = %settings.style,
            scenes = scenes.len(),
            "Assembled prompts"
        );

        AssembledPrompts {
            character_prompt,
            scene_prompts: scene_prompts.join(SCENE_PROMPT_SEPARATOR),
            hiresfix_prompt: hires_prompts.join(HIRES_PROMPT_SEPARATOR),
            scene_count: scenes.len(),
        }
    }
}
