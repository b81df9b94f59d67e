//! Prompt assembly and scene generation for Storyforge.
//!
//! - [`normalize`] cleans prompt fragments
//! - [`Organization`] maps style presets to artist tags
//! - [`PromptAssembler`] builds the image API prompt strings
//! - [`sample_lines`] draws spaced random lines from a corpus
//! - [`extract_scene_prompts`] recovers a scene list from LLM output
//! - [`SceneGenerator`] ties the corpora, sampler and chat backend together

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod assembler;
mod corpus;
mod extraction;
mod generator;
mod normalize;
mod organization;
mod sampler;

pub use assembler::{
    AssembledPrompts, HIRES_PROMPT_SEPARATOR, PromptAssembler, SCENE_PROMPT_SEPARATOR,
};
pub use corpus::Corpus;
pub use extraction::{SCENE_PROMPTS_KEY, extract_scene_prompts};
pub use generator::{
    CORPUS_CACHE_KEY, SCENE_SYSTEM_PROMPT, SceneGenerator, SceneOptions, SceneOptionsBuilder,
    build_enhancement_request,
};
pub use normalize::normalize;
pub use organization::{ArtistTags, Organization};
pub use sampler::sample_lines;
