//! `generate` command handler.

use super::commands::GenerateArgs;
use super::ensure_dir;
use storyforge::{GenerationOutcome, StoryforgeResult, Studio, StudioConfig};
use tracing::info;

/// Run one generation with the given prompts and settings.
pub async fn handle_generate_command(
    config: &StudioConfig,
    args: GenerateArgs,
) -> StoryforgeResult<()> {
    let studio = Studio::from_config(config)?;

    let GenerateArgs {
        name,
        base,
        clothing,
        scene_details,
        background,
        quality,
        negative,
        arguments,
        style,
        size,
        seed,
        start,
        mid,
        end,
        model,
        lora,
        no_enhance,
        out,
    } = args;

    studio
        .update_generation_settings(|s| {
            s.style = style;
            s.size = size;
            s.start = start;
            s.mid = mid;
            s.end = end;
            s.ai_enhancer = !no_enhance;
            s.lora = lora;
            if let Some(seed) = seed {
                s.seed = seed;
            }
            if model.is_some() {
                s.llm_model = model;
            }
        })
        .await;

    studio
        .update_prompt_settings(|p| {
            p.character_name = name;
            p.character_base = base;
            p.clothing_details = clothing;
            p.character_scene_details = scene_details;
            p.background = background;
            p.arguments = arguments;
            if let Some(quality) = quality {
                p.final_detail_quality_tags = quality;
            }
            if let Some(negative) = negative {
                p.negative_prompt = negative;
            }
        })
        .await;

    match studio.generate().await? {
        GenerationOutcome::Completed(report) => {
            let generation = report.generation();
            println!("Generation {}", generation.id());
            println!("Seed: {}", generation.settings().seed);
            for (index, scene) in generation.prompts().prompt_scenes.iter().enumerate() {
                println!("  {}. {}", index + 1, scene);
            }
            println!("Images: {}", generation.images().len());
            if let Some(warning) = report.warning() {
                eprintln!("Warning: {}", warning);
            }

            if let Some(out) = out {
                ensure_dir(&out).await?;
                let path = studio.download_all(&out).await?;
                info!(path = %path.display(), "Batch exported");
                println!("Saved {}", path.display());
            }
        }
        GenerationOutcome::Cancelled => {
            eprintln!("Generation cancelled: no images were returned");
        }
        GenerationOutcome::Rejected(message) => {
            eprintln!("{}", message);
        }
    }

    Ok(())
}
