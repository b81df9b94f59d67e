//! Storyforge CLI binary.
//!
//! This binary provides command-line access to Storyforge's functionality:
//! - Generate a batch of scene images for a character
//! - Browse and prune generation history
//! - Restore or purge deleted images
//! - Export saved generations

use clap::Parser;
use storyforge::{ObservabilityConfig, StudioConfig, init_observability};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{
        Cli, Commands, handle_export_command, handle_generate_command, handle_history_command,
        handle_trash_command,
    };

    // Load API keys from .env before anything reads the environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut observability = ObservabilityConfig::default().with_json_logs(cli.json_logs);
    if cli.verbose {
        observability = observability.with_log_level("debug");
    }
    init_observability(observability)?;

    let config = match &cli.config {
        Some(path) => StudioConfig::from_file(path)?,
        None => StudioConfig::load()?,
    };

    match cli.command {
        Commands::Generate(args) => {
            handle_generate_command(&config, args).await?;
        }

        Commands::History(history_cmd) => {
            handle_history_command(&config, history_cmd).await?;
        }

        Commands::Trash(trash_cmd) => {
            handle_trash_command(&config, trash_cmd).await?;
        }

        Commands::Export {
            generation,
            image,
            out,
        } => {
            handle_export_command(&config, generation, image, &out).await?;
        }
    }

    Ok(())
}
