//! `trash` command handlers.

use super::commands::{OutputFormat, TrashCommands};
use super::{open_archive, to_json};
use std::sync::Arc;
use storyforge::{
    Exporter, HttpImageFetcher, StoryforgeResult, StudioConfig, restore_trash_to_dir,
};

/// Handle trash subcommands.
pub async fn handle_trash_command(config: &StudioConfig, cmd: TrashCommands) -> StoryforgeResult<()> {
    let archive = open_archive(config)?;

    match cmd {
        TrashCommands::List { search, format } => {
            let trash = match search.as_deref() {
                Some(term) => archive.search_trash(term).await?,
                None => archive.trash().await?,
            };

            match format {
                OutputFormat::Json => println!("{}", to_json("trash listing", &trash)?),
                OutputFormat::Human => {
                    println!(
                        "{:<36}  {:<20}  {:<20}  {:>8}",
                        "ID", "Created", "Character", "Seed"
                    );
                    println!("{:-<90}", "");
                    for image in &trash {
                        println!(
                            "{:<36}  {:<20}  {:<20}  {:>8}",
                            image.id(),
                            image.timestamp().format("%Y-%m-%d %H:%M:%S"),
                            image.prompts().character_name,
                            image.seed()
                        );
                    }
                    println!("Total: {} images", trash.len());
                }
            }
        }

        TrashCommands::Restore { ids, out } => {
            let exporter = Exporter::new(Arc::new(HttpImageFetcher::new()));
            let recovery = restore_trash_to_dir(&archive, &exporter, &ids, &out).await?;

            for (id, path) in recovery.restored() {
                println!("Restored {} to {}", id, path.display());
            }
            for id in recovery.unrecoverable() {
                eprintln!("Kept {} in trash: its image data was dropped to save space", id);
            }
            for (id, message) in recovery.failed() {
                eprintln!("Kept {} in trash: {}", id, message);
            }
            for id in recovery.missing() {
                eprintln!("{} is not in trash", id);
            }
        }

        TrashCommands::Delete { ids } => {
            let removed = archive.delete_from_trash(&ids).await?;
            println!("Deleted {} images", removed);
        }

        TrashCommands::Clear => {
            archive.clear_trash().await?;
            println!("Trash cleared");
        }
    }

    Ok(())
}
