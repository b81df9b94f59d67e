//! `history` command handlers.

use super::commands::{HistoryCommands, OutputFormat};
use super::{open_archive, to_json};
use storyforge::{StoryforgeResult, StudioConfig};

/// Handle history subcommands.
pub async fn handle_history_command(
    config: &StudioConfig,
    cmd: HistoryCommands,
) -> StoryforgeResult<()> {
    let archive = open_archive(config)?;

    match cmd {
        HistoryCommands::List { search, format } => {
            let history = match search.as_deref() {
                Some(term) => archive.search_history(term).await?,
                None => archive.history().await?,
            };

            match format {
                OutputFormat::Json => println!("{}", to_json("history listing", &history)?),
                OutputFormat::Human => {
                    println!(
                        "{:<36}  {:<20}  {:<20}  {:<12}  {:>6}",
                        "ID", "Created", "Character", "Style", "Images"
                    );
                    println!("{:-<102}", "");
                    for generation in &history {
                        println!(
                            "{:<36}  {:<20}  {:<20}  {:<12}  {:>6}",
                            generation.id(),
                            generation.timestamp().format("%Y-%m-%d %H:%M:%S"),
                            generation.prompts().character_name,
                            generation.settings().style,
                            generation.images().len()
                        );
                    }
                    println!("Total: {} generations", history.len());
                }
            }
        }

        HistoryCommands::Delete { id } => match archive.delete_from_history(id).await? {
            Some(generation) => println!(
                "Deleted generation {}; moved {} images to trash",
                id,
                generation.images().len()
            ),
            None => eprintln!("No generation with id {}", id),
        },
    }

    Ok(())
}
