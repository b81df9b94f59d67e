//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the storyforge binary.

mod commands;
mod export;
mod generate;
mod history;
mod trash;

pub use commands::{Cli, Commands};
pub use export::handle_export_command;
pub use generate::handle_generate_command;
pub use history::handle_history_command;
pub use trash::handle_trash_command;

use std::path::Path;
use std::sync::Arc;
use storyforge::{
    Archive, ExportError, ExportErrorKind, FileSystemStore, JsonError, StoryforgeResult,
    StudioConfig,
};

/// Archive backed by the configured document directory.
fn open_archive(config: &StudioConfig) -> StoryforgeResult<Archive> {
    let dir = config.storage().resolve_dir()?;
    let store = FileSystemStore::new(dir, *config.storage().quota_bytes())?;
    Ok(Archive::new(Arc::new(store), config.archive().clone()))
}

async fn ensure_dir(dir: &Path) -> StoryforgeResult<()> {
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        ExportError::new(ExportErrorKind::Write {
            path: dir.display().to_string(),
            message: e.to_string(),
        })
        .into()
    })
}

fn to_json<T: serde::Serialize>(document: &str, value: &T) -> StoryforgeResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| JsonError::new(document, e.to_string()).into())
}
