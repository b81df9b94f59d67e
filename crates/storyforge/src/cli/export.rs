//! `export` command handler.

use super::{ensure_dir, open_archive};
use std::path::Path;
use std::sync::Arc;
use storyforge::{
    ExportError, ExportErrorKind, Exporter, HttpImageFetcher, StoryforgeResult, StudioConfig,
};
use uuid::Uuid;

/// Export a saved generation, or one image from it.
pub async fn handle_export_command(
    config: &StudioConfig,
    generation_id: Uuid,
    image_id: Option<Uuid>,
    out: &Path,
) -> StoryforgeResult<()> {
    let archive = open_archive(config)?;
    let generation = archive
        .history()
        .await?
        .into_iter()
        .find(|generation| *generation.id() == generation_id)
        .ok_or_else(|| ExportError::new(ExportErrorKind::NotFound(generation_id.to_string())))?;

    ensure_dir(out).await?;
    let exporter = Exporter::new(Arc::new(HttpImageFetcher::new()));

    let path = match image_id {
        Some(image_id) => {
            let image = generation
                .images()
                .iter()
                .find(|image| *image.id() == image_id)
                .ok_or_else(|| ExportError::new(ExportErrorKind::NotFound(image_id.to_string())))?;
            exporter.export_image(image, out).await?
        }
        None => exporter.export_batch(generation.images(), out).await?,
    };

    println!("Saved {}", path.display());
    Ok(())
}
