//! Writing trashed images back to disk.

use derive_getters::Getters;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use storyforge_core::GeneratedImage;
use storyforge_error::{ExportError, ExportErrorKind, StoryforgeResult};
use storyforge_export::Exporter;
use storyforge_storage::{Archive, PLACEHOLDER_IMAGE};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Per-image result of [`restore_trash_to_dir`].
///
/// Only images listed in `restored` leave the trash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
pub struct TrashRecovery {
    /// Written to disk and removed from trash
    restored: Vec<(Uuid, PathBuf)>,
    /// Image data was dropped to save space; still in trash
    unrecoverable: Vec<Uuid>,
    /// Export failed; still in trash
    failed: Vec<(Uuid, String)>,
    /// Not in trash
    missing: Vec<Uuid>,
}

/// Whether compression left anything worth writing out.
pub fn has_image_data(image: &GeneratedImage) -> bool {
    !image.url().is_empty() && image.url() != PLACEHOLDER_IMAGE
}

/// Export the trashed images named by `ids` into `dir`, then take the ones
/// that were written out of trash.
///
/// Images whose data was dropped, and images that fail to export, stay in
/// trash so nothing is lost.
///
/// # Errors
///
/// Reading trash, creating `dir`, or the final trash write.
#[instrument(skip(archive, exporter, ids), fields(requested = ids.len(), dir = %dir.display()))]
pub async fn restore_trash_to_dir(
    archive: &Archive,
    exporter: &Exporter,
    ids: &[Uuid],
    dir: &Path,
) -> StoryforgeResult<TrashRecovery> {
    let wanted: HashSet<&Uuid> = ids.iter().collect();
    let trashed: Vec<GeneratedImage> = archive
        .trash()
        .await?
        .into_iter()
        .filter(|image| wanted.contains(image.id()))
        .collect();

    let found: HashSet<&Uuid> = trashed.iter().map(|image| image.id()).collect();
    let mut recovery = TrashRecovery {
        missing: ids.iter().filter(|id| !found.contains(id)).copied().collect(),
        ..TrashRecovery::default()
    };
    if trashed.is_empty() {
        return Ok(recovery);
    }

    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        ExportError::new(ExportErrorKind::Write {
            path: dir.display().to_string(),
            message: e.to_string(),
        })
    })?;

    for image in &trashed {
        if !has_image_data(image) {
            warn!(id = %image.id(), "Image data was dropped to save space, leaving it in trash");
            recovery.unrecoverable.push(*image.id());
            continue;
        }
        match exporter.export_image(image, dir).await {
            Ok(path) => recovery.restored.push((*image.id(), path)),
            Err(e) => {
                warn!(id = %image.id(), error = %e, "Export failed, leaving image in trash");
                recovery.failed.push((*image.id(), e.to_string()));
            }
        }
    }

    if !recovery.restored.is_empty() {
        let written: Vec<Uuid> = recovery.restored.iter().map(|(id, _)| *id).collect();
        archive.restore_from_trash(&written).await?;
    }

    info!(
        restored = recovery.restored.len(),
        unrecoverable = recovery.unrecoverable.len(),
        failed = recovery.failed.len(),
        missing = recovery.missing.len(),
        "Trash restore finished"
    );
    Ok(recovery)
}
