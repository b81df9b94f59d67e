//! Writing images and zipped batches to disk.

use crate::{ImageSource, extension_for_mime, extension_for_url};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storyforge_core::GeneratedImage;
use storyforge_error::{ExportError, ExportErrorKind, StoryforgeResult};
use storyforge_interface::ImageFetcher;
use tracing::{debug, info, instrument};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Folder inside batch archives holding the images.
pub const ARCHIVE_FOLDER: &str = "generated-images";

/// Image bytes ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// Raw bytes
    pub data: Vec<u8>,
    /// File extension without the dot
    pub extension: &'static str,
}

/// Exports generated images, downloading remote ones through an [`ImageFetcher`].
pub struct Exporter {
    fetcher: Arc<dyn ImageFetcher>,
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter").finish_non_exhaustive()
    }
}

impl Exporter {
    /// Exporter fetching remote images with `fetcher`.
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Resolve an image's bytes and extension.
    pub async fn load(&self, image: &GeneratedImage) -> StoryforgeResult<ImagePayload> {
        match ImageSource::parse(image.url())? {
            ImageSource::Embedded { mime, data } => Ok(ImagePayload {
                data,
                extension: extension_for_mime(&mime),
            }),
            ImageSource::Remote(url) => {
                let data = self.fetcher.fetch(url).await?;
                Ok(ImagePayload {
                    data,
                    extension: extension_for_url(url),
                })
            }
        }
    }

    /// Write one image to `dir` as `generated-image-{seed}.{ext}`.
    ///
    /// # Returns
    ///
    /// Path of the written file.
    #[instrument(skip(self, image, dir), fields(id = %image.id(), seed = image.seed()))]
    pub async fn export_image(
        &self,
        image: &GeneratedImage,
        dir: &Path,
    ) -> StoryforgeResult<PathBuf> {
        let payload = self.load(image).await?;
        let path = dir.join(image_file_name(image, payload.extension));
        write_atomic(&path, &payload.data).await?;

        info!(path = %path.display(), bytes = payload.data.len(), "Exported image");
        Ok(path)
    }

    /// Zip every image into `dir/generated-images-{timestamp}.zip`.
    ///
    /// All images are resolved concurrently before anything is written; if
    /// any of them fails, no archive is created.
    ///
    /// # Errors
    ///
    /// Returns [`ExportErrorKind::EmptyBatch`] when `images` is empty.
    #[instrument(skip(self, images, dir), fields(count = images.len()))]
    pub async fn export_batch(
        &self,
        images: &[GeneratedImage],
        dir: &Path,
    ) -> StoryforgeResult<PathBuf> {
        if images.is_empty() {
            return Err(ExportError::new(ExportErrorKind::EmptyBatch).into());
        }

        let payloads =
            futures::future::try_join_all(images.iter().map(|image| self.load(image))).await?;
        debug!("Resolved all images");

        let entries: Vec<(String, Vec<u8>)> = images
            .iter()
            .zip(payloads)
            .enumerate()
            .map(|(index, (image, payload))| {
                (
                    archive_entry_name(index, image, payload.extension),
                    payload.data,
                )
            })
            .collect();

        let archive = tokio::task::spawn_blocking(move || build_zip(&entries))
            .await
            .map_err(|e| ExportError::new(ExportErrorKind::Archive(e.to_string())))??;

        let path = dir.join(archive_file_name(chrono::Utc::now()));
        write_atomic(&path, &archive).await?;

        info!(path = %path.display(), bytes = archive.len(), "Exported batch");
        Ok(path)
    }
}

/// File name for a single exported image.
pub fn image_file_name(image: &GeneratedImage, extension: &str) -> String {
    format!("generated-image-{}.{}", image.seed(), extension)
}

/// Entry name of the image at `index` inside a batch archive.
pub fn archive_entry_name(index: usize, image: &GeneratedImage, extension: &str) -> String {
    format!(
        "{}/image-{}-seed-{}.{}",
        ARCHIVE_FOLDER,
        index + 1,
        image.seed(),
        extension
    )
}

/// Archive file name for a batch exported at `now`.
pub fn archive_file_name(now: chrono::DateTime<chrono::Utc>) -> String {
    format!(
        "generated-images-{}.zip",
        now.format("%Y-%m-%dT%H-%M-%S-%3fZ")
    )
}

fn build_zip(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>, ExportError> {
    let archive_err = |e: &dyn std::fmt::Display| {
        ExportError::new(ExportErrorKind::Archive(e.to_string()))
    };

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, data) in entries {
        writer
            .start_file(name.as_str(), options)
            .map_err(|e| archive_err(&e))?;
        writer.write_all(data).map_err(|e| archive_err(&e))?;
    }

    let cursor = writer.finish().map_err(|e| archive_err(&e))?;
    Ok(cursor.into_inner())
}

/// Write via a temp file and rename, so a failed write leaves nothing behind.
async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), ExportError> {
    let write_err = |p: &Path, e: std::io::Error| {
        ExportError::new(ExportErrorKind::Write {
            path: p.display().to_string(),
            message: e.to_string(),
        })
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| write_err(parent, e))?;
    }

    let temp_path = path.with_extension("part");
    tokio::fs::write(&temp_path, data)
        .await
        .map_err(|e| write_err(&temp_path, e))?;
    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(|e| write_err(path, e))?;
    Ok(())
}
