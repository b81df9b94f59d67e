//! Filesystem-backed key-value store.
//!
//! Each key is one JSON document on disk at `{base_path}/{key}.json`.

use crate::KeyValueStore;
use crate::store::{quota_exceeded, validate_key};
use std::path::{Path, PathBuf};
use storyforge_error::{StorageError, StorageErrorKind, StoryforgeResult};

const DOCUMENT_EXTENSION: &str = "json";

/// Filesystem key-value store with an optional directory-wide quota.
///
/// Writes go to a temp file first and are renamed into place, so a failed
/// write never leaves a half-written document behind.
#[derive(Debug, Clone)]
pub struct FileSystemStore {
    base_path: PathBuf,
    quota_bytes: Option<u64>,
}

impl FileSystemStore {
    /// Create a store rooted at `base_path`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    #[tracing::instrument(skip(base_path))]
    pub fn new(base_path: impl Into<PathBuf>, quota_bytes: Option<u64>) -> StoryforgeResult<Self> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;

        tracing::info!(path = %base_path.display(), ?quota_bytes, "Opened filesystem store");
        Ok(Self {
            base_path,
            quota_bytes,
        })
    }

    /// Root directory of the store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.{}", key, DOCUMENT_EXTENSION))
    }

    /// Total size of every document except the one at `exclude`.
    async fn used_bytes_excluding(&self, exclude: &Path) -> Result<u64, StorageError> {
        let read_err = |e: std::io::Error| {
            StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                self.base_path.display(),
                e
            )))
        };

        let mut entries = tokio::fs::read_dir(&self.base_path).await.map_err(read_err)?;
        let mut total = 0;
        while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
            let path = entry.path();
            if path == exclude
                || path.extension().and_then(|e| e.to_str()) != Some(DOCUMENT_EXTENSION)
            {
                continue;
            }
            total += entry.metadata().await.map_err(read_err)?.len();
        }
        Ok(total)
    }
}

#[async_trait::async_trait]
impl KeyValueStore for FileSystemStore {
    #[tracing::instrument(skip(self))]
    async fn get(&self, key: &str) -> StoryforgeResult<Option<String>> {
        validate_key(key)?;
        let path = self.path_for(key);

        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                path.display(),
                e
            )))
            .into()),
        }
    }

    #[tracing::instrument(skip(self, value), fields(size = value.len()))]
    async fn set(&self, key: &str, value: &str) -> StoryforgeResult<()> {
        validate_key(key)?;
        let path = self.path_for(key);

        if let Some(quota) = self.quota_bytes {
            let others = self.used_bytes_excluding(&path).await?;
            let available = quota.saturating_sub(others) as usize;
            if value.len() > available {
                tracing::debug!(needed = value.len(), available, "Filesystem store quota exceeded");
                return Err(quota_exceeded(key, value.len(), available).into());
            }
        }

        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, value).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;

        tokio::fs::rename(&temp_path, &path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
        })?;

        tracing::debug!(path = %path.display(), size = value.len(), "Stored document");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn remove(&self, key: &str) -> StoryforgeResult<()> {
        validate_key(key)?;
        let path = self.path_for(key);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Removed document");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::new(StorageErrorKind::FileRemove(format!(
                "{}: {}",
                path.display(),
                e
            )))
            .into()),
        }
    }
}
