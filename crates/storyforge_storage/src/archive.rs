//! Capped history and trash collections over a [`KeyValueStore`].

use crate::{Compression, KeyValueStore, encode, encode_within_budget};
use derive_getters::Getters;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::HashSet;
use std::sync::Arc;
use storyforge_core::{GeneratedImage, Generation};
use storyforge_error::{StorageError, StorageErrorKind, StoryforgeResult};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Store key of the generation history document.
pub const HISTORY_KEY: &str = "imageGenerationHistory";

/// Store key of the trash document.
pub const TRASH_KEY: &str = "imageTrash";

/// Capacity limits for the archive.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(default)]
pub struct ArchiveConfig {
    /// Maximum generations kept in history
    #[serde(default = "default_history_cap")]
    history_cap: usize,

    /// Maximum images kept in trash
    #[serde(default = "default_trash_cap")]
    trash_cap: usize,

    /// Largest document the archive will attempt to write, in bytes
    #[serde(default)]
    max_document_bytes: Option<usize>,
}

fn default_history_cap() -> usize {
    20
}

fn default_trash_cap() -> usize {
    100
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            history_cap: default_history_cap(),
            trash_cap: default_trash_cap(),
            max_document_bytes: None,
        }
    }
}

impl ArchiveConfig {
    /// Create a builder.
    pub fn builder() -> ArchiveConfigBuilder {
        ArchiveConfigBuilder::default()
    }
}

/// How a collection ended up persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum PersistOutcome {
    /// Every item stored at the given compression level.
    #[display("stored ({})", _0)]
    Stored(Compression),
    /// Only the newest item fit; `dropped` older items were discarded.
    #[display("newest only ({} dropped)", dropped)]
    NewestOnly {
        /// Items left out of the document
        dropped: usize,
    },
}

impl PersistOutcome {
    /// Whether any image data or items were lost to make the write fit.
    pub fn is_degraded(&self) -> bool {
        !matches!(self, PersistOutcome::Stored(Compression::None))
    }
}

/// Persistent generation history and image trash.
///
/// Every mutation is a full read-modify-write of one capped, newest-first
/// collection. Mutations are serialized through an internal lock, so one
/// archive never interleaves its own writes.
pub struct Archive {
    store: Arc<dyn KeyValueStore>,
    config: ArchiveConfig,
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Archive {
    /// Create an archive over `store`.
    pub fn new(store: Arc<dyn KeyValueStore>, config: ArchiveConfig) -> Self {
        Self {
            store,
            config,
            write_lock: Mutex::new(()),
        }
    }

    /// Capacity limits in effect.
    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Generations, newest first.
    pub async fn history(&self) -> StoryforgeResult<Vec<Generation>> {
        self.load(HISTORY_KEY).await
    }

    /// Trashed images, newest first.
    pub async fn trash(&self) -> StoryforgeResult<Vec<GeneratedImage>> {
        self.load(TRASH_KEY).await
    }

    /// Record a generation at the front of history.
    ///
    /// A generation with the same id replaces the older entry. The oldest
    /// generations beyond the cap are evicted.
    #[instrument(skip(self, generation), fields(id = %generation.id(), images = generation.images().len()))]
    pub async fn save_to_history(&self, generation: Generation) -> StoryforgeResult<PersistOutcome> {
        let _guard = self.write_lock.lock().await;

        let mut history: Vec<Generation> = self.load(HISTORY_KEY).await?;
        history.retain(|g| g.id() != generation.id());
        history.insert(0, generation);
        history.truncate(self.config.history_cap);

        self.persist(HISTORY_KEY, &history).await
    }

    /// Move a generation's images to trash, then drop it from history.
    ///
    /// The two writes are sequential. If the second fails, the images are
    /// already in trash and the generation is still in history.
    ///
    /// # Returns
    ///
    /// The removed generation, or `None` if no generation has that id.
    #[instrument(skip(self))]
    pub async fn delete_from_history(&self, id: Uuid) -> StoryforgeResult<Option<Generation>> {
        let _guard = self.write_lock.lock().await;

        let history: Vec<Generation> = self.load(HISTORY_KEY).await?;
        let Some(generation) = history.iter().find(|g| *g.id() == id).cloned() else {
            debug!("Generation not in history");
            return Ok(None);
        };

        self.prepend_to_trash(generation.images().clone()).await?;

        let mut history: Vec<Generation> = self.load(HISTORY_KEY).await?;
        history.retain(|g| *g.id() != id);
        self.persist(HISTORY_KEY, &history).await?;

        info!(images = generation.images().len(), "Moved generation to trash");
        Ok(Some(generation))
    }

    /// Prepend images to trash, keeping their order.
    #[instrument(skip(self, images), fields(count = images.len()))]
    pub async fn save_to_trash(
        &self,
        images: Vec<GeneratedImage>,
    ) -> StoryforgeResult<PersistOutcome> {
        let _guard = self.write_lock.lock().await;
        self.prepend_to_trash(images).await
    }

    /// Remove and return the trashed images with the given ids.
    ///
    /// Unknown ids are ignored. When nothing matches the trash is left
    /// untouched.
    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    pub async fn restore_from_trash(&self, ids: &[Uuid]) -> StoryforgeResult<Vec<GeneratedImage>> {
        let _guard = self.write_lock.lock().await;

        let wanted: HashSet<&Uuid> = ids.iter().collect();
        let (restored, remaining): (Vec<_>, Vec<_>) = self
            .load::<GeneratedImage>(TRASH_KEY)
            .await?
            .into_iter()
            .partition(|img| wanted.contains(img.id()));

        if !restored.is_empty() {
            self.persist(TRASH_KEY, &remaining).await?;
            info!(restored = restored.len(), "Restored images from trash");
        }
        Ok(restored)
    }

    /// Permanently delete the trashed images with the given ids.
    ///
    /// # Returns
    ///
    /// Number of images removed.
    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    pub async fn delete_from_trash(&self, ids: &[Uuid]) -> StoryforgeResult<usize> {
        let _guard = self.write_lock.lock().await;

        let wanted: HashSet<&Uuid> = ids.iter().collect();
        let mut trash: Vec<GeneratedImage> = self.load(TRASH_KEY).await?;
        let before = trash.len();
        trash.retain(|img| !wanted.contains(img.id()));
        let removed = before - trash.len();

        if removed > 0 {
            self.persist(TRASH_KEY, &trash).await?;
        }
        Ok(removed)
    }

    /// Permanently delete everything in trash.
    #[instrument(skip(self))]
    pub async fn clear_trash(&self) -> StoryforgeResult<()> {
        let _guard = self.write_lock.lock().await;
        self.store.remove(TRASH_KEY).await?;
        info!("Cleared trash");
        Ok(())
    }

    /// Generations whose snapshot matches `term`, newest first.
    pub async fn search_history(&self, term: &str) -> StoryforgeResult<Vec<Generation>> {
        Ok(self
            .history()
            .await?
            .into_iter()
            .filter(|g| g.matches_search(term))
            .collect())
    }

    /// Trashed images whose snapshot matches `term`, newest first.
    pub async fn search_trash(&self, term: &str) -> StoryforgeResult<Vec<GeneratedImage>> {
        Ok(self
            .trash()
            .await?
            .into_iter()
            .filter(|img| img.matches_search(term))
            .collect())
    }

    async fn prepend_to_trash(
        &self,
        images: Vec<GeneratedImage>,
    ) -> StoryforgeResult<PersistOutcome> {
        let mut seen = HashSet::new();
        let incoming: Vec<GeneratedImage> = images
            .into_iter()
            .filter(|img| seen.insert(*img.id()))
            .collect();

        let mut trash: Vec<GeneratedImage> = self.load(TRASH_KEY).await?;
        trash.retain(|img| !seen.contains(img.id()));
        trash.splice(0..0, incoming);
        trash.truncate(self.config.trash_cap);

        self.persist(TRASH_KEY, &trash).await
    }

    /// Read a collection, treating a missing or corrupt document as empty.
    async fn load<T: DeserializeOwned>(&self, key: &str) -> StoryforgeResult<Vec<T>> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(items) => Ok(items),
            Err(e) => {
                warn!(key, error = %e, "Corrupt archive document, reading as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Write a collection, walking the compression ladder until it fits.
    async fn persist<T: Serialize>(&self, key: &str, items: &[T]) -> StoryforgeResult<PersistOutcome> {
        let budget = self.config.max_document_bytes;
        let mut attempt = match budget {
            Some(budget) => encode_within_budget(items, budget)?,
            None => Some((Compression::None, encode(items, Compression::None)?)),
        };
        if let Some((level, _)) = &attempt {
            if *level != Compression::None {
                debug!(key, %level, "Document over budget, starting further down the ladder");
            }
        }

        while let Some((level, json)) = attempt.take() {
            match self.store.set(key, &json).await {
                Ok(()) => {
                    if level != Compression::None {
                        warn!(key, %level, size = json.len(), "Stored with compressed images");
                    }
                    return Ok(PersistOutcome::Stored(level));
                }
                Err(e) if e.is_quota_exceeded() => {
                    debug!(key, %level, size = json.len(), "Quota exceeded, compressing further");
                    attempt = match level.next() {
                        Some(next) => Some((next, encode(items, next)?)),
                        None => None,
                    };
                }
                Err(e) => return Err(e),
            }
        }

        let newest = &items[..items.len().min(1)];
        let json = encode(newest, Compression::Drop)?;
        if let Some(b) = budget.filter(|b| json.len() > *b) {
            return Err(StorageError::new(StorageErrorKind::QuotaExceeded {
                key: key.to_string(),
                needed: json.len(),
                available: b,
            })
            .into());
        }
        self.store.set(key, &json).await?;

        let dropped = items.len() - newest.len();
        warn!(key, dropped, "Storage full, kept only the newest entry");
        Ok(PersistOutcome::NewestOnly { dropped })
    }
}
