//! Key-value store trait definition.

use storyforge_error::{StorageError, StorageErrorKind, StoryforgeResult};

/// Persistent string documents addressed by key.
///
/// Mirrors browser local storage: whole-document reads and writes, with a
/// size quota that rejects writes instead of truncating them.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the document stored under `key`.
    ///
    /// # Returns
    ///
    /// `None` if nothing is stored under the key.
    async fn get(&self, key: &str) -> StoryforgeResult<Option<String>>;

    /// Replace the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageErrorKind::QuotaExceeded`] when the write would not
    /// fit. A failed write leaves the previous document untouched.
    async fn set(&self, key: &str, value: &str) -> StoryforgeResult<()>;

    /// Remove the document stored under `key`. Missing keys are not an error.
    async fn remove(&self, key: &str) -> StoryforgeResult<()>;
}

#[async_trait::async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    async fn get(&self, key: &str) -> StoryforgeResult<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> StoryforgeResult<()> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> StoryforgeResult<()> {
        (**self).remove(key).await
    }
}

/// Check a key against the characters allowed by every backend.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        && !key.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(StorageError::new(StorageErrorKind::InvalidKey(
            key.to_string(),
        )))
    }
}

/// Error for a write of `needed` bytes when only `available` remain.
pub(crate) fn quota_exceeded(key: &str, needed: usize, available: usize) -> StorageError {
    StorageError::new(StorageErrorKind::QuotaExceeded {
        key: key.to_string(),
        needed,
        available,
    })
}
