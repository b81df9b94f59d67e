//! In-memory key-value store.

use crate::KeyValueStore;
use crate::store::{quota_exceeded, validate_key};
use std::collections::HashMap;
use std::sync::Mutex;
use storyforge_error::{StorageError, StorageErrorKind, StoryforgeResult};

/// Key-value store held in process memory.
///
/// Usage is counted as key length plus value length across all documents.
///
/// # Example
///
/// ```
/// use storyforge_storage::{InMemoryStore, KeyValueStore};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryStore::with_quota(16);
/// store.set("k", "small").await?;
/// assert!(store.set("k", "far too large for the quota").await.is_err());
/// assert_eq!(store.get("k").await?.as_deref(), Some("small"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    documents: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl InMemoryStore {
    /// Unlimited store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes once `quota_bytes` would be exceeded.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Bytes currently used by all documents.
    pub fn used_bytes(&self) -> usize {
        self.lock()
            .map(|docs| docs.iter().map(|(k, v)| k.len() + v.len()).sum())
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.documents.lock().map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!(
                "store lock poisoned: {}",
                e
            )))
        })
    }
}

#[async_trait::async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> StoryforgeResult<Option<String>> {
        validate_key(key)?;
        Ok(self.lock()?.get(key).cloned())
    }

    #[tracing::instrument(skip(self, value), fields(size = value.len()))]
    async fn set(&self, key: &str, value: &str) -> StoryforgeResult<()> {
        validate_key(key)?;
        let mut docs = self.lock()?;

        if let Some(quota) = self.quota_bytes {
            let others: usize = docs
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = key.len() + value.len();
            let available = quota.saturating_sub(others);
            if needed > available {
                tracing::debug!(needed, available, "In-memory store quota exceeded");
                return Err(quota_exceeded(key, needed, available).into());
            }
        }

        docs.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoryforgeResult<()> {
        validate_key(key)?;
        self.lock()?.remove(key);
        Ok(())
    }
}
