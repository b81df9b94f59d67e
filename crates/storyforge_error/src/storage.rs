//! Storage error types.

/// Kinds of storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Failed to create storage directory
    #[display("Failed to create storage directory: {}", _0)]
    DirectoryCreation(String),
    /// Failed to write document
    #[display("Failed to write document: {}", _0)]
    FileWrite(String),
    /// Failed to read document
    #[display("Failed to read document: {}", _0)]
    FileRead(String),
    /// Failed to remove document
    #[display("Failed to remove document: {}", _0)]
    FileRemove(String),
    /// Writing the document would exceed the store quota
    #[display("Storage quota exceeded writing '{}': needed {} bytes, {} available", key, needed, available)]
    QuotaExceeded {
        /// Document key
        key: String,
        /// Bytes required by the write
        needed: usize,
        /// Bytes still available
        available: usize,
    },
    /// Invalid document key
    #[display("Invalid storage key: {}", _0)]
    InvalidKey(String),
    /// Document could not be serialized
    #[display("Failed to serialize document: {}", _0)]
    Serialization(String),
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use storyforge_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::InvalidKey("../etc".to_string()));
/// assert!(format!("{}", err).contains("Invalid storage key"));
/// assert!(!err.is_quota_exceeded());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether this error signals that the store ran out of room.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self.kind, StorageErrorKind::QuotaExceeded { .. })
    }
}
