//! Export error types.

/// Kinds of export errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ExportErrorKind {
    /// Batch export requested with no images
    #[display("No images to download")]
    EmptyBatch,
    /// Embedded data URI could not be decoded
    #[display("Invalid data URI: {}", _0)]
    InvalidDataUri(String),
    /// Remote image fetch failed
    #[display("Failed to fetch image {}: {}", url, message)]
    Fetch {
        /// Image URL
        url: String,
        /// Failure description
        message: String,
    },
    /// Zip archive could not be assembled
    #[display("Failed to build archive: {}", _0)]
    Archive(String),
    /// Output file could not be written
    #[display("Failed to write {}: {}", path, message)]
    Write {
        /// Destination path
        path: String,
        /// Failure description
        message: String,
    },
    /// Image with the given id is not in the current buffer
    #[display("Image not found: {}", _0)]
    NotFound(String),
}

/// Export error with location tracking.
///
/// # Examples
///
/// ```
/// use storyforge_error::{ExportError, ExportErrorKind};
///
/// let err = ExportError::new(ExportErrorKind::EmptyBatch);
/// assert!(format!("{}", err).contains("No images"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Export Error: {} at line {} in {}", kind, line, file)]
pub struct ExportError {
    /// The kind of error that occurred
    pub kind: ExportErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ExportError {
    /// Create a new export error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ExportErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
