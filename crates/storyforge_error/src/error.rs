//! Top-level error wrapper types.

use crate::{
    ConfigError, ExportError, HttpError, JsonError, ModelsError, PromptError, StorageError,
    ValidationError,
};

/// Every error condition a Storyforge operation can surface.
///
/// # Examples
///
/// ```
/// use storyforge_error::{StoryforgeError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: StoryforgeError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum StoryforgeErrorKind {
    /// HTTP error
    #[from(HttpError)]
    Http(HttpError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Input validation error
    #[from(ValidationError)]
    Validation(ValidationError),
    /// Prompt assembly or scene generation error
    #[from(PromptError)]
    Prompt(PromptError),
    /// Persistence error
    #[from(StorageError)]
    Storage(StorageError),
    /// Download/export error
    #[from(ExportError)]
    Export(ExportError),
    /// Remote API client error
    #[from(ModelsError)]
    Models(ModelsError),
}

/// Storyforge error with kind discrimination.
///
/// # Examples
///
/// ```
/// use storyforge_error::{StoryforgeError, StoryforgeResult, ConfigError};
///
/// fn might_fail() -> StoryforgeResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Storyforge Error: {}", _0)]
pub struct StoryforgeError(Box<StoryforgeErrorKind>);

impl StoryforgeError {
    /// Create a new error from a kind.
    pub fn new(kind: StoryforgeErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &StoryforgeErrorKind {
        &self.0
    }

    /// Storage error carried by this error, if any.
    pub fn as_storage(&self) -> Option<&StorageError> {
        match self.kind() {
            StoryforgeErrorKind::Storage(e) => Some(e),
            _ => None,
        }
    }

    /// Whether this error is a storage quota failure.
    pub fn is_quota_exceeded(&self) -> bool {
        self.as_storage().is_some_and(StorageError::is_quota_exceeded)
    }
}

// Generic From implementation for any type that converts to StoryforgeErrorKind
impl<T> From<T> for StoryforgeError
where
    T: Into<StoryforgeErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Storyforge operations.
///
/// # Examples
///
/// ```
/// use storyforge_error::{StoryforgeResult, HttpError};
///
/// fn fetch_data() -> StoryforgeResult<String> {
///     Err(HttpError::new("404 Not Found"))?
/// }
/// ```
pub type StoryforgeResult<T> = std::result::Result<T, StoryforgeError>;
