//! Remote API client error types.

/// Error conditions raised by the image and LLM API clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ModelsErrorKind {
    /// Request could not be sent or the connection failed
    #[display("Request failed: {}", _0)]
    Http(String),
    /// Remote API answered with a non-success status
    #[display("API error ({}): {}", status, message)]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },
    /// Response body did not have the expected shape
    #[display("Failed to parse response: {}", _0)]
    Parse(String),
    /// Required credential is not configured
    #[display("Missing API key: {}", _0)]
    MissingApiKey(String),
    /// Builder error while assembling a request or response
    #[display("Builder error: {}", _0)]
    Builder(String),
}

/// Error type for remote API clients.
///
/// # Examples
///
/// ```
/// use storyforge_error::{ModelsError, ModelsErrorKind};
///
/// let err = ModelsError::new(ModelsErrorKind::Api { status: 502, message: "bad gateway".into() });
/// assert!(format!("{}", err).contains("502"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Models Error: {} at line {} in {}", kind, line, file)]
pub struct ModelsError {
    /// The specific error condition
    pub kind: ModelsErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ModelsError {
    /// Create a new ModelsError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ModelsErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
