//! Errors from encoding or decoding JSON documents.

/// JSON that could not be produced or read.
///
/// `document` names what was being handled, such as `"history listing"`.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("JSON Error in {}: {} at line {} in {}", document, message, line, file)]
pub struct JsonError {
    /// What was being encoded or decoded
    pub document: String,
    /// The underlying error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl JsonError {
    /// Create a JsonError for `document` at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use storyforge_error::JsonError;
    ///
    /// let err = JsonError::new("trash listing", "key must be a string");
    /// assert!(err.to_string().contains("trash listing"));
    /// ```
    #[track_caller]
    pub fn new(document: impl Into<String>, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            document: document.into(),
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
