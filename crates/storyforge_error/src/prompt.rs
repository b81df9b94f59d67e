//! Prompt and scene generation error types.

/// Specific error conditions for prompt assembly and scene generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PromptErrorKind {
    /// No usable scene text survived generation
    #[display("Please enter at least one valid prompt scene")]
    NoValidScenes,
    /// Source answered, but with a corpus that cannot be sampled
    #[display("Scene corpus unavailable: {}", _0)]
    CorpusUnavailable(String),
}

/// Error type for prompt operations.
///
/// # Examples
///
/// ```
/// use storyforge_error::{PromptError, PromptErrorKind};
///
/// let err = PromptError::new(PromptErrorKind::NoValidScenes);
/// assert!(format!("{}", err).contains("at least one valid prompt scene"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Prompt Error: {} at line {} in {}", kind, line, file)]
pub struct PromptError {
    /// The specific error condition
    pub kind: PromptErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl PromptError {
    /// Create a new PromptError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PromptErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
