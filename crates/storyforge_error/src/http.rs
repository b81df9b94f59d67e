//! Errors from fetching remote documents over HTTP.

/// A remote fetch that could not be sent, or that came back with a
/// non-success status.
///
/// Carries the URL and status when they are known, so a failed corpus
/// download says which file and which response it got.
#[derive(Debug, Clone, derive_more::Error)]
pub struct HttpError {
    /// Requested URL
    pub url: Option<String>,
    /// Response status, absent when no response arrived
    pub status: Option<u16>,
    /// Transport or server message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl HttpError {
    /// Error with only a message.
    ///
    /// # Examples
    ///
    /// ```
    /// use storyforge_error::HttpError;
    ///
    /// let err = HttpError::new("Connection refused");
    /// assert!(err.message.contains("Connection refused"));
    /// assert!(err.url.is_none());
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            url: None,
            status: None,
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }

    /// Error for a request to `url`.
    ///
    /// # Examples
    ///
    /// ```
    /// use storyforge_error::HttpError;
    ///
    /// let err = HttpError::request("https://host/solo.txt", "Not Found").with_status(404);
    /// let shown = err.to_string();
    /// assert!(shown.contains("404"));
    /// assert!(shown.contains("https://host/solo.txt"));
    /// assert!(!err.is_transient());
    /// ```
    #[track_caller]
    pub fn request(url: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::new(message);
        err.url = Some(url.into());
        err
    }

    /// Attach the response status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether retrying later might succeed: no response at all, a server
    /// error, or rate limiting.
    pub fn is_transient(&self) -> bool {
        match self.status {
            None => true,
            Some(status) => status >= 500 || status == 429,
        }
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP Error")?;
        if let Some(status) = self.status {
            write!(f, " {}", status)?;
        }
        if let Some(url) = &self.url {
            write!(f, " from {}", url)?;
        }
        write!(f, ": {} at line {} in {}", self.message, self.line, self.file)
    }
}
