//! OpenAI-compatible chat completion response shapes.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Message inside a completion choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct CompletionMessage {
    /// Message role
    #[serde(default)]
    role: String,
    /// Message text; some providers send `null`
    #[serde(default)]
    content: Option<String>,
}

/// One completion choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct CompletionChoice {
    /// Choice position
    #[serde(default)]
    index: usize,
    /// Generated message
    message: CompletionMessage,
}

/// Chat completion response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ChatCompletionResponse {
    /// Provider response id
    #[serde(default)]
    id: Option<String>,
    /// Model that produced the answer
    #[serde(default)]
    model: Option<String>,
    /// Completion choices
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

impl ChatCompletionResponse {
    /// Text of the first choice, if it has any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_first_choice() {
        let body = r#"{"id":"gen-1","choices":[{"index":0,"message":{"role":"assistant","content":"hi"}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.first_content(), Some("hi"));
    }

    #[test]
    fn tolerates_null_content_and_no_choices() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.first_content(), None);

        let empty: ChatCompletionResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.first_content(), None);
    }
}
