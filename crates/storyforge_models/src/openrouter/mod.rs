//! OpenRouter chat completions (OpenAI-compatible).

mod client;
mod dto;

pub use client::{OPENROUTER_API_KEY_ENV, OPENROUTER_API_URL, OpenRouterClient};
pub use dto::{ChatCompletionResponse, CompletionChoice, CompletionMessage};
