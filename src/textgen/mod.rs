//! Optional text-generation capability.
//!
//! Used for AI-assisted recommendations and creative playlist naming. The
//! capability is best-effort: callers treat every [`TextGenError`] as a
//! signal to fall back to a deterministic path, never as a user-facing error.

mod openai;

use async_trait::async_trait;

pub use openai::{DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAiClient};

/// Errors from the text-generation capability.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TextGenError {
    #[error("Text generation is not configured")]
    Unavailable,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Text generation API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Text generation returned no content")]
    Empty,
}

/// A prompt-in, text-out generator.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> Result<String, TextGenError>;
}
