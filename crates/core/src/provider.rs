//! Generation client trait — the abstraction over language-model backends.
//!
//! A client takes one composed prompt and produces a finite, forward-only
//! stream of text increments. The stream is a `tokio::sync::mpsc` receiver:
//! it is consumed exactly once, and ends when a `done` chunk arrives or the
//! sender is dropped. A fault is delivered either as the `Err` return of
//! [`GenerationClient::generate`] (before anything is produced) or as an
//! `Err` item inside the stream.
//!
//! Implementations: OpenAI-compatible endpoints, an unconfigured (offline)
//! stand-in, and scripted mocks in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use crate::error::ProviderError;

/// A single generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The model to use (e.g., "anthropic/claude-sonnet-4", "gpt-4o")
    pub model: String,

    /// The composed prompt: persona, context block, directive
    pub prompt: String,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.7
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature: default_temperature(),
            max_tokens: None,
        }
    }
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A single increment in a streaming response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Partial content delta
    #[serde(default)]
    pub content: Option<String>,

    /// Whether this is the final chunk
    #[serde(default)]
    pub done: bool,

    /// Usage info (typically only in the final chunk)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl StreamChunk {
    /// A content increment.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// The end-of-stream marker.
    pub fn finished(usage: Option<Usage>) -> Self {
        Self {
            content: None,
            done: true,
            usage,
        }
    }
}

/// The receiving half of an increment stream.
pub type IncrementStream = mpsc::Receiver<Result<StreamChunk, ProviderError>>;

/// The core GenerationClient trait.
///
/// The conversation engine calls `generate()` without knowing which backend
/// is behind it.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// A human-readable name for this client (e.g., "openrouter").
    fn name(&self) -> &str;

    /// Whether a usable backend is configured.
    ///
    /// When this returns `false` the engine skips `generate()` and takes the
    /// offline path.
    fn is_available(&self) -> bool {
        true
    }

    /// Start generating a response for `request`.
    async fn generate(&self, request: GenerationRequest) -> Result<IncrementStream, ProviderError>;
}

/// Build an increment stream from a fixed list of items.
///
/// Handy for non-streaming backends and tests.
pub fn stream_from(items: Vec<Result<StreamChunk, ProviderError>>) -> IncrementStream {
    let (tx, rx) = mpsc::channel(items.len().max(1));
    for item in items {
        // Capacity covers every item, so this never fails.
        let _ = tx.try_send(item);
    }
    rx
}
