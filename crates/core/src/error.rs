//! Error types for the Vigil domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; the top-level `Error`
//! wraps them with `#[from]` conversions.

use thiserror::Error;

/// The top-level error type for all Vigil operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- History errors ---
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    // --- Submission errors ---
    #[error("Submission rejected: {0}")]
    Submit(#[from] SubmitError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Faults raised by a generation backend.
///
/// `NotConfigured` is the precondition failure (no usable backend) and is
/// handled differently from every other variant by the conversation engine.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Whether this error means "there is no usable backend at all",
    /// as opposed to a backend that failed while serving a request.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::NotConfigured(_))
    }
}

#[derive(Debug, Clone, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Duplicate fragment id: {0}")]
    DuplicateId(String),

    #[error("Score out of range for fragment {id}: {field} = {value}")]
    ScoreOutOfRange {
        id: String,
        field: &'static str,
        value: f32,
    },

    #[error("Failed to load fragments from {path}: {reason}")]
    LoadFailed { path: String, reason: String },
}

/// Invalid mutations of the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("Unknown message id: {0}")]
    UnknownMessage(u64),

    #[error("Message {open} is still open; cannot open another")]
    AlreadyOpen { open: u64 },

    #[error("Message {0} is not streaming")]
    NotStreaming(u64),

    #[error("Message {0} is frozen")]
    Frozen(u64),
}

/// Reasons a directive is refused by the conversation engine.
///
/// A rejected directive is never appended to history.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("directive is empty")]
    EmptyDirective,

    #[error("another directive is already in flight")]
    Busy,

    #[error("history refused the directive: {0}")]
    Rejected(#[from] HistoryError),
}
