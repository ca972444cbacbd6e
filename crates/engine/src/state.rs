//! Pipeline lifecycle states and the outcome of one run.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use vigil_core::error::ProviderError;
use vigil_core::message::MessageId;
use vigil_core::provider::Usage;

/// Where a pipeline is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Submitted,
    Scanning,
    ContextReady,
    Generating,
    Finalized,
    FallbackOffline,
    Failed,
    Cancelled,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Finalized | Self::FallbackOffline | Self::Failed | Self::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitted => "submitted",
            Self::Scanning => "scanning",
            Self::ContextReady => "context_ready",
            Self::Generating => "generating",
            Self::Finalized => "finalized",
            Self::FallbackOffline => "fallback_offline",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a finished pipeline did.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub pipeline_id: Uuid,
    /// The terminal state reached.
    pub terminal: PipelineState,
    /// Every state entered, from `Submitted` to the terminal state.
    pub trace: Vec<PipelineState>,
    /// Fragments selected by the relevance filter (before the context limit).
    pub fragments: usize,
    /// Fragments actually placed in the prompt.
    pub fragments_used: usize,
    pub user_message: MessageId,
    /// The assistant message left in history, if any.
    pub assistant: Option<MessageId>,
    pub usage: Option<Usage>,
    pub error: Option<ProviderError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(PipelineState::Finalized.is_terminal());
        assert!(PipelineState::FallbackOffline.is_terminal());
        assert!(PipelineState::Failed.is_terminal());
        assert!(PipelineState::Cancelled.is_terminal());
        assert!(!PipelineState::Idle.is_terminal());
        assert!(!PipelineState::Generating.is_terminal());
    }

    #[test]
    fn display_is_snake_case() {
        assert_eq!(PipelineState::FallbackOffline.to_string(), "fallback_offline");
        assert_eq!(PipelineState::ContextReady.to_string(), "context_ready");
    }
}
