//! Context limit — bounds how much archival data reaches one prompt.
//!
//! Applied by the engine after relevance selection and before assembly.
//! Fragments keep store order; once `max_fragments` are kept the rest are
//! dropped, and any fragment whose rendered block would push the block
//! total past `max_chars` is skipped (later, shorter fragments may still
//! fit).

use serde::{Deserialize, Serialize};
use tracing::debug;
use vigil_config::EngineConfig;
use vigil_core::memory::Fragment;

use super::assembler::{BLOCK_SEPARATOR, ContextAssembler};

/// Upper bounds on the context block. `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextLimit {
    pub max_fragments: Option<usize>,
    pub max_chars: Option<usize>,
}

/// Why a fragment was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropReason {
    FragmentCap,
    CharBudget,
}

/// A fragment left out of the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedFragment {
    pub id: String,
    pub reason: DropReason,
}

/// Result of applying a [`ContextLimit`].
#[derive(Debug, Clone)]
pub struct LimitedContext {
    pub kept: Vec<Fragment>,
    pub dropped: Vec<DroppedFragment>,
}

impl ContextLimit {
    pub const fn unlimited() -> Self {
        Self {
            max_fragments: None,
            max_chars: None,
        }
    }

    /// Config values of zero mean "no limit".
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_fragments: (config.max_context_fragments > 0)
                .then_some(config.max_context_fragments),
            max_chars: (config.max_context_chars > 0).then_some(config.max_context_chars),
        }
    }

    pub fn apply(&self, fragments: Vec<Fragment>) -> LimitedContext {
        let mut kept = Vec::new();
        let mut dropped = Vec::new();
        let mut used_chars = 0usize;

        for fragment in fragments {
            if self.max_fragments.is_some_and(|max| kept.len() >= max) {
                dropped.push(DroppedFragment {
                    id: fragment.id,
                    reason: DropReason::FragmentCap,
                });
                continue;
            }

            let mut cost = ContextAssembler::render(&fragment).chars().count();
            if !kept.is_empty() {
                cost += BLOCK_SEPARATOR.len();
            }

            if self.max_chars.is_some_and(|max| used_chars + cost > max) {
                dropped.push(DroppedFragment {
                    id: fragment.id,
                    reason: DropReason::CharBudget,
                });
                continue;
            }

            used_chars += cost;
            kept.push(fragment);
        }

        for drop in &dropped {
            debug!(fragment = %drop.id, reason = ?drop.reason, "Fragment dropped from context");
        }

        LimitedContext { kept, dropped }
    }
}

impl Default for ContextLimit {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
