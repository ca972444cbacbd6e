//! Context assembly — turns selected fragments into a prompt block.
//!
//! Each fragment renders as one reference block:
//!
//! ```text
//! [REF: frag_001 | DOCUMENT]: Move the relay mesh onto the new backbone.
//! ```
//!
//! Blocks are joined by a blank line in input order. An empty selection
//! yields [`ContextBlock::NoData`], which renders as the
//! [`NO_DATA_SENTINEL`] so the model is told explicitly that nothing was
//! found.
//!
//! # Determinism
//!
//! Assembly is pure: identical inputs always produce identical outputs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use vigil_core::memory::Fragment;

/// Placed in the prompt when no fragment was selected.
pub const NO_DATA_SENTINEL: &str = "NO ARCHIVAL DATA FOUND.";

/// Separator between two reference blocks.
pub const BLOCK_SEPARATOR: &str = "\n\n";

// ── Types ─────────────────────────────────────────────────────────────────

/// The archival section of a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextBlock {
    /// One or more rendered reference blocks.
    Found(String),
    /// Nothing was selected.
    NoData,
}

impl ContextBlock {
    /// The text placed into the prompt.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Found(text) => text,
            Self::NoData => NO_DATA_SENTINEL,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::NoData)
    }
}

impl fmt::Display for ContextBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembledContext {
    pub block: ContextBlock,
    /// Fragment id → display label (`<id> | <PROVENANCE>`).
    pub references: BTreeMap<String, String>,
}

impl AssembledContext {
    pub fn fragment_count(&self) -> usize {
        self.references.len()
    }
}

// ── Assembler ─────────────────────────────────────────────────────────────

/// Stateless renderer for selected fragments.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextAssembler;

impl ContextAssembler {
    pub fn new() -> Self {
        Self
    }

    /// `<id> | <PROVENANCE>`
    pub fn label(fragment: &Fragment) -> String {
        format!("{} | {}", fragment.id, fragment.provenance)
    }

    /// A single reference block.
    pub fn render(fragment: &Fragment) -> String {
        format!("[REF: {}]: {}", Self::label(fragment), fragment.body)
    }

    /// Render `fragments` in order into one block plus a reference map.
    pub fn assemble(&self, fragments: &[Fragment]) -> AssembledContext {
        if fragments.is_empty() {
            return AssembledContext {
                block: ContextBlock::NoData,
                references: BTreeMap::new(),
            };
        }

        let block = fragments
            .iter()
            .map(Self::render)
            .collect::<Vec<_>>()
            .join(BLOCK_SEPARATOR);

        let references = fragments
            .iter()
            .map(|f| (f.id.clone(), Self::label(f)))
            .collect();

        AssembledContext {
            block: ContextBlock::Found(block),
            references,
        }
    }
}
