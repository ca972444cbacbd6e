//! Memory traits — the fragment store and relevance selection.
//!
//! The memory store holds previously captured content fragments, each with
//! provenance, tags and two precomputed relevance signals. The engine only
//! ever reads from it. Which fragments ground a directive is decided by a
//! [`RelevanceFilter`], so a keyword heuristic and a vector search can be
//! swapped without touching the engine.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::MemoryError;

/// Where a fragment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Captured from an earlier conversation
    Conversation,
    /// Ingested from a document
    Document,
    /// System or operations log
    Log,
    /// A directive issued by the operator
    Directive,
    /// Any other outside source
    External,
}

impl Provenance {
    /// Upper-case label used in context blocks.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Conversation => "CONVERSATION",
            Self::Document => "DOCUMENT",
            Self::Log => "LOG",
            Self::Directive => "DIRECTIVE",
            Self::External => "EXTERNAL",
        }
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single stored memory fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Unique, stable identifier
    pub id: String,

    /// Source of the fragment
    pub provenance: Provenance,

    /// Short title
    pub title: String,

    /// Free-text content
    pub body: String,

    /// When this fragment was captured
    pub created_at: DateTime<Utc>,

    /// Semantic-similarity signal in [0, 1]
    #[serde(default)]
    pub semantic_score: f32,

    /// Lexical-match signal in [0, 1]
    #[serde(default)]
    pub lexical_score: f32,

    /// Free-text tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Fragment {
    /// Check the score invariants.
    pub fn validate(&self) -> Result<(), MemoryError> {
        for (field, value) in [
            ("semantic_score", self.semantic_score),
            ("lexical_score", self.lexical_score),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(MemoryError::ScoreOutOfRange {
                    id: self.id.clone(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Read access to a fragment store.
///
/// Implementations must be safe to share across concurrent readers.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// The store name (e.g., "in_memory").
    fn name(&self) -> &str;

    /// All fragments in insertion order.
    async fn fragments(&self) -> Result<Vec<Fragment>, MemoryError>;

    /// Get a fragment by ID.
    async fn get(&self, id: &str) -> Result<Option<Fragment>, MemoryError>;

    /// Total fragment count.
    async fn count(&self) -> Result<usize, MemoryError>;
}

/// Selects the fragments that should ground a directive.
///
/// Selection never fails: when nothing matches, or the store cannot be
/// read, the result is empty.
#[async_trait]
pub trait RelevanceFilter: Send + Sync {
    /// The filter name (e.g., "keyword").
    fn name(&self) -> &str;

    /// Select fragments relevant to `directive`, in store order.
    async fn select(&self, directive: &str, store: &dyn MemoryStore) -> Vec<Fragment>;
}
