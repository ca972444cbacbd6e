//! Keyword relevance filter.
//!
//! A fragment is relevant when its body contains the directive
//! (case-insensitive), or when one of its tags appears inside the directive
//! (case-insensitive). Results keep store order. This is a cheap stand-in
//! for semantic retrieval; the precomputed scores on each fragment are not
//! consulted.

use async_trait::async_trait;
use tracing::{debug, warn};
use vigil_core::memory::{Fragment, MemoryStore, RelevanceFilter};

/// Case-insensitive substring matcher over bodies and tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordFilter;

impl KeywordFilter {
    pub fn new() -> Self {
        Self
    }

    /// Whether `fragment` matches the lower-cased directive.
    pub fn matches(fragment: &Fragment, directive_lower: &str) -> bool {
        if fragment.body.to_lowercase().contains(directive_lower) {
            return true;
        }
        fragment
            .tags
            .iter()
            .filter(|t| !t.is_empty())
            .any(|t| directive_lower.contains(&t.to_lowercase()))
    }

    /// Apply the rule to an in-order slice of fragments.
    pub fn select_from(directive: &str, fragments: &[Fragment]) -> Vec<Fragment> {
        let directive_lower = directive.to_lowercase();
        fragments
            .iter()
            .filter(|f| Self::matches(f, &directive_lower))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RelevanceFilter for KeywordFilter {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn select(&self, directive: &str, store: &dyn MemoryStore) -> Vec<Fragment> {
        let fragments = match store.fragments().await {
            Ok(fragments) => fragments,
            Err(e) => {
                warn!(store = store.name(), "Memory scan failed: {e}");
                return Vec::new();
            }
        };

        let selected = Self::select_from(directive, &fragments);
        debug!(
            scanned = fragments.len(),
            selected = selected.len(),
            "Keyword scan complete"
        );
        selected
    }
}
