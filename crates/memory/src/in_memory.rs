//! In-memory fragment store — the default store for console sessions.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use vigil_core::error::MemoryError;
use vigil_core::memory::{Fragment, MemoryStore};

/// A fragment store that keeps fragments in a Vec, in insertion order.
///
/// The engine treats it as read-only; fragments are added while seeding.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    fragments: Arc<RwLock<Vec<Fragment>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a list of fragments, validating each one.
    pub fn with_fragments(fragments: Vec<Fragment>) -> Result<Self, MemoryError> {
        let mut seen = HashSet::new();
        for fragment in &fragments {
            fragment.validate()?;
            if !seen.insert(fragment.id.as_str()) {
                return Err(MemoryError::DuplicateId(fragment.id.clone()));
            }
        }
        debug!(count = fragments.len(), "In-memory store seeded");
        Ok(Self {
            fragments: Arc::new(RwLock::new(fragments)),
        })
    }

    /// Add a fragment. Ids must be unique and scores within [0, 1].
    pub async fn insert(&self, fragment: Fragment) -> Result<(), MemoryError> {
        fragment.validate()?;
        let mut fragments = self.fragments.write().await;
        if fragments.iter().any(|f| f.id == fragment.id) {
            return Err(MemoryError::DuplicateId(fragment.id));
        }
        fragments.push(fragment);
        Ok(())
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn fragments(&self) -> Result<Vec<Fragment>, MemoryError> {
        Ok(self.fragments.read().await.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<Fragment>, MemoryError> {
        let fragments = self.fragments.read().await;
        Ok(fragments.iter().find(|f| f.id == id).cloned())
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.fragments.read().await.len())
    }
}
