//! Seed loading — populate a store from a JSON file of fragments.
//!
//! The file holds a JSON array of fragment objects:
//!
//! ```json
//! [
//!   {
//!     "id": "frag_001",
//!     "provenance": "document",
//!     "title": "Backbone migration",
//!     "body": "Move the relay mesh onto the new backbone.",
//!     "created_at": "2026-01-04T09:00:00Z",
//!     "semantic_score": 0.92,
//!     "lexical_score": 0.40,
//!     "tags": ["architecture"]
//!   }
//! ]
//! ```

use std::path::Path;
use tracing::info;
use vigil_core::error::MemoryError;
use vigil_core::memory::Fragment;

use crate::InMemoryStore;

/// Read fragments from a JSON file.
pub fn load_fragments(path: &Path) -> Result<Vec<Fragment>, MemoryError> {
    let content = std::fs::read_to_string(path).map_err(|e| MemoryError::LoadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_fragments(&content, &path.display().to_string())
}

/// Parse a JSON array of fragments. `origin` names the source in errors.
pub fn parse_fragments(content: &str, origin: &str) -> Result<Vec<Fragment>, MemoryError> {
    let fragments: Vec<Fragment> =
        serde_json::from_str(content).map_err(|e| MemoryError::LoadFailed {
            path: origin.to_string(),
            reason: e.to_string(),
        })?;

    info!(origin, count = fragments.len(), "Loaded memory fragments");
    Ok(fragments)
}

impl InMemoryStore {
    /// Build a store from a JSON seed file.
    pub fn from_json_file(path: &Path) -> Result<Self, MemoryError> {
        Self::with_fragments(load_fragments(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::memory::{MemoryStore, Provenance};

    const SEED: &str = r#"[
        {
            "id": "frag_001",
            "provenance": "document",
            "title": "Backbone migration",
            "body": "Move the relay mesh onto the new backbone.",
            "created_at": "2026-01-04T09:00:00Z",
            "semantic_score": 0.92,
            "lexical_score": 0.40,
            "tags": ["architecture"]
        },
        {
            "id": "frag_002",
            "provenance": "log",
            "title": "Night shift",
            "body": "Coolant pressure nominal.",
            "created_at": "2026-01-05T02:30:00Z"
        }
    ]"#;

    #[tokio::test]
    async fn loads_seed_file_into_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fragments.json");
        std::fs::write(&path, SEED).unwrap();

        let store = InMemoryStore::from_json_file(&path).unwrap();
        assert_eq!(store.count().await.unwrap(), 2);

        let second = store.get("frag_002").await.unwrap().unwrap();
        assert_eq!(second.provenance, Provenance::Log);
        assert!(second.tags.is_empty());
        assert_eq!(second.semantic_score, 0.0);
    }

    #[test]
    fn parse_error_names_origin() {
        let err = parse_fragments("[{}]", "built-in archive").unwrap_err();
        assert!(err.to_string().contains("built-in archive"));
    }

    #[test]
    fn missing_file_is_load_failure() {
        let err = load_fragments(Path::new("/nonexistent/fragments.json")).unwrap_err();
        assert!(matches!(err, MemoryError::LoadFailed { .. }));
    }

    #[test]
    fn malformed_json_is_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fragments.json");
        std::fs::write(&path, "{ not an array").unwrap();
        assert!(matches!(
            load_fragments(&path),
            Err(MemoryError::LoadFailed { .. })
        ));
    }

    #[test]
    fn out_of_range_score_in_seed_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fragments.json");
        std::fs::write(&path, SEED.replace("0.92", "1.92")).unwrap();
        assert!(matches!(
            InMemoryStore::from_json_file(&path),
            Err(MemoryError::ScoreOutOfRange { .. })
        ));
    }
}
