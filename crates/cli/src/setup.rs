//! Shared wiring: archive selection and engine construction.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vigil_config::AppConfig;
use vigil_core::error::MemoryError;
use vigil_engine::{ConversationEngine, EngineSettings};
use vigil_memory::{InMemoryStore, KeywordFilter, parse_fragments};

/// Sample archive used when no seed file is configured.
pub const BUILTIN_ARCHIVE: &str = include_str!("../data/archive.json");

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Where the fragment archive is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveSource {
    File(PathBuf),
    BuiltIn,
}

impl ArchiveSource {
    /// `--memory` wins over `memory.seed_path`; neither means the built-in archive.
    pub fn resolve(config: &AppConfig, override_path: Option<&Path>) -> Self {
        override_path
            .map(Path::to_path_buf)
            .or_else(|| config.memory.seed_path.as_deref().map(PathBuf::from))
            .map(Self::File)
            .unwrap_or(Self::BuiltIn)
    }

    pub fn open(&self) -> Result<InMemoryStore, MemoryError> {
        match self {
            Self::File(path) => InMemoryStore::from_json_file(path),
            Self::BuiltIn => {
                InMemoryStore::with_fragments(parse_fragments(BUILTIN_ARCHIVE, "built-in archive")?)
            }
        }
    }
}

impl fmt::Display for ArchiveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::BuiltIn => f.write_str("built-in sample archive"),
        }
    }
}

pub fn build_engine(config: &AppConfig, store: InMemoryStore) -> ConversationEngine {
    ConversationEngine::new(
        Arc::new(store),
        Arc::new(KeywordFilter::new()),
        vigil_providers::build_from_config(config),
        EngineSettings::from_config(config),
    )
}
