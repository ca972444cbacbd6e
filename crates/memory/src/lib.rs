//! Memory store and relevance filter implementations for Vigil.

pub mod filter;
pub mod in_memory;
pub mod seed;

pub use filter::KeywordFilter;
pub use in_memory::InMemoryStore;
pub use seed::{load_fragments, parse_fragments};
