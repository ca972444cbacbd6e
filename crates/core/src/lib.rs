//! # Vigil Core
//!
//! Domain types, traits, and error definitions for the Vigil command console.
//! This crate has **no framework dependencies** — it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the conversation engine is defined as a trait here.
//! Implementations live in their respective crates. This enables:
//! - Swapping the relevance heuristic for a vector search
//! - Easy testing with scripted generation clients
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod history;
pub mod memory;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{Error, HistoryError, MemoryError, ProviderError, Result, SubmitError};
pub use history::{History, HistorySnapshot, Mutation};
pub use memory::{Fragment, MemoryStore, Provenance, RelevanceFilter};
pub use message::{Message, MessageId, MessageStatus, Role};
pub use provider::{GenerationClient, GenerationRequest, IncrementStream, StreamChunk, Usage};
