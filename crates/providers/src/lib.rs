//! Generation client implementations for Vigil.
//!
//! All clients implement the `vigil_core::GenerationClient` trait.
//! [`router::build_from_config`] picks the right one from configuration.

pub mod openai_compat;
pub mod router;
pub mod unconfigured;

pub use openai_compat::OpenAiCompatClient;
pub use router::build_from_config;
pub use unconfigured::UnconfiguredClient;
