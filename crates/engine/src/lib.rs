//! # Vigil Engine
//!
//! The retrieval-augmented conversation engine: for each directive it
//! scans memory, bounds and assembles the archival context, composes the
//! prompt, streams the generated reply into history, and reconciles the
//! result under a fixed lifecycle (finalized, offline fallback, failure,
//! cancellation).
//!
//! ```text
//! submit ─▶ RelevanceFilter ─▶ ContextLimit ─▶ ContextAssembler ─▶ compose_prompt ─▶ GenerationClient
//!                                                                                        │
//!                                     History ◀── increments ◀───────────────────────────┘
//! ```

pub mod context;
pub mod engine;
pub mod event;
pub mod prompt;
pub mod state;

pub use context::{AssembledContext, ContextAssembler, ContextBlock, ContextLimit};
pub use engine::{
    CancelHandle, ConversationEngine, EngineSettings, ERROR_NOTICE, OFFLINE_NOTICE, Pipeline,
    SCANNING_NOTICE, identified_notice,
};
pub use event::{EngineEvent, EventBus};
pub use prompt::{DEFAULT_PERSONA, compose_prompt};
pub use state::{PipelineOutcome, PipelineState};
