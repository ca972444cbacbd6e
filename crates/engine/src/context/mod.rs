//! Archival context for a single prompt.
//!
//! | Step | Component | Output |
//! |------|-----------|--------|
//! | 1. Bound | [`ContextLimit`] | fragments that fit the cap |
//! | 2. Render | [`ContextAssembler`] | reference blocks or the no-data sentinel |

pub mod assembler;
pub mod limit;

pub use assembler::{AssembledContext, ContextAssembler, ContextBlock, NO_DATA_SENTINEL};
pub use limit::{ContextLimit, DropReason, DroppedFragment, LimitedContext};
