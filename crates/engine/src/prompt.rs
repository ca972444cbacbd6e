//! Prompt composition.

use crate::context::ContextBlock;

/// Persona used when `engine.persona` is not configured.
pub const DEFAULT_PERSONA: &str = r#"You are VIGIL, the command console of this installation.
Answer the operator's directive concisely and precisely.
Ground your answer in the archival data below when it is relevant and cite
fragments by their REF identifier. If the archive holds nothing useful, say
so and answer from general knowledge."#;

/// Persona, archival data, then the literal directive.
pub fn compose_prompt(persona: &str, context: &ContextBlock, directive: &str) -> String {
    format!("{persona}\n\nARCHIVAL DATA:\n{context}\n\nDIRECTIVE:\n{directive}")
}
