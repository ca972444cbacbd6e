//! Unconfigured client — stands in when no usable backend exists.
//!
//! The engine sees `is_available() == false` and takes the offline path;
//! `generate` reports the same precondition failure if called anyway.

use async_trait::async_trait;
use vigil_core::error::ProviderError;
use vigil_core::provider::{GenerationClient, GenerationRequest, IncrementStream};

/// A client with no backend behind it.
pub struct UnconfiguredClient {
    reason: String,
}

impl UnconfiguredClient {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl GenerationClient for UnconfiguredClient {
    fn name(&self) -> &str {
        "unconfigured"
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn generate(&self, _request: GenerationRequest) -> Result<IncrementStream, ProviderError> {
        Err(ProviderError::NotConfigured(self.reason.clone()))
    }
}
