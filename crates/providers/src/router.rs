//! Client selection — builds the generation client named by config.

use std::sync::Arc;
use tracing::{info, warn};
use vigil_config::AppConfig;
use vigil_core::provider::GenerationClient;

use crate::openai_compat::OpenAiCompatClient;
use crate::unconfigured::UnconfiguredClient;

/// Build the default generation client from configuration.
///
/// Per-provider settings in `[providers.<name>]` take precedence over the
/// top-level `api_key`. Providers that need a key and have none yield an
/// [`UnconfiguredClient`], which sends the engine down the offline path.
pub fn build_from_config(config: &AppConfig) -> Arc<dyn GenerationClient> {
    let name = config.default_provider.as_str();
    let provider_config = config.providers.get(name);

    let api_key = provider_config
        .and_then(|p| p.api_key.clone())
        .or_else(|| config.api_key.clone())
        .unwrap_or_default();

    let base_url = provider_config
        .and_then(|p| p.api_url.clone())
        .unwrap_or_else(|| default_base_url(name));

    let keyless = is_local(name);

    if api_key.trim().is_empty() && !keyless {
        warn!(provider = name, "No API key configured; running offline");
        return Arc::new(UnconfiguredClient::new(format!(
            "no API key for provider '{name}'"
        )));
    }

    info!(provider = name, base_url = %base_url, "Generation client ready");
    let client = OpenAiCompatClient::new(name, base_url, api_key);
    if keyless {
        Arc::new(client.without_key_requirement())
    } else {
        Arc::new(client)
    }
}

/// Servers that run locally and accept any key.
fn is_local(provider_name: &str) -> bool {
    matches!(provider_name, "ollama" | "vllm" | "llamacpp" | "llama.cpp")
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "deepseek" => "https://api.deepseek.com/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "fireworks" => "https://api.fireworks.ai/inference/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}
