//! `vigil config` — Configuration management commands.

use vigil_config::AppConfig;

use crate::setup::load_config;

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = redacted(load_config()?);
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    if config_path.exists() {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete it and re-run `vigil config init`.");
        return Ok(());
    }

    std::fs::create_dir_all(&config_dir)?;
    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ Created config.toml at: {}", config_path.display());
    println!();
    println!("📝 Next steps:");
    println!("   1. Add api_key to {} (or set VIGIL_API_KEY)", config_path.display());
    println!("   2. Optionally point memory.seed_path at a JSON fragment archive");
    println!("   3. Run: vigil console");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    };
    println!("   ✅ Config parsed successfully");

    let warnings = warnings(&config);
    if warnings.is_empty() {
        println!("   ✅ All checks passed");
    } else {
        println!();
        for w in &warnings {
            println!("   ⚠️  {w}");
        }
    }

    println!();
    println!("   Provider:  {}", config.default_provider);
    println!("   Model:     {}", config.default_model);
    println!(
        "   Context:   {} fragments / {} chars",
        config.engine.max_context_fragments, config.engine.max_context_chars
    );
    println!("   Delay:     {} ms", config.engine.observation_delay_ms);
    Ok(())
}

/// Non-fatal problems worth pointing out.
fn warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    let provider_key = config
        .providers
        .get(&config.default_provider)
        .is_some_and(|p| p.api_key.is_some());
    if !config.has_api_key() && !provider_key {
        warnings.push(
            "No API key set (set VIGIL_API_KEY, OPENROUTER_API_KEY or OPENAI_API_KEY); the console will run offline"
                .to_string(),
        );
    }

    if let Some(seed) = &config.memory.seed_path {
        if !std::path::Path::new(seed).exists() {
            warnings.push(format!("memory.seed_path does not exist: {seed}"));
        }
    }

    if config.engine.max_context_fragments == 0 && config.engine.max_context_chars == 0 {
        warnings.push("Context is unbounded (max_context_fragments = max_context_chars = 0)".into());
    }

    warnings
}

fn redacted(mut config: AppConfig) -> AppConfig {
    let mask = |key: &mut Option<String>| {
        if key.is_some() {
            *key = Some("***".into());
        }
    };
    mask(&mut config.api_key);
    for provider in config.providers.values_mut() {
        mask(&mut provider.api_key);
    }
    config
}
