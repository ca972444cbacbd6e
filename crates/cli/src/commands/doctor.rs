//! `vigil doctor` — Diagnose setup problems.

use std::path::Path;
use vigil_config::AppConfig;
use vigil_core::memory::MemoryStore;

use crate::setup::{ArchiveSource, build_engine};

pub async fn run(memory: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Vigil Doctor — System Diagnostics");
    println!("====================================\n");

    let mut issues = 0;

    // Check config
    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file — run `vigil config init` (defaults in use)");
        issues += 1;
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  Fix the config file and re-run.");
            return Ok(());
        }
    };

    // Check archive
    let source = ArchiveSource::resolve(&config, memory);
    let store = match source.open() {
        Ok(store) => {
            println!(
                "  ✅ Archive loaded: {} fragments ({source})",
                store.count().await?
            );
            store
        }
        Err(e) => {
            println!("  ❌ Archive unreadable: {e}");
            issues += 1;
            vigil_memory::InMemoryStore::new()
        }
    };

    // Check backend
    let engine = build_engine(&config, store);
    if engine.client_name() == "unconfigured" {
        println!("  ⚠️  No API key for '{}' — directives will be answered offline", config.default_provider);
        issues += 1;
    } else {
        println!(
            "  ✅ Generation backend: {} ({})",
            engine.client_name(),
            engine.settings().model
        );
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
