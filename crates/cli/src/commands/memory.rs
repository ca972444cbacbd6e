//! `vigil memory` — Archive inspection commands.

use std::path::Path;
use vigil_core::memory::{Fragment, MemoryStore, RelevanceFilter};
use vigil_engine::ContextAssembler;
use vigil_memory::KeywordFilter;

use crate::setup::{ArchiveSource, load_config};

pub async fn list(memory: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let source = ArchiveSource::resolve(&config, memory);
    let store = source.open()?;
    let fragments = store.fragments().await?;

    println!("🗄  Memory Archive — {source}");
    println!("==============================");
    if fragments.is_empty() {
        println!("   Archive is empty.");
        return Ok(());
    }

    for (i, fragment) in fragments.iter().enumerate() {
        print_fragment(i + 1, fragment);
    }
    println!();
    println!("   {} fragments", fragments.len());
    Ok(())
}

pub async fn search(text: &str, memory: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let store = ArchiveSource::resolve(&config, memory).open()?;

    println!("🔍 Scanning memory for: \"{text}\"");
    println!();

    let selected = KeywordFilter::new().select(text, &store).await;
    if selected.is_empty() {
        println!("   No relevant fragments. The prompt would carry: {}", vigil_engine::context::NO_DATA_SENTINEL);
        return Ok(());
    }

    println!("   Identified {} relevant memory fragments:", selected.len());
    println!();
    for block in selected.iter().map(ContextAssembler::render) {
        println!("   {block}");
    }
    Ok(())
}

fn print_fragment(index: usize, fragment: &Fragment) {
    println!(
        "  {index:>2}. {} [{}] {}",
        fragment.id, fragment.provenance, fragment.title
    );
    println!(
        "      scores: semantic={:.2}, lexical={:.2}  created: {}",
        fragment.semantic_score,
        fragment.lexical_score,
        fragment.created_at.format("%Y-%m-%d %H:%M")
    );
    if !fragment.tags.is_empty() {
        println!("      tags: {}", fragment.tags.join(", "));
    }
}
