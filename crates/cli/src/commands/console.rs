//! `vigil console` — Interactive or single-directive mode.

use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;
use vigil_config::AppConfig;
use vigil_core::error::SubmitError;
use vigil_core::memory::MemoryStore;
use vigil_engine::{ConversationEngine, EngineEvent, PipelineOutcome, PipelineState};

use crate::render::ConsoleRenderer;
use crate::setup::{ArchiveSource, build_engine, load_config};

pub async fn run(
    message: Option<String>,
    memory: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let source = ArchiveSource::resolve(&config, memory);
    let store = source.open()?;
    let fragments = store.count().await?;
    let engine = build_engine(&config, store);
    let mut renderer = ConsoleRenderer::new();

    if let Some(directive) = message {
        // Single directive mode
        let outcome = dispatch(&engine, &mut renderer, directive).await?;
        if outcome.terminal == PipelineState::Failed {
            let reason = outcome
                .error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown fault".into());
            return Err(format!("Generation failed: {reason}").into());
        }
        return Ok(());
    }

    banner(&config, &engine, &source, fragments);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        let directive = line.trim();
        if matches!(directive, "exit" | "quit") {
            break;
        }

        match dispatch(&engine, &mut renderer, directive.to_string()).await {
            Ok(_) | Err(SubmitError::EmptyDirective) => {}
            Err(e) => eprintln!("  [Rejected] {e}"),
        }
        println!();
        prompt()?;
    }

    println!();
    println!("  Console closed.");
    println!();
    Ok(())
}

/// Submit one directive and render history until its pipeline finishes.
/// Ctrl+C cancels the pipeline instead of exiting.
async fn dispatch(
    engine: &ConversationEngine,
    renderer: &mut ConsoleRenderer,
    directive: String,
) -> Result<PipelineOutcome, SubmitError> {
    let mut events = engine.events();
    let pipeline = engine.submit(directive)?;
    let run = pipeline.run();
    tokio::pin!(run);

    let outcome = loop {
        tokio::select! {
            outcome = &mut run => break outcome,
            event = events.recv() => match event {
                Ok(event) => {
                    if let EngineEvent::HistoryChanged { snapshot } = event.as_ref() {
                        emit(&renderer.render(snapshot));
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Renderer lagged; resyncing");
                    emit(&renderer.render(&engine.snapshot()));
                }
                Err(RecvError::Closed) => {}
            },
            _ = tokio::signal::ctrl_c() => {
                engine.cancel();
            }
        }
    };

    emit(&renderer.render(&engine.snapshot()));
    debug!(terminal = %outcome.terminal, trace = ?outcome.trace, "Directive finished");
    Ok(outcome)
}

fn emit(text: &str) {
    if text.is_empty() {
        return;
    }
    print!("{text}");
    let _ = std::io::stdout().flush();
}

fn prompt() -> std::io::Result<()> {
    print!("  OPERATOR > ");
    std::io::stdout().flush()
}

fn banner(config: &AppConfig, engine: &ConversationEngine, source: &ArchiveSource, fragments: usize) {
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║         VIGIL — Command Console Online       ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", engine.settings().model);
    println!("  Archive:   {fragments} fragments ({source})");
    if engine.client_name() == "unconfigured" {
        println!("  Status:    OFFLINE (no API key configured)");
    }
    println!();
    println!("  Type a directive and press Enter.");
    println!("  Ctrl+C cancels a running directive; 'exit' quits.");
    println!();
}
