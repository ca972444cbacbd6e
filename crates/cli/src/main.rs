//! Vigil CLI — the main entry point.
//!
//! Commands:
//! - `console`  — Interactive console or single-directive mode
//! - `memory`   — Inspect the fragment archive
//! - `config`   — Show, initialize, or validate configuration
//! - `doctor`   — Diagnose setup problems

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod render;
mod setup;

#[derive(Parser)]
#[command(
    name = "vigil",
    about = "Vigil — retrieval-augmented command console",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON file of memory fragments (overrides memory.seed_path)
    #[arg(long, global = true, env = "VIGIL_MEMORY")]
    memory: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue directives to the console
    Console {
        /// Send a single directive instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Inspect the memory archive
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose setup problems
    Doctor,
}

#[derive(Subcommand)]
enum MemoryAction {
    /// List every fragment in the archive
    List,

    /// Show the fragments the relevance filter selects for a directive
    Search {
        /// Directive text to match against
        text: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (keys redacted)
    Show,

    /// Write a default config file if none exists
    Init,

    /// Print the config file path
    Path,

    /// Check the config file for problems
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let memory = cli.memory.as_deref();

    match cli.command {
        Commands::Console { message } => commands::console::run(message, memory).await?,
        Commands::Memory { action } => match action {
            MemoryAction::List => commands::memory::list(memory).await?,
            MemoryAction::Search { text } => commands::memory::search(&text, memory).await?,
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show().await?,
            ConfigAction::Init => commands::config::init().await?,
            ConfigAction::Path => commands::config::path().await?,
            ConfigAction::Validate => commands::config::validate().await?,
        },
        Commands::Doctor => commands::doctor::run(memory).await?,
    }

    Ok(())
}
