//! # tb - Beacon-aligned taskwarrior wrapper
//!
//! A taskwarrior front-end that enriches to-do items with structured
//! metadata suggested by a text-generation service, and renders a
//! cross-project work queue respecting per-group quotas.
//!
//! ## Key Commands
//!
//! - `tb add <description>` - Create a task, reviewing suggested metadata
//!   (beacon tags, project, priority, dates, effort/impact/estimate/fun)
//!   before committing
//! - `tb enrich [filter]` - Walk existing untagged pending tasks through the
//!   suggestion service, one at a time
//! - `tb focus` - Show a quota-balanced, urgency-ordered work queue
//! - `tb <anything else>` - Passed straight through to `task`
//!
//! Configuration lives in `~/.config/taskbeacon/config.toml`: the suggestion
//! backend (`anthropic`, `openai` or `ollama`), the beacon catalog, project
//! keyword rules and focus-group quotas. Task data never leaves taskwarrior;
//! all persistence goes through the `task` binary.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod cmd;
pub mod config;
pub mod focus;
pub mod llm;
pub mod store;
pub mod task;
pub mod tui {
    pub mod colors;
    pub mod add;
    pub mod enrich;
    pub mod event;
    pub mod focus;
    pub mod form;
    pub mod input;
    pub mod run;
}

use cli::Cli;
use cmd::*;
use config::Config;

fn main() {
    // Diagnostics go to stderr so they never corrupt the TUI or completion
    // scripts on stdout. Off by default; enable with RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Add { description } => match llm::new_provider(&config) {
            Ok(provider) => cmd_add(config, Arc::from(provider), description),
            Err(e) => {
                eprintln!("Failed to set up the suggestion service: {e}");
                std::process::exit(1);
            }
        },
        Commands::Enrich { filter } => match llm::new_provider(&config) {
            Ok(provider) => cmd_enrich(config, Arc::from(provider), filter),
            Err(e) => {
                eprintln!("Failed to set up the suggestion service: {e}");
                std::process::exit(1);
            }
        },
        Commands::Focus => cmd_focus(config),
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
        Commands::Task(args) => cmd_passthrough(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
