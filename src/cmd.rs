//! Command implementations for the CLI interface.
//!
//! Each subcommand builds its workflow state machine and hands it to the
//! shared event loop; anything not recognised here is forwarded verbatim to
//! the `task` binary.

use std::io;
use std::process::Command;
use std::sync::Arc;

use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::config::Config;
use crate::llm::Provider;
use crate::store::TaskCli;
use crate::tui::add::AddApp;
use crate::tui::enrich::EnrichApp;
use crate::tui::focus::FocusApp;
use crate::tui::run::{run_workflow, Services};

#[derive(Subcommand)]
pub enum Commands {
    /// Create a task, reviewing suggested metadata first.
    Add {
        /// Task description (joined with spaces).
        #[arg(required = true, trailing_var_arg = true)]
        description: Vec<String>,
    },

    /// Walk pending tasks without beacon tags through the suggestion
    /// service, one at a time.
    Enrich {
        /// Optional taskwarrior filter selecting the tasks to process.
        #[arg(trailing_var_arg = true)]
        filter: Vec<String>,
    },

    /// Show the quota-balanced focus view.
    Focus,

    /// Generate shell completions.
    Completions {
        /// Shell to generate the completion script for.
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Anything else is passed straight to `task`.
    #[command(external_subcommand)]
    Task(Vec<String>),
}

fn services(config: Arc<Config>, provider: Option<Arc<dyn Provider>>) -> Services {
    Services {
        config,
        store: Arc::new(TaskCli::new()),
        provider,
    }
}

pub fn cmd_add(
    config: Arc<Config>,
    provider: Arc<dyn Provider>,
    description: Vec<String>,
) -> io::Result<()> {
    let mut app = AddApp::new(description.join(" "));
    run_workflow(&mut app, &services(config, Some(provider)))
}

pub fn cmd_enrich(
    config: Arc<Config>,
    provider: Arc<dyn Provider>,
    filter: Vec<String>,
) -> io::Result<()> {
    let filter = if filter.is_empty() {
        None
    } else {
        Some(filter.join(" "))
    };
    let mut app = EnrichApp::new(filter);
    run_workflow(&mut app, &services(config, Some(provider)))
}

pub fn cmd_focus(config: Arc<Config>) -> io::Result<()> {
    let mut app = FocusApp::new(Arc::clone(&config));
    run_workflow(&mut app, &services(config, None))
}

pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

/// Forward an unrecognised subcommand to `task` with inherited stdio,
/// propagating its exit code.
pub fn cmd_passthrough(args: Vec<String>) -> io::Result<()> {
    let status = Command::new("task").args(&args).status()?;
    std::process::exit(status.code().unwrap_or(1));
}
