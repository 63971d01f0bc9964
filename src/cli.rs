use clap::Parser;

use crate::cmd::Commands;

/// Taskwarrior front-end with suggestion-assisted task capture and a
/// quota-balanced focus view. Unrecognised subcommands pass through to
/// `task` untouched.
#[derive(Parser)]
#[command(name = "tb", version, about = "Beacon-aligned taskwarrior wrapper")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}
