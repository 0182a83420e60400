//! The `tscut` command-line tool.
//!
//! This crate provides:
//! - Argument parsing for the `analyze`, `split`, `extract` and `clips` commands
//! - Configuration from the environment with command-line overrides
//! - Logging setup and terminal progress bars

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod progress;

pub use cli::{Cli, Command};
pub use config::TscutConfig;

/// Dispatch a parsed command line.
pub async fn run(cli: Cli, config: &TscutConfig) -> anyhow::Result<()> {
    match cli.command {
        Command::Analyze(args) => commands::analyze(args, config, cli.quiet).await,
        Command::Split(args) => commands::split(args, config, cli.quiet).await,
        Command::Extract(args) => commands::extract(args, config, cli.quiet).await,
        Command::Clips(args) => commands::clips(args).await,
    }
}
