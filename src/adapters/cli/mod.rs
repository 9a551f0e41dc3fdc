//! CLI Adapter
//!
//! Command-line interface for the momentum radar.
//! Uses clap derive macros for argument parsing.

mod commands;
mod presenter;

pub use commands::{init_logging, CheckConfigCmd, CliApp, Command, RankCmd, WatchCmd};
pub use presenter::{OutputFormat, TablePresenter};

use anyhow::Result;

/// Initialize the CLI application
pub fn init() -> CliApp {
    use clap::Parser;
    CliApp::parse()
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    commands::execute(app).await
}
