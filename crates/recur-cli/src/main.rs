//! Recur CLI - Recurring expense detector
//!
//! Usage:
//!   recur detect --file expenses.csv           Detect recurring expenses
//!   recur detect --file expenses.json -o json  Same, as JSON
//!   recur config show                          Print effective configuration

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Detect {
            file,
            input,
            output,
            user_id,
            min_confidence,
        } => commands::cmd_detect(
            &file,
            input.as_deref(),
            &output,
            user_id,
            min_confidence,
            cli.config.as_deref(),
        ),
        Commands::Config { action } => match action {
            None | Some(ConfigAction::Show) => commands::cmd_config_show(cli.config.as_deref()),
            Some(ConfigAction::Path) => commands::cmd_config_path(cli.config.as_deref()),
        },
    }
}
