//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Recur - Find the subscriptions hiding in your expenses
#[derive(Parser)]
#[command(name = "recur")]
#[command(about = "Recurring expense detector", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Detector config file
    ///
    /// Defaults to ~/.local/share/recur/config/detector.toml when present,
    /// otherwise the built-in defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Detect recurring expenses in an expense history
    Detect {
        /// Expense history file (.csv or .json)
        #[arg(short, long)]
        file: PathBuf,

        /// Input format: csv or json (detected from the extension if omitted)
        #[arg(long)]
        input: Option<String>,

        /// Output format: table, json, records
        #[arg(short, long, default_value = "table")]
        output: String,

        /// User ID stamped on `records` output
        #[arg(long, default_value = "0")]
        user_id: i64,

        /// Hide patterns below this confidence (overrides config)
        #[arg(long)]
        min_confidence: Option<f64>,
    },

    /// Inspect detector configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,

    /// Print the override file location
    Path,
}
