//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (config loading)
//! - `detect` - Recurring expense detection and output rendering
//! - `config` - Configuration inspection commands

pub mod config;
pub mod core;
pub mod detect;

// Re-export command functions for main.rs
pub use config::*;
pub use core::*;
pub use detect::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
