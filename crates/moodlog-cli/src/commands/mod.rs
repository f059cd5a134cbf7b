//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `breathing` - Breathing patterns and session logging
//! - `core` - Core commands (init) and shared utilities (open_db)
//! - `import` - CSV import and CSV/JSON export
//! - `insights` - Mood insights and streaks
//! - `journal` - Journal entry commands (list, add, show, edit, delete, reasons)
//! - `serve` - Web server command
//! - `status` - Status/audit/reset commands

pub mod breathing;
pub mod core;
pub mod import;
pub mod insights;
pub mod journal;
pub mod serve;
pub mod status;

// Re-export command functions for main.rs
pub use breathing::*;
pub use core::*;
pub use import::*;
pub use insights::*;
pub use journal::*;
pub use serve::*;
pub use status::*;

use anyhow::{Context, Result};
use chrono::NaiveDate;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Today's date in local time
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Parse a `YYYY-MM-DD` command-line date
pub fn parse_date_arg(s: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid {} date '{}' (use YYYY-MM-DD)", flag, s))
}
