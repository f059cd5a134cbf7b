//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod audit;
pub mod auth;
pub mod breathing;
pub mod export;
pub mod insights;
pub mod journal;

// Re-export all handlers for use in router
pub use audit::*;
pub use auth::*;
pub use breathing::*;
pub use export::*;
pub use insights::*;
pub use journal::*;

use chrono::NaiveDate;

use crate::AppError;

/// Parse an optional `YYYY-MM-DD` query parameter
pub(crate) fn parse_date_param(
    value: Option<&str>,
    name: &str,
) -> Result<Option<NaiveDate>, AppError> {
    value
        .map(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d"))
        .transpose()
        .map_err(|_| {
            AppError::bad_request(&format!(
                "Invalid '{}' date format (use YYYY-MM-DD)",
                name
            ))
        })
}
