//! Journal export to CSV and JSON
//!
//! CSV output uses the same columns the importer reads, so an export can be
//! imported into another database.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::import::REASON_SEPARATOR;
use crate::models::JournalEntry;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// MIME type for HTTP responses
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(Error::InvalidData(format!(
                "Unknown export format: {} (expected csv or json)",
                other
            ))),
        }
    }
}

/// JSON export document
#[derive(Debug, Clone, Serialize)]
pub struct JournalExport {
    pub exported_at: DateTime<Utc>,
    pub user_id: String,
    pub entry_count: usize,
    pub entries: Vec<JournalEntry>,
}

impl Database {
    /// Export a user's journal in the given format
    pub fn export_journal(&self, user_id: &str, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Csv => self.export_journal_csv(user_id),
            ExportFormat::Json => self.export_journal_json(user_id),
        }
    }

    /// Export a user's journal to CSV, oldest entry first
    pub fn export_journal_csv(&self, user_id: &str) -> Result<String> {
        let entries = self.all_journal_entries(user_id)?;
        entries_to_csv(&entries)
    }

    /// Export a user's journal as pretty-printed JSON, oldest entry first
    pub fn export_journal_json(&self, user_id: &str) -> Result<String> {
        let entries = self.all_journal_entries(user_id)?;
        let export = JournalExport {
            exported_at: Utc::now(),
            user_id: user_id.to_string(),
            entry_count: entries.len(),
            entries,
        };
        Ok(serde_json::to_string_pretty(&export)?)
    }
}

/// Write entries as CSV with a `date,mood,reasons,content` header
pub fn entries_to_csv(entries: &[JournalEntry]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["date", "mood", "reasons", "content"])?;

    let separator = REASON_SEPARATOR.to_string();
    for entry in entries {
        wtr.write_record([
            entry.entry_date.to_string(),
            entry.mood_score.to_string(),
            entry.reasons.join(&separator),
            entry.content.clone().unwrap_or_default(),
        ])?;
    }

    let bytes = wtr.into_inner().map_err(|e| Error::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| Error::InvalidData(e.to_string()))
}
