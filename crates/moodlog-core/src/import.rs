//! CSV import of journal entries
//!
//! Expected columns (matched by header name, case-insensitive, any order):
//! `date`, `mood`, and optionally `reasons` (separated by `;`) and `content`.

use std::io::Read;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{normalize_reasons, validate_mood_score, ImportStats, NewJournalEntry};

/// Separator between reasons inside the `reasons` column
pub const REASON_SEPARATOR: char = ';';

/// A parsed CSV row ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEntry {
    pub entry: NewJournalEntry,
    pub import_hash: String,
}

/// Column positions resolved from the header row
struct Columns {
    date: usize,
    mood: usize,
    reasons: Option<usize>,
    content: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        Ok(Self {
            date: find("date").ok_or_else(|| Error::Import("Missing 'date' column".into()))?,
            mood: find("mood").ok_or_else(|| Error::Import("Missing 'mood' column".into()))?,
            reasons: find("reasons"),
            content: find("content"),
        })
    }
}

/// Parse journal CSV data into entries
///
/// Fails on the first malformed row, naming its line number.
pub fn parse_journal_csv<R: Read>(reader: R) -> Result<Vec<ParsedEntry>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = Columns::from_headers(rdr.headers()?)?;
    let mut parsed = Vec::new();

    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        // Skip fully blank rows
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let date_str = record
            .get(columns.date)
            .ok_or_else(|| Error::Import(format!("Line {}: missing date", line)))?;
        let entry_date =
            parse_date(date_str).map_err(|e| Error::Import(format!("Line {}: {}", line, e)))?;

        let mood_str = record
            .get(columns.mood)
            .ok_or_else(|| Error::Import(format!("Line {}: missing mood", line)))?;
        let mood_score: i32 = mood_str.trim().parse().map_err(|_| {
            Error::Import(format!("Line {}: invalid mood score '{}'", line, mood_str))
        })?;
        validate_mood_score(mood_score)
            .map_err(|e| Error::Import(format!("Line {}: {}", line, e)))?;

        let reasons: Vec<String> = columns
            .reasons
            .and_then(|i| record.get(i))
            .map(|s| s.split(REASON_SEPARATOR).map(str::to_string).collect())
            .unwrap_or_default();

        let content = columns
            .content
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let entry = NewJournalEntry {
            entry_date,
            mood_score,
            reasons: normalize_reasons(&reasons),
            content,
        };
        let import_hash = generate_hash(&entry);

        parsed.push(ParsedEntry { entry, import_hash });
    }

    debug!("Parsed {} journal rows", parsed.len());
    Ok(parsed)
}

/// Parse CSV data and insert it for a user, skipping rows imported before
///
/// The whole file is checked before anything is written, and rows are inserted
/// in a single transaction, so a failed import leaves the journal unchanged.
pub fn import_journal_csv<R: Read>(db: &Database, user_id: &str, reader: R) -> Result<ImportStats> {
    let parsed = parse_journal_csv(reader)?;
    let stats = db.insert_imported_entries(
        user_id,
        parsed.iter().map(|row| (&row.entry, row.import_hash.as_str())),
    )?;

    info!(
        user = user_id,
        imported = stats.imported,
        skipped = stats.skipped,
        "Journal import complete"
    );
    Ok(stats)
}

/// Hash of everything that identifies an imported row
fn generate_hash(entry: &NewJournalEntry) -> String {
    let mut hasher = Sha256::new();
    hasher.update(entry.entry_date.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(entry.mood_score.to_be_bytes());
    hasher.update(b"|");
    hasher.update(entry.reasons.join(";").as_bytes());
    hasher.update(b"|");
    if let Some(ref content) = entry.content {
        hasher.update(content.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Parse a date string in the formats journal apps commonly export
fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%Y", // 01/15/2024
        "%d/%m/%Y", // 15/01/2024 (European)
        "%Y/%m/%d", // 2024/01/15
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    // Full timestamps: keep the calendar day
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }

    Err(Error::Import(format!("Unable to parse date: {}", s)))
}
