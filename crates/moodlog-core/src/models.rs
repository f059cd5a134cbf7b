//! Domain models for moodlog

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::breathing::BreathingPattern;
use crate::error::{Error, Result};

/// Lowest mood score a user can record
pub const MIN_MOOD_SCORE: i32 = 1;

/// Highest mood score a user can record
pub const MAX_MOOD_SCORE: i32 = 10;

/// Reason tags offered as suggestions when writing an entry
///
/// Users can attach any free-form reason; these only seed the picker.
pub const DEFAULT_REASONS: [&str; 12] = [
    "Work",
    "Sleep",
    "Exercise",
    "Family",
    "Friends",
    "Relationship",
    "Health",
    "Food",
    "Weather",
    "Money",
    "Hobbies",
    "Social Media",
];

/// A stored mood journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: i64,
    /// Owner of the entry
    pub user_id: String,
    /// Calendar day the entry is about
    pub entry_date: NaiveDate,
    /// Self-reported mood for this entry
    pub mood_score: i32,
    /// Reason tags in the order the user attached them
    pub reasons: Vec<String>,
    /// Free-text journal content
    pub content: Option<String>,
    /// Deduplication hash for imported entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A journal entry to be created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJournalEntry {
    pub entry_date: NaiveDate,
    pub mood_score: i32,
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl NewJournalEntry {
    pub fn new(entry_date: NaiveDate, mood_score: i32) -> Self {
        Self {
            entry_date,
            mood_score,
            reasons: vec![],
            content: None,
        }
    }

    pub fn with_reasons<I, S>(mut self, reasons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reasons = reasons.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Check the score range and return a copy with cleaned-up reasons
    pub fn validated(&self) -> Result<Self> {
        validate_mood_score(self.mood_score)?;
        Ok(Self {
            entry_date: self.entry_date,
            mood_score: self.mood_score,
            reasons: normalize_reasons(&self.reasons),
            content: self
                .content
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        })
    }
}

/// Partial update for an existing entry
///
/// Fields left as `None` are unchanged. An empty `content` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JournalEntryUpdate {
    pub entry_date: Option<NaiveDate>,
    pub mood_score: Option<i32>,
    pub reasons: Option<Vec<String>>,
    pub content: Option<String>,
}

impl JournalEntryUpdate {
    pub fn is_empty(&self) -> bool {
        self.entry_date.is_none()
            && self.mood_score.is_none()
            && self.reasons.is_none()
            && self.content.is_none()
    }
}

/// Filter options for listing entries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JournalFilter {
    /// Start date (inclusive)
    pub from: Option<NaiveDate>,
    /// End date (inclusive)
    pub to: Option<NaiveDate>,
    /// Only entries carrying this reason (exact match)
    pub reason: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// How often a reason has been used
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonCount {
    pub reason: String,
    pub count: i64,
}

/// Summary numbers for the status screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalStats {
    pub total_entries: i64,
    pub first_entry: Option<NaiveDate>,
    pub last_entry: Option<NaiveDate>,
    pub distinct_reasons: i64,
    pub breathing_sessions: i64,
}

/// A completed breathing exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreathingSession {
    pub id: i64,
    pub user_id: String,
    pub pattern: BreathingPattern,
    pub cycles: u32,
    pub duration_secs: u32,
    pub completed_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// A breathing exercise to be logged
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBreathingSession {
    pub pattern: BreathingPattern,
    pub cycles: u32,
    pub completed_on: NaiveDate,
}

/// Result of a journal import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStats {
    pub imported: usize,
    /// Rows already present (same import hash)
    pub skipped: usize,
}

pub fn validate_mood_score(score: i32) -> Result<()> {
    if !(MIN_MOOD_SCORE..=MAX_MOOD_SCORE).contains(&score) {
        return Err(Error::InvalidData(format!(
            "Mood score {} out of range ({}-{})",
            score, MIN_MOOD_SCORE, MAX_MOOD_SCORE
        )));
    }
    Ok(())
}

/// Trim reasons, drop blanks and repeats (first occurrence wins). Case is kept.
pub fn normalize_reasons(reasons: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(reasons.len());
    for reason in reasons {
        let reason = reason.trim();
        if reason.is_empty() || out.iter().any(|r| r == reason) {
            continue;
        }
        out.push(reason.to_string());
    }
    out
}

/// Default reasons not in `used`, in picker order
pub fn suggested_reasons<'a, I>(used: I) -> Vec<&'static str>
where
    I: IntoIterator<Item = &'a str>,
{
    let used: Vec<&str> = used.into_iter().collect();
    DEFAULT_REASONS
        .into_iter()
        .filter(|r| !used.contains(r))
        .collect()
}
