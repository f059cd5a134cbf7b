//! Moodlog Core Library
//!
//! Shared functionality for the moodlog journal:
//! - Database access and migrations (encrypted SQLite)
//! - Mood insights: per-reason mood deviations and activity streaks
//! - Breathing exercise patterns and session log
//! - CSV import and CSV/JSON export of journal entries

pub mod breathing;
pub mod db;
pub mod error;
pub mod export;
pub mod import;
pub mod insights;
pub mod models;

pub use breathing::{
    validate_cycles, BreathPhase, BreathingPattern, PhaseKind, ScheduledPhase, MAX_CYCLES,
};
pub use db::{AuditEntry, Database};
pub use error::{Error, Result};
pub use export::{ExportFormat, JournalExport};
pub use import::{import_journal_csv, parse_journal_csv, ParsedEntry};
pub use insights::{
    calculate_mood_trends, calculate_streak, insights_for_user, JournalSource, MoodDeviation,
    MoodInsights, MoodSample, ReasonHighlight, StreakSummary,
};
pub use models::{
    ImportStats, JournalEntry, JournalEntryUpdate, JournalFilter, NewJournalEntry,
    MAX_MOOD_SCORE, MIN_MOOD_SCORE,
};
