//! Insights over stored journal data

use chrono::NaiveDate;

use super::Database;
use crate::error::Result;
use crate::insights::{self, calculate_streak, JournalSource, MoodInsights, StreakSummary};
use crate::models::JournalEntry;

impl JournalSource for Database {
    fn journal_entries(&self, user_id: &str) -> Result<Vec<JournalEntry>> {
        self.all_journal_entries(user_id)
    }
}

impl Database {
    /// Mood insights over all of a user's entries
    pub fn mood_insights(&self, user_id: &str) -> Result<MoodInsights> {
        insights::insights_for_user(self, user_id)
    }

    /// Journaling streak as of `today`
    pub fn journal_streak(&self, user_id: &str, today: NaiveDate) -> Result<StreakSummary> {
        Ok(calculate_streak(self.journal_dates(user_id)?, today))
    }

    /// Breathing practice streak as of `today`
    pub fn breathing_streak(&self, user_id: &str, today: NaiveDate) -> Result<StreakSummary> {
        Ok(calculate_streak(self.breathing_dates(user_id)?, today))
    }
}
