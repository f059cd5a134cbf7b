//! Mood insights
//!
//! Pure computations over a user's journal:
//!
//! - **Mood trends** - overall average mood and how each reason tag deviates from it
//! - **Streaks** - consecutive days with journal or breathing activity
//!
//! The computations take plain data. Fetching that data goes through
//! [`JournalSource`], which is keyed by user id so nothing here depends on who
//! is signed in.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use moodlog_core::insights::{calculate_mood_trends, insights_for_user};
//!
//! let insights = insights_for_user(&db, "alice@example.com")?;
//! if let Some(best) = insights.best_reason(3) {
//!     println!("{} lifts your mood by {:+.1}", best.reason, best.deviation);
//! }
//! ```

pub mod mood_trends;
pub mod streaks;
pub mod types;

pub use mood_trends::{calculate_mood_trends, MoodSample};
pub use streaks::{calculate_streak, StreakSummary};
pub use types::{MoodDeviation, MoodInsights, ReasonHighlight};

use crate::error::Result;
use crate::models::JournalEntry;

/// Where journal entries come from
pub trait JournalSource {
    /// All entries belonging to `user_id`, in any order
    fn journal_entries(&self, user_id: &str) -> Result<Vec<JournalEntry>>;
}

/// Fetch a user's entries and analyze them
pub fn insights_for_user<S>(source: &S, user_id: &str) -> Result<MoodInsights>
where
    S: JournalSource + ?Sized,
{
    let entries = source.journal_entries(user_id)?;
    let insights = calculate_mood_trends(&entries);

    tracing::debug!(
        user = user_id,
        entries = insights.entries_analyzed,
        reasons = insights.reasons_analysis.len(),
        "Mood insights computed"
    );

    Ok(insights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use chrono::{NaiveDate, Utc};
    use std::collections::HashMap;

    struct StaticSource(HashMap<String, Vec<JournalEntry>>);

    impl JournalSource for StaticSource {
        fn journal_entries(&self, user_id: &str) -> Result<Vec<JournalEntry>> {
            Ok(self.0.get(user_id).cloned().unwrap_or_default())
        }
    }

    struct FailingSource;

    impl JournalSource for FailingSource {
        fn journal_entries(&self, _user_id: &str) -> Result<Vec<JournalEntry>> {
            Err(Error::NotFound("store offline".to_string()))
        }
    }

    fn stored(user: &str, score: i32, reasons: &[&str]) -> JournalEntry {
        JournalEntry {
            id: 0,
            user_id: user.to_string(),
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            mood_score: score,
            reasons: reasons.iter().map(|r| r.to_string()).collect(),
            content: None,
            import_hash: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_insights_scoped_to_user() {
        let mut data = HashMap::new();
        data.insert(
            "alice".to_string(),
            vec![stored("alice", 8, &["Exercise"]), stored("alice", 4, &["Work"])],
        );
        data.insert("bob".to_string(), vec![stored("bob", 1, &["Work"])]);
        let source = StaticSource(data);

        let alice = insights_for_user(&source, "alice").unwrap();
        assert_eq!(alice.overall_average_mood, 6.0);
        assert_eq!(alice.reasons_analysis.len(), 2);

        let bob = insights_for_user(&source, "bob").unwrap();
        assert_eq!(bob.overall_average_mood, 1.0);

        let nobody = insights_for_user(&source, "carol").unwrap();
        assert!(!nobody.has_data());
    }

    #[test]
    fn test_source_errors_propagate() {
        assert!(insights_for_user(&FailingSource, "alice").is_err());
    }
}
