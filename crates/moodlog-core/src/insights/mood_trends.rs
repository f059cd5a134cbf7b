//! Reason deviation analysis
//!
//! For every reason tag, compares the mean mood of the entries carrying it
//! against the overall mean. Positive deviation means the reason tends to
//! come with better-than-usual days.

use std::collections::BTreeMap;

use crate::models::{JournalEntry, NewJournalEntry};

use super::types::{MoodDeviation, MoodInsights};

/// Anything that carries a mood score and reason tags
pub trait MoodSample {
    fn mood_score(&self) -> i32;
    fn reasons(&self) -> &[String];
}

impl MoodSample for JournalEntry {
    fn mood_score(&self) -> i32 {
        self.mood_score
    }

    fn reasons(&self) -> &[String] {
        &self.reasons
    }
}

impl MoodSample for NewJournalEntry {
    fn mood_score(&self) -> i32 {
        self.mood_score
    }

    fn reasons(&self) -> &[String] {
        &self.reasons
    }
}

impl<T: MoodSample + ?Sized> MoodSample for &T {
    fn mood_score(&self) -> i32 {
        (**self).mood_score()
    }

    fn reasons(&self) -> &[String] {
        (**self).reasons()
    }
}

/// Running total for one reason
#[derive(Default)]
struct ReasonTotals {
    score_sum: i64,
    entries: usize,
}

/// Compute the overall mean mood and the per-reason deviations
///
/// Never fails. An empty slice yields `MoodInsights::empty()` (average 0.0, no
/// reasons). Scores are summed as integers and divided once, so the result
/// does not depend on entry order. A reason listed twice on the same entry
/// counts that entry once.
pub fn calculate_mood_trends<E: MoodSample>(entries: &[E]) -> MoodInsights {
    if entries.is_empty() {
        return MoodInsights::empty();
    }

    let mut total: i64 = 0;
    let mut groups: BTreeMap<&str, ReasonTotals> = BTreeMap::new();

    for entry in entries {
        let score = entry.mood_score() as i64;
        total += score;

        let reasons = entry.reasons();
        for (i, reason) in reasons.iter().enumerate() {
            if reasons[..i].contains(reason) {
                continue;
            }
            let group = groups.entry(reason.as_str()).or_default();
            group.score_sum += score;
            group.entries += 1;
        }
    }

    let overall = total as f64 / entries.len() as f64;

    let reasons_analysis = groups
        .into_iter()
        .map(|(reason, totals)| {
            let mean = totals.score_sum as f64 / totals.entries as f64;
            (
                reason.to_string(),
                MoodDeviation {
                    deviation: mean - overall,
                    entries_count: totals.entries,
                },
            )
        })
        .collect();

    MoodInsights {
        overall_average_mood: overall,
        reasons_analysis,
        entries_analyzed: entries.len(),
    }
}
