//! Daily streak counting over date-stamped logs

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakSummary {
    /// Consecutive active days ending today, or yesterday if today has no activity yet
    pub current_streak: u32,
    pub longest_streak: u32,
    /// Distinct days with at least one log
    pub active_days: u32,
    pub last_active: Option<NaiveDate>,
}

impl StreakSummary {
    /// Whether something has been logged on `today`
    pub fn active_on(&self, today: NaiveDate) -> bool {
        self.last_active == Some(today)
    }
}

/// Count streaks over any collection of dates
///
/// Duplicates and ordering do not matter. Dates after `today` are ignored.
pub fn calculate_streak<I>(dates: I, today: NaiveDate) -> StreakSummary
where
    I: IntoIterator<Item = NaiveDate>,
{
    let days: BTreeSet<NaiveDate> = dates.into_iter().filter(|d| *d <= today).collect();

    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;

    for &day in &days {
        run = match prev {
            Some(p) if p.succ_opt() == Some(day) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(day);
    }

    // `run` is now the run ending at the most recent active day
    let current = match prev {
        Some(last) if last == today || Some(last) == today.pred_opt() => run,
        _ => 0,
    };

    StreakSummary {
        current_streak: current,
        longest_streak: longest,
        active_days: days.len() as u32,
        last_active: prev,
    }
}
