//! Core types for mood insights

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How one reason tag relates to the overall mood
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodDeviation {
    /// Mean mood of entries carrying the reason, minus the overall mean
    pub deviation: f64,
    /// Number of entries carrying the reason (always >= 1)
    pub entries_count: usize,
}

/// Summary of a user's mood across a set of journal entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodInsights {
    /// Mean mood score; 0.0 when no entries were analyzed
    pub overall_average_mood: f64,
    /// One record per distinct reason tag, keyed by the exact tag text
    pub reasons_analysis: BTreeMap<String, MoodDeviation>,
    /// Number of entries the summary was computed from
    pub entries_analyzed: usize,
}

/// A reason ready for display, with its absolute average
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasonHighlight {
    pub reason: String,
    pub deviation: f64,
    pub entries_count: usize,
    pub average_mood: f64,
}

impl MoodInsights {
    /// The summary of an empty entry set
    pub fn empty() -> Self {
        Self {
            overall_average_mood: 0.0,
            reasons_analysis: BTreeMap::new(),
            entries_analyzed: 0,
        }
    }

    /// False when the average is the empty-input sentinel rather than a real mean
    pub fn has_data(&self) -> bool {
        self.entries_analyzed > 0
    }

    /// Reason with the highest deviation among those backed by at least `min_entries` entries
    ///
    /// Ties go to the alphabetically first reason.
    pub fn best_reason(&self, min_entries: usize) -> Option<ReasonHighlight> {
        self.pick_reason(min_entries, |candidate, current| candidate > current)
    }

    /// Reason with the lowest deviation among those backed by at least `min_entries` entries
    pub fn worst_reason(&self, min_entries: usize) -> Option<ReasonHighlight> {
        self.pick_reason(min_entries, |candidate, current| candidate < current)
    }

    /// All reasons, best first
    pub fn ranked_reasons(&self) -> Vec<ReasonHighlight> {
        let mut ranked: Vec<ReasonHighlight> = self
            .reasons_analysis
            .iter()
            .map(|(reason, dev)| self.highlight(reason, dev))
            .collect();

        // BTreeMap iteration is already name-ordered and sort_by is stable
        ranked.sort_by(|a, b| b.deviation.total_cmp(&a.deviation));
        ranked
    }

    fn pick_reason(
        &self,
        min_entries: usize,
        better: impl Fn(f64, f64) -> bool,
    ) -> Option<ReasonHighlight> {
        let mut picked: Option<(&String, &MoodDeviation)> = None;

        for (reason, dev) in &self.reasons_analysis {
            if dev.entries_count < min_entries {
                continue;
            }
            match picked {
                Some((_, current)) if !better(dev.deviation, current.deviation) => {}
                _ => picked = Some((reason, dev)),
            }
        }

        picked.map(|(reason, dev)| self.highlight(reason, dev))
    }

    fn highlight(&self, reason: &str, dev: &MoodDeviation) -> ReasonHighlight {
        ReasonHighlight {
            reason: reason.to_string(),
            deviation: dev.deviation,
            entries_count: dev.entries_count,
            average_mood: self.overall_average_mood + dev.deviation,
        }
    }
}

impl Default for MoodInsights {
    fn default() -> Self {
        Self::empty()
    }
}
