//! Mood insights and streak handlers

use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::parse_date_param;
use crate::{get_user_id, AppError, AppState};
use moodlog_core::insights::{insights_for_user, MoodInsights, ReasonHighlight, StreakSummary};

/// Query parameters for mood insights
#[derive(Debug, Deserialize)]
pub struct MoodInsightsQuery {
    /// Minimum entries a reason needs to be picked as best or worst
    #[serde(default = "default_min_entries")]
    pub min_entries: usize,
}

fn default_min_entries() -> usize {
    3
}

/// Mood insights plus the highlights the dashboard shows
#[derive(Debug, Serialize)]
pub struct MoodInsightsResponse {
    #[serde(flatten)]
    pub insights: MoodInsights,
    pub best_reason: Option<ReasonHighlight>,
    pub worst_reason: Option<ReasonHighlight>,
    /// Every reason, highest deviation first
    pub ranked_reasons: Vec<ReasonHighlight>,
}

/// GET /api/insights/mood - Overall average and per-reason deviations
pub async fn get_mood_insights(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MoodInsightsQuery>,
    request: Request,
) -> Result<Json<MoodInsightsResponse>, AppError> {
    let user = get_user_id(&request)?;
    let min_entries = params.min_entries.max(1);

    let insights = insights_for_user(&state.db, &user)?;

    state.db.log_audit(
        &user,
        "get",
        Some("mood_insights"),
        None,
        Some(&format!("entries={}", insights.entries_analyzed)),
    )?;

    Ok(Json(MoodInsightsResponse {
        best_reason: insights.best_reason(min_entries),
        worst_reason: insights.worst_reason(min_entries),
        ranked_reasons: insights.ranked_reasons(),
        insights,
    }))
}

/// Query parameters for streaks
#[derive(Debug, Deserialize)]
pub struct StreakQuery {
    /// Day to count from (YYYY-MM-DD, defaults to today in server local time)
    pub today: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StreaksResponse {
    pub today: NaiveDate,
    pub journal: StreakSummary,
    pub breathing: StreakSummary,
}

/// GET /api/insights/streak - Journal and breathing streaks
pub async fn get_streaks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StreakQuery>,
    request: Request,
) -> Result<Json<StreaksResponse>, AppError> {
    let user = get_user_id(&request)?;
    let today = parse_date_param(params.today.as_deref(), "today")?
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let journal = state.db.journal_streak(&user, today)?;
    let breathing = state.db.breathing_streak(&user, today)?;

    state
        .db
        .log_audit(&user, "get", Some("streak"), None, None)?;

    Ok(Json(StreaksResponse {
        today,
        journal,
        breathing,
    }))
}
