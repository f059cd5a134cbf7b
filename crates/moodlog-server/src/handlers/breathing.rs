//! Breathing exercise handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::parse_date_param;
use crate::{get_user_id, AppError, AppState, MAX_PAGE_LIMIT};
use moodlog_core::breathing::{validate_cycles, BreathPhase, BreathingPattern, ScheduledPhase};
use moodlog_core::models::{BreathingSession, NewBreathingSession};

/// A breathing pattern as shown to clients
#[derive(Debug, Serialize)]
pub struct PatternInfo {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub phases: &'static [BreathPhase],
    pub cycle_duration_ms: u64,
}

impl From<BreathingPattern> for PatternInfo {
    fn from(pattern: BreathingPattern) -> Self {
        Self {
            name: pattern.as_str(),
            title: pattern.title(),
            description: pattern.description(),
            phases: pattern.phases(),
            cycle_duration_ms: pattern.cycle_duration().as_millis() as u64,
        }
    }
}

/// A pattern with its timeline for a number of cycles
#[derive(Debug, Serialize)]
pub struct PatternSchedule {
    #[serde(flatten)]
    pub pattern: PatternInfo,
    pub cycles: u32,
    pub total_duration_ms: u64,
    pub schedule: Vec<ScheduledPhase>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    /// Number of cycles to lay out (default: enough for about one minute)
    pub cycles: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SessionsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

/// Request body for logging a session
#[derive(Debug, Deserialize)]
pub struct LogSessionRequest {
    pub pattern: String,
    pub cycles: u32,
    /// Day the session was completed (YYYY-MM-DD, defaults to today)
    pub completed_on: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogSessionResponse {
    pub id: i64,
    pub pattern: BreathingPattern,
    pub cycles: u32,
    pub duration_secs: u64,
    pub completed_on: chrono::NaiveDate,
}

fn parse_pattern(name: &str) -> Result<BreathingPattern, AppError> {
    name.parse()
        .map_err(|_| AppError::not_found(&format!("Breathing pattern '{}' not found", name)))
}

fn check_cycles(cycles: u32) -> Result<u32, AppError> {
    validate_cycles(cycles).map_err(AppError::from_core)
}

/// GET /api/breathing/patterns - List all patterns
pub async fn list_breathing_patterns(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Vec<PatternInfo>>, AppError> {
    let user = get_user_id(&request)?;

    state
        .db
        .log_audit(&user, "list", Some("breathing_pattern"), None, None)?;

    Ok(Json(
        BreathingPattern::ALL.into_iter().map(PatternInfo::from).collect(),
    ))
}

/// GET /api/breathing/patterns/:name - A pattern with its phase timeline
pub async fn get_breathing_pattern(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<ScheduleQuery>,
    request: Request,
) -> Result<Json<PatternSchedule>, AppError> {
    let user = get_user_id(&request)?;
    let pattern = parse_pattern(&name)?;

    let cycles = match params.cycles {
        Some(c) => check_cycles(c)?,
        None => pattern.cycles_for(std::time::Duration::from_secs(60)),
    };

    state.db.log_audit(
        &user,
        "get",
        Some("breathing_pattern"),
        None,
        Some(&format!("pattern={}, cycles={}", pattern, cycles)),
    )?;

    Ok(Json(PatternSchedule {
        pattern: pattern.into(),
        cycles,
        total_duration_ms: pattern.session_duration(cycles).as_millis() as u64,
        schedule: pattern.schedule(cycles),
    }))
}

/// GET /api/breathing/sessions - The user's sessions, most recent first
pub async fn list_breathing_sessions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SessionsQuery>,
    request: Request,
) -> Result<Json<Vec<BreathingSession>>, AppError> {
    let user = get_user_id(&request)?;
    let limit = params.limit.clamp(1, MAX_PAGE_LIMIT);

    let sessions = state.db.list_breathing_sessions(&user, limit)?;

    state.db.log_audit(
        &user,
        "list",
        Some("breathing_session"),
        None,
        Some(&format!("count={}", sessions.len())),
    )?;

    Ok(Json(sessions))
}

/// POST /api/breathing/sessions - Log a completed session
pub async fn log_breathing_session(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<LogSessionResponse>, AppError> {
    let user = get_user_id(&request)?;

    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 10)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: LogSessionRequest =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    let pattern: BreathingPattern = req
        .pattern
        .parse()
        .map_err(|e: String| AppError::bad_request(&e))?;
    let session = NewBreathingSession {
        pattern,
        cycles: check_cycles(req.cycles)?,
        completed_on: parse_date_param(req.completed_on.as_deref(), "completed_on")?
            .unwrap_or_else(|| chrono::Local::now().date_naive()),
    };

    let id = state
        .db
        .log_breathing_session(&user, &session)
        .map_err(AppError::from_core)?;

    state.db.log_audit(
        &user,
        "create",
        Some("breathing_session"),
        Some(id),
        Some(&format!("pattern={}, cycles={}", pattern, session.cycles)),
    )?;

    Ok(Json(LogSessionResponse {
        id,
        pattern,
        cycles: session.cycles,
        duration_secs: pattern.session_duration(session.cycles).as_secs_f64().round() as u64,
        completed_on: session.completed_on,
    }))
}
