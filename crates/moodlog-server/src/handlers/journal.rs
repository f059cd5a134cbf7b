//! Journal entry handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    Json,
};
use serde::Deserialize;

use super::parse_date_param;
use crate::{get_user_id, AppError, AppState, SuccessResponse, MAX_PAGE_LIMIT};
use moodlog_core::models::{
    JournalEntry, JournalEntryUpdate, JournalFilter, NewJournalEntry, ReasonCount,
};

/// Maximum JSON body size for journal writes
const MAX_ENTRY_BODY: usize = 64 * 1024;

/// Query parameters for listing journal entries
#[derive(Debug, Deserialize)]
pub struct JournalQuery {
    /// Start date (YYYY-MM-DD, inclusive)
    pub from: Option<String>,
    /// End date (YYYY-MM-DD, inclusive)
    pub to: Option<String>,
    /// Only entries tagged with this reason
    pub reason: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// Load an entry owned by `user`; other users' entries look missing
fn owned_entry(state: &AppState, user: &str, id: i64) -> Result<JournalEntry, AppError> {
    state
        .db
        .get_journal_entry(id)?
        .filter(|entry| entry.user_id == user)
        .ok_or_else(|| AppError::not_found(&format!("Journal entry {} not found", id)))
}

async fn read_json<T: serde::de::DeserializeOwned>(request: Request) -> Result<T, AppError> {
    let bytes = axum::body::to_bytes(request.into_body(), MAX_ENTRY_BODY)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AppError::bad_request(&format!("Invalid JSON: {}", e)))
}

/// GET /api/journal - List the user's entries, newest first
pub async fn list_journal(
    State(state): State<Arc<AppState>>,
    Query(params): Query<JournalQuery>,
    request: Request,
) -> Result<Json<Vec<JournalEntry>>, AppError> {
    let user = get_user_id(&request)?;

    let filter = JournalFilter {
        from: parse_date_param(params.from.as_deref(), "from")?,
        to: parse_date_param(params.to.as_deref(), "to")?,
        reason: params.reason.filter(|r| !r.trim().is_empty()),
        limit: Some(params.limit.clamp(1, MAX_PAGE_LIMIT)),
        offset: Some(params.offset.max(0)),
    };

    let entries = state.db.list_journal_entries(&user, &filter)?;

    state.db.log_audit(
        &user,
        "list",
        Some("journal_entry"),
        None,
        Some(&format!("count={}", entries.len())),
    )?;

    Ok(Json(entries))
}

/// POST /api/journal - Create an entry
pub async fn create_journal_entry(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<JournalEntry>, AppError> {
    let user = get_user_id(&request)?;
    let req: NewJournalEntry = read_json(request).await?;

    let id = state
        .db
        .create_journal_entry(&user, &req)
        .map_err(AppError::from_core)?;

    state.db.log_audit(
        &user,
        "create",
        Some("journal_entry"),
        Some(id),
        Some(&format!("date={}, mood={}", req.entry_date, req.mood_score)),
    )?;

    let entry = state
        .db
        .get_journal_entry(id)?
        .ok_or_else(|| AppError::internal("Journal entry not found after creation"))?;

    Ok(Json(entry))
}

/// GET /api/journal/:id - Get a single entry
pub async fn get_journal_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<JournalEntry>, AppError> {
    let user = get_user_id(&request)?;
    let entry = owned_entry(&state, &user, id)?;

    state
        .db
        .log_audit(&user, "get", Some("journal_entry"), Some(id), None)?;

    Ok(Json(entry))
}

/// PUT /api/journal/:id - Update an entry (absent fields are left unchanged)
pub async fn update_journal_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<JournalEntry>, AppError> {
    let user = get_user_id(&request)?;
    owned_entry(&state, &user, id)?;

    let update: JournalEntryUpdate = read_json(request).await?;
    if update.is_empty() {
        return Err(AppError::bad_request("No fields to update"));
    }

    let entry = state
        .db
        .update_journal_entry(id, &update)
        .map_err(AppError::from_core)?;

    state
        .db
        .log_audit(&user, "update", Some("journal_entry"), Some(id), None)?;

    Ok(Json(entry))
}

/// DELETE /api/journal/:id - Delete an entry
pub async fn delete_journal_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<SuccessResponse>, AppError> {
    let user = get_user_id(&request)?;
    owned_entry(&state, &user, id)?;

    let deleted = state.db.delete_journal_entry(id)?;

    state
        .db
        .log_audit(&user, "delete", Some("journal_entry"), Some(id), None)?;

    Ok(Json(SuccessResponse { success: deleted }))
}

/// GET /api/journal/reasons - Reasons the user has used, most frequent first
pub async fn list_reasons(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Vec<ReasonCount>>, AppError> {
    let user = get_user_id(&request)?;

    let reasons = state.db.reason_counts(&user)?;

    state.db.log_audit(
        &user,
        "list",
        Some("reason"),
        None,
        Some(&format!("count={}", reasons.len())),
    )?;

    Ok(Json(reasons))
}
