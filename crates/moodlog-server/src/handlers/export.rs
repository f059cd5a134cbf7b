//! Journal export and CSV import handlers

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, Request, State},
    http::{header, Response, StatusCode},
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::{get_user_id, AppError, AppState, MAX_UPLOAD_SIZE};
use moodlog_core::{export::ExportFormat, import::import_journal_csv, ImportStats};

/// Query parameters for journal export
#[derive(Debug, Deserialize)]
pub struct JournalExportQuery {
    /// Output format (default: csv)
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "csv".to_string()
}

/// GET /api/export/journal - Export the user's journal as CSV or JSON
pub async fn export_journal(
    State(state): State<Arc<AppState>>,
    Query(params): Query<JournalExportQuery>,
    request: Request,
) -> Result<Response<Body>, AppError> {
    let user = get_user_id(&request)?;

    let format: ExportFormat = params
        .format
        .parse()
        .map_err(|_| AppError::bad_request("Invalid format. Use 'csv' or 'json'"))?;

    let data = state.db.export_journal(&user, format)?;

    state.db.log_audit(
        &user,
        "export",
        Some("journal"),
        None,
        Some(&format!("format={}", format)),
    )?;

    info!(user = %user, format = %format, bytes = data.len(), "Exported journal");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, format.content_type())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"journal.{}\"", format),
        )
        .body(Body::from(data))
        .map_err(|e| AppError::internal(&e.to_string()))
}

/// POST /api/import/journal - Import entries from a CSV request body
///
/// Rows already imported for this user are skipped.
pub async fn import_journal(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<ImportStats>, AppError> {
    let user = get_user_id(&request)?;

    let bytes = axum::body::to_bytes(request.into_body(), MAX_UPLOAD_SIZE)
        .await
        .map_err(|_| {
            AppError::bad_request(&format!(
                "Invalid body or file too large (max {} MB)",
                MAX_UPLOAD_SIZE / 1024 / 1024
            ))
        })?;

    if bytes.is_empty() {
        return Err(AppError::bad_request("Empty CSV body"));
    }

    let stats =
        import_journal_csv(&state.db, &user, bytes.as_ref()).map_err(AppError::from_core)?;

    state.db.log_audit(
        &user,
        "import",
        Some("journal"),
        None,
        Some(&format!("imported={}, skipped={}", stats.imported, stats.skipped)),
    )?;

    Ok(Json(stats))
}
