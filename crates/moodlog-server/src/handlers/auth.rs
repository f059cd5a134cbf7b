//! Authentication-related handlers

use axum::extract::Request;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::{request_identity, AppError, AppState, AuthMethod};

/// Response for the /api/me endpoint
#[derive(Serialize)]
pub struct MeResponse {
    /// The user id journal data is stored under
    pub user: String,
    /// How the user was authenticated
    pub auth_method: AuthMethod,
    /// Client address when authenticated via a trusted network
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
}

/// GET /api/me - Get the currently authenticated user
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<MeResponse>, AppError> {
    let identity = request_identity(&request)?;

    state.db.log_audit(
        &identity.user,
        "get",
        Some("me"),
        None,
        Some(identity.method.as_str()),
    )?;

    Ok(Json(MeResponse {
        user: identity.user,
        auth_method: identity.method,
        client_ip: identity.client_ip.map(|ip| ip.to_string()),
    }))
}
