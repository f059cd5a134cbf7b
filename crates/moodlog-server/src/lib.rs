//! Moodlog Web Server
//!
//! Axum-based REST API for the moodlog mood journal.
//!
//! Security features:
//! - Cloudflare Access authentication (secure by default, use --no-auth for local dev)
//! - Restrictive CORS policy
//! - Input validation (pagination limits, upload size limits)
//! - Full audit logging for all API access (reads and writes)
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

use moodlog_core::db::Database;

mod handlers;

pub use ipnet::IpNet;

/// Maximum CSV upload size (5 MB)
pub const MAX_UPLOAD_SIZE: usize = 5 * 1024 * 1024;

/// Maximum pagination limit
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Cloudflare Access header for authenticated user email
const CF_ACCESS_USER_HEADER: &str = "cf-access-authenticated-user-email";

/// Authorization header for API key auth
const AUTHORIZATION_HEADER: &str = "authorization";

/// User id for API key requests
pub const API_KEY_USER: &str = "api-key";

/// User id when no identity header is present (trusted network or auth disabled)
pub const LOCAL_USER: &str = "local-dev";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether authentication is required (secure by default)
    pub require_auth: bool,
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// API keys for service authentication (alternative to Cloudflare Access)
    /// Format: "Bearer <key>" in Authorization header
    pub api_keys: Vec<String>,
    /// Trusted networks that bypass authentication (e.g., "192.168.1.0/24", "10.0.0.5")
    pub trusted_networks: Vec<IpNet>,
    /// Trusted proxies whose X-Forwarded-For headers are trusted
    pub trusted_proxies: Vec<IpNet>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_origins: vec![],
            api_keys: vec![],
            trusted_networks: vec![],
            trusted_proxies: vec![],
        }
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
}

/// How a request's identity was established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Client address is inside a trusted network
    TrustedNetwork,
    /// Cloudflare Access user header
    CloudflareHeader,
    /// Bearer token matching a configured API key
    ApiKey,
    /// Authentication disabled
    None,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::TrustedNetwork => "trusted_network",
            AuthMethod::CloudflareHeader => "cloudflare_header",
            AuthMethod::ApiKey => "api_key",
            AuthMethod::None => "none",
        }
    }
}

/// The verified owner of a request, attached by `auth_middleware`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// User id journal data is scoped to
    pub user: String,
    pub method: AuthMethod,
    /// Client address, recorded for trusted network requests
    pub client_ip: Option<std::net::IpAddr>,
}

impl Identity {
    fn new(user: impl Into<String>, method: AuthMethod) -> Self {
        Self {
            user: user.into(),
            method,
            client_ip: None,
        }
    }
}

/// Authentication middleware - resolves the request identity or rejects the request
///
/// # Security Notes
///
/// **API keys**: A Bearer token is checked with constant-time comparison. A valid key
/// always maps to the `api-key` user; other identity headers are ignored. An invalid
/// key is rejected even from a trusted network.
///
/// **Trusted networks**: Requests from IPs in `trusted_networks` need no credentials.
/// The client IP comes from the TCP peer address unless the peer is a trusted proxy.
///
/// **Cloudflare Access headers**: The `CF-Access-Authenticated-User-Email` header is
/// safe behind Cloudflare Tunnel (which strips/rewrites CF headers), but can be
/// spoofed if the server is exposed directly to the internet.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    connect_info: Option<axum::extract::ConnectInfo<std::net::SocketAddr>>,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_identity(&state.config, &request, connect_info.as_ref()) {
        Some(identity) => {
            tracing::debug!(
                user = %identity.user,
                method = identity.method.as_str(),
                path = %request.uri().path(),
                "Request authenticated"
            );
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        None => {
            warn!(path = %request.uri().path(), "Unauthorized request - no valid auth");
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "error": "Authentication required"
                })),
            )
                .into_response()
        }
    }
}

/// Work out who a request belongs to; `None` means it must be rejected
pub(crate) fn resolve_identity(
    config: &ServerConfig,
    request: &Request,
    connect_info: Option<&axum::extract::ConnectInfo<std::net::SocketAddr>>,
) -> Option<Identity> {
    let headers = request.headers();

    if let Some(key) = bearer_token(headers) {
        if validate_api_key(key, &config.api_keys) {
            return Some(Identity::new(API_KEY_USER, AuthMethod::ApiKey));
        }
        if config.require_auth {
            warn!(path = %request.uri().path(), "Rejected invalid API key");
            return None;
        }
    }

    let cf_user = cf_access_user(headers);

    if !config.require_auth {
        return Some(match cf_user {
            Some(email) => Identity::new(email, AuthMethod::CloudflareHeader),
            None => Identity::new(LOCAL_USER, AuthMethod::None),
        });
    }

    if !config.trusted_networks.is_empty() {
        let client_ip = get_client_ip(request, connect_info, &config.trusted_proxies);

        tracing::debug!(
            ?client_ip,
            trusted_networks = ?config.trusted_networks,
            path = %request.uri().path(),
            "Checking trusted network auth"
        );

        if let Some(ip) = client_ip.filter(|ip| is_ip_trusted(ip, &config.trusted_networks)) {
            info!(ip = %ip, path = %request.uri().path(), "Authenticated via trusted network");
            return Some(Identity {
                user: cf_user.unwrap_or(LOCAL_USER).to_string(),
                method: AuthMethod::TrustedNetwork,
                client_ip: Some(ip),
            });
        }
    }

    cf_user.map(|email| {
        info!(user = %email, path = %request.uri().path(), "Authenticated via Cloudflare Access header");
        Identity::new(email, AuthMethod::CloudflareHeader)
    })
}

/// Trimmed, non-empty Cloudflare Access user email
fn cf_access_user(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get(CF_ACCESS_USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn bearer_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
}

/// Validate an API key against the configured keys using constant-time comparison
fn validate_api_key(provided: &str, valid_keys: &[String]) -> bool {
    use subtle::ConstantTimeEq;

    let provided_bytes = provided.as_bytes();

    valid_keys.iter().any(|key| {
        let key_bytes = key.as_bytes();
        // Only compare if lengths match (constant-time for same-length keys)
        provided_bytes.len() == key_bytes.len() && bool::from(provided_bytes.ct_eq(key_bytes))
    })
}

/// Extract client IP address, respecting trusted proxies
///
/// X-Forwarded-For is only honored when the TCP peer is a configured trusted proxy.
fn get_client_ip(
    request: &Request,
    connect_info: Option<&axum::extract::ConnectInfo<std::net::SocketAddr>>,
    trusted_proxies: &[IpNet],
) -> Option<std::net::IpAddr> {
    let peer_ip = connect_info.map(|ci| ci.0.ip())?;

    if trusted_proxies.is_empty() || !is_ip_trusted(&peer_ip, trusted_proxies) {
        return Some(peer_ip);
    }

    // X-Forwarded-For format: "client, proxy1, proxy2" - take the first (original client)
    let forwarded: Option<std::net::IpAddr> = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|ip| ip.trim().parse().ok());

    // Fallback: X-Real-IP
    let real_ip = || -> Option<std::net::IpAddr> {
        request
            .headers()
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|ip| ip.trim().parse().ok())
    };

    Some(forwarded.or_else(real_ip).unwrap_or(peer_ip))
}

/// Check if an IP address is within any of the trusted networks
fn is_ip_trusted(ip: &std::net::IpAddr, trusted_networks: &[IpNet]) -> bool {
    trusted_networks.iter().any(|network| network.contains(ip))
}

/// Parse a comma-separated list of IP addresses and CIDR networks
///
/// Examples:
/// - "192.168.1.0/24" - entire subnet
/// - "10.0.0.5" - single IP (parsed as /32 for IPv4 or /128 for IPv6)
/// - "192.168.1.0/24,10.0.0.0/8" - multiple networks
pub fn parse_trusted_networks(input: &str) -> Vec<IpNet> {
    input
        .split(',')
        .filter_map(|s| {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if let Ok(net) = s.parse::<IpNet>() {
                return Some(net);
            }
            if let Ok(ip) = s.parse::<std::net::IpAddr>() {
                return Some(IpNet::from(ip));
            }
            warn!(input = s, "Failed to parse trusted network entry");
            None
        })
        .collect()
}

/// Identity resolved by `auth_middleware` for this request
pub fn request_identity(request: &Request) -> Result<Identity, AppError> {
    request
        .extensions()
        .get::<Identity>()
        .cloned()
        .ok_or_else(|| AppError::internal("Request identity missing"))
}

/// The user id journal data is scoped to and audit entries are recorded under
pub fn get_user_id(request: &Request) -> Result<String, AppError> {
    request_identity(request).map(|identity| identity.user)
}

/// Success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Create the application router
pub fn create_router(db: Database, static_dir: Option<&str>, config: ServerConfig) -> Router {
    let state = Arc::new(AppState {
        db,
        config: config.clone(),
    });

    let api_routes = Router::new()
        // Auth
        .route("/me", get(handlers::get_me))
        // Journal
        .route(
            "/journal",
            get(handlers::list_journal).post(handlers::create_journal_entry),
        )
        .route("/journal/reasons", get(handlers::list_reasons))
        .route(
            "/journal/:id",
            get(handlers::get_journal_entry)
                .put(handlers::update_journal_entry)
                .delete(handlers::delete_journal_entry),
        )
        // Insights
        .route("/insights/mood", get(handlers::get_mood_insights))
        .route("/insights/streak", get(handlers::get_streaks))
        // Breathing
        .route("/breathing/patterns", get(handlers::list_breathing_patterns))
        .route(
            "/breathing/patterns/:name",
            get(handlers::get_breathing_pattern),
        )
        .route(
            "/breathing/sessions",
            get(handlers::list_breathing_sessions).post(handlers::log_breathing_session),
        )
        // Import / export
        .route("/export/journal", get(handlers::export_journal))
        .route(
            "/import/journal",
            axum::routing::post(handlers::import_journal),
        )
        // Audit
        .route("/audit", get(handlers::list_audit_log));

    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    // CSP: restrict scripts to same-origin, allow inline styles
    let csp_value = HeaderValue::from_static(
        "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; connect-src 'self'; frame-ancestors 'none'",
    );

    let mut app = Router::new()
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp_value,
        ));

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if !config.require_auth {
        warn!("⚠️  Authentication disabled - do not expose to network!");
    }

    let app = create_router(db, static_dir, config)
        .into_make_service_with_connect_info::<std::net::SocketAddr>();
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }

    /// Map a core error, surfacing caller mistakes as 4xx and hiding everything else
    pub fn from_core(err: moodlog_core::Error) -> Self {
        use moodlog_core::Error;

        match err {
            Error::InvalidData(msg) | Error::Import(msg) => Self::bad_request(&msg),
            Error::Csv(e) => Self::bad_request(&format!("Invalid CSV: {}", e)),
            Error::NotFound(msg) => Self::not_found(&format!("{} not found", msg)),
            other => other.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

#[cfg(test)]
mod tests;
