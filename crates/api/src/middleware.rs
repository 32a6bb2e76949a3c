//! API middleware.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request, header},
    middleware::Next,
    response::Response,
};
use broto_common::{AppError, AppResult, Config};
use broto_db::{AuthClient, BackendClient};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::gateway::Gateway;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Resolves caller tokens to users.
    pub auth: AuthClient,
    /// Upstream chat completions.
    pub gateway: Gateway,
}

impl AppState {
    /// Build the state from configuration.
    pub fn new(config: &Config) -> AppResult<Self> {
        let backend = BackendClient::new(&config.backend)?;
        Ok(Self {
            auth: AuthClient::new(backend),
            gateway: Gateway::new(&config.chatbot)?,
        })
    }
}

/// CORS for browser callers: any origin, and the headers the app sends.
#[must_use]
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
}

/// Authentication middleware.
///
/// Rejects requests without a bearer token the auth service accepts, and
/// stores the resolved [`broto_db::AuthUser`] in the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(auth_header) = req.headers().get(header::AUTHORIZATION) else {
        warn!("Missing authorization header");
        return Err(AppError::Unauthorized("Missing authorization".to_string()));
    };

    let token = auth_header
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))?;

    let user = state.auth.get_user(&token).await.map_err(|e| {
        warn!(error = %e, "Authentication failed");
        AppError::Unauthorized("Unauthorized".to_string())
    })?;

    info!(user_id = %user.id, "Authenticated user");
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
