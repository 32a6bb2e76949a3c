//! HTTP layer for the Broto Complain Track chatbot relay.
//!
//! One authenticated endpoint takes the chat history from the app, prepends
//! the assistant's system prompt, and streams the AI gateway's reply back as
//! server-sent events.
//!
//! - **Middleware**: bearer authentication against the auth service, CORS
//! - **Gateway**: the upstream chat-completions client and its error mapping
//! - **Endpoints**: the relay route

pub mod endpoints;
pub mod extractors;
pub mod gateway;
pub mod middleware;
pub mod prompt;

pub use endpoints::router;
pub use gateway::Gateway;
pub use middleware::AppState;

use axum::{Router, middleware::from_fn_with_state};
use tower_http::trace::TraceLayer;

/// The relay with authentication, CORS and request tracing applied.
pub fn app(state: AppState) -> Router {
    router()
        .route_layer(from_fn_with_state(state.clone(), middleware::auth_middleware))
        .layer(middleware::cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
