//! API endpoints.

mod chatbot;

use axum::Router;

use crate::middleware::AppState;

/// Path the app posts chat history to.
pub const CHATBOT_PATH: &str = "/functions/v1/chatbot";

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new().nest(CHATBOT_PATH, chatbot::router())
}
