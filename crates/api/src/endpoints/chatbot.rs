//! Chatbot relay endpoint.

use axum::{
    Router,
    body::{Body, Bytes},
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::post,
};
use broto_common::{AppError, AppResult};
use serde_json::Value;
use tracing::info;

use crate::{extractors::Caller, middleware::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(relay))
}

/// The `messages` array of a relay request. Anything else is rejected.
fn parse_messages(body: &[u8]) -> AppResult<Vec<Value>> {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|mut v| match v.get_mut("messages").map(Value::take) {
            Some(Value::Array(messages)) => Some(messages),
            _ => None,
        })
        .ok_or_else(|| AppError::BadRequest("Invalid messages format".to_string()))
}

async fn relay(
    State(state): State<AppState>,
    Caller(user): Caller,
    body: Bytes,
) -> AppResult<Response> {
    let messages = parse_messages(&body)?;
    info!(user_id = %user.id, turns = messages.len(), "Relaying chat");

    let upstream = state.gateway.complete(messages).await?;

    Ok((
        [(header::CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(upstream.bytes_stream()),
    )
        .into_response())
}
