//! Client for the chatbot relay function.

use std::pin::Pin;

use broto_common::{AppError, AppResult};
use broto_db::BackendClient;
use futures::{Stream, StreamExt};
use serde_json::{Value, json};
use tracing::{debug, error, warn};

use super::session::{ChatMessage, ChatSession};
use super::stream::decode_stream;

const CHATBOT_PATH: &str = "functions/v1/chatbot";

/// Reply fragments in arrival order.
pub type FragmentStream = Pin<Box<dyn Stream<Item = AppResult<String>> + Send>>;

/// Posts conversations to the relay and reads the streamed reply.
#[derive(Clone)]
pub struct ChatClient {
    client: BackendClient,
}

impl ChatClient {
    /// Create a client that posts with the session held by `client`.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Send `history` and return the reply as a stream of fragments.
    pub async fn stream_reply(
        &self,
        history: &[ChatMessage],
    ) -> AppResult<FragmentStream> {
        let token = self
            .client
            .access_token()
            .await
            .ok_or_else(|| AppError::Unauthorized("Please log in to use the chatbot".to_string()))?;

        let url = self.client.endpoint(CHATBOT_PATH)?;
        debug!(turns = history.len(), "Sending chat request");
        let response = self
            .client
            .http()
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "messages": history }))
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Chat request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| body["error"].as_str().map(ToString::to_string))
                .unwrap_or_else(|| "Failed to get response".to_string());
            warn!(status = %status, message = %message, "Chatbot returned an error");
            return Err(AppError::ExternalService(message));
        }

        Ok(Box::pin(decode_stream(response.bytes_stream())))
    }

    /// Run one exchange on `session`: record `text`, stream the reply into
    /// the session and finish it, or append the apology on failure.
    ///
    /// Returns `false` when the input was ignored.
    pub async fn send(&self, session: &mut ChatSession, text: &str) -> bool {
        let Some(history) = session.begin(text) else {
            return false;
        };

        match self.stream_reply(&history).await {
            Ok(mut stream) => {
                while let Some(item) = stream.next().await {
                    match item {
                        Ok(fragment) => session.apply(&fragment),
                        Err(e) => {
                            error!(error = %e, "Chat error");
                            session.fail();
                            return true;
                        }
                    }
                }
                session.finish();
            }
            Err(e) => {
                error!(error = %e, "Chat error");
                session.fail();
            }
        }
        true
    }
}
