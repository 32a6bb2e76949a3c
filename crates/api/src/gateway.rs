//! Client for the AI gateway's chat completions endpoint.

use std::time::Duration;

use broto_common::{AppError, AppResult, ChatbotConfig};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tracing::{debug, error};

use crate::prompt::SYSTEM_PROMPT;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Streams completions from the gateway.
#[derive(Clone)]
pub struct Gateway {
    http: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

impl Gateway {
    /// Create a gateway client. No overall timeout: replies stream for as
    /// long as the model writes.
    pub fn new(config: &ChatbotConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            url: config.gateway_url.clone(),
            api_key: config.gateway_api_key.clone(),
            model: config.model.clone(),
        })
    }

    /// Request body: the system prompt followed by the caller's messages.
    #[must_use]
    pub fn request_body(&self, messages: Vec<Value>) -> Value {
        let mut all = Vec::with_capacity(messages.len() + 1);
        all.push(json!({ "role": "system", "content": SYSTEM_PROMPT }));
        all.extend(messages);

        json!({
            "model": self.model,
            "messages": all,
            "stream": true,
        })
    }

    /// Start a streamed completion. The returned response has a success
    /// status; its body is the event stream.
    pub async fn complete(&self, messages: Vec<Value>) -> AppResult<reqwest::Response> {
        if self.api_key.is_empty() {
            return Err(AppError::Config(
                "AI gateway key is not configured".to_string(),
            ));
        }

        debug!(turns = messages.len(), model = %self.model, "Forwarding to AI gateway");
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(messages))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "AI gateway request failed");
                AppError::ExternalService("AI service error".to_string())
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!(status = %status, body = %body, "AI gateway error");
        Err(status_error(status))
    }
}

/// Error answered to the app for a failed gateway status.
#[must_use]
pub fn status_error(status: StatusCode) -> AppError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            AppError::RateLimited("Rate limit exceeded. Please try again later.".to_string())
        }
        StatusCode::PAYMENT_REQUIRED => AppError::QuotaExceeded(
            "AI service temporarily unavailable. Please try again later.".to_string(),
        ),
        _ => AppError::ExternalService("AI service error".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> Gateway {
        Gateway::new(&ChatbotConfig {
            gateway_api_key: "key".to_string(),
            ..ChatbotConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_request_body_prepends_system_prompt() {
        let body = gateway().request_body(vec![json!({"role": "user", "content": "hi"})]);

        assert_eq!(body["model"], "google/gemini-2.5-flash");
        assert_eq!(body["stream"], true);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["content"], "hi");
    }

    #[test]
    fn test_status_mapping() {
        let limited = status_error(StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(limited.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            limited.user_message(),
            "Rate limit exceeded. Please try again later."
        );

        let quota = status_error(StatusCode::PAYMENT_REQUIRED);
        assert_eq!(quota.status_code(), StatusCode::PAYMENT_REQUIRED);

        let other = status_error(StatusCode::BAD_GATEWAY);
        assert_eq!(other.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(other.user_message(), "AI service error");
    }

    #[tokio::test]
    async fn test_missing_key_is_a_config_error() {
        let gateway = Gateway::new(&ChatbotConfig::default()).unwrap();
        let err = gateway.complete(Vec::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
