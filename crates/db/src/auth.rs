//! Auth service client (sign-up, password sign-in, session, user).

use broto_common::{AppError, AppResult};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::{BackendClient, Surface, decode, error_from_response};

/// An authenticated user as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// User ID; also the profile ID.
    pub id: Uuid,
    /// Login email.
    #[serde(default)]
    pub email: Option<String>,
    /// Free-form metadata given at sign-up (holds `name`).
    #[serde(default)]
    pub user_metadata: Value,
}

/// A signed-in session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Short-lived bearer token.
    pub access_token: String,
    /// Token used to obtain a fresh access token.
    pub refresh_token: String,
    /// Seconds until `access_token` expires.
    #[serde(default)]
    pub expires_in: i64,
    /// Token type, always `bearer`.
    #[serde(default)]
    pub token_type: String,
    /// The signed-in user.
    pub user: AuthUser,
}

impl Session {
    #[cfg(test)]
    pub(crate) fn for_tests(token: &str, user_id: Uuid) -> Self {
        Self {
            access_token: token.to_string(),
            refresh_token: "refresh".to_string(),
            expires_in: 3600,
            token_type: "bearer".to_string(),
            user: AuthUser {
                id: user_id,
                email: None,
                user_metadata: Value::Null,
            },
        }
    }
}

/// Client for the auth endpoints. Shares its session with the row client.
#[derive(Clone)]
pub struct AuthClient {
    client: BackendClient,
}

impl AuthClient {
    /// Create a new auth client.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Register a new account. Signs in immediately when the project
    /// auto-confirms emails.
    pub async fn sign_up(&self, email: &str, password: &str, name: &str) -> AppResult<AuthUser> {
        let url = self.client.endpoint("auth/v1/signup")?;
        let request = self
            .client
            .request_with_token(Method::POST, url, self.client.anon_key())
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "name": name },
            }));

        let response = self.client.send(request, Surface::Auth).await?;
        let body: Value = decode(response, Surface::Auth).await?;

        if body.get("access_token").is_some() {
            let session: Session = serde_json::from_value(body)?;
            let user = session.user.clone();
            self.client.set_session(Some(session)).await;
            info!(user_id = %user.id, "Signed up and signed in");
            return Ok(user);
        }

        let user_value = body.get("user").cloned().unwrap_or(body);
        let user: AuthUser = serde_json::from_value(user_value)?;
        info!(user_id = %user.id, "Signed up, awaiting confirmation");
        Ok(user)
    }

    /// Sign in with email and password and store the session.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<Session> {
        let session = self.password_grant(email, password).await?;
        self.client.set_session(Some(session.clone())).await;
        info!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    /// Check a password without touching the stored session.
    pub async fn verify_password(&self, email: &str, password: &str) -> AppResult<bool> {
        match self.password_grant(email, password).await {
            Ok(_) => Ok(true),
            Err(AppError::Unauthorized(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn password_grant(&self, email: &str, password: &str) -> AppResult<Session> {
        let mut url = self.client.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let request = self
            .client
            .request_with_token(Method::POST, url, self.client.anon_key())
            .json(&json!({ "email": email, "password": password }));

        let response = self.client.send(request, Surface::Auth).await?;
        decode(response, Surface::Auth).await
    }

    /// Exchange the stored refresh token for a new session.
    pub async fn refresh_session(&self) -> AppResult<Session> {
        let current = self
            .client
            .session()
            .await
            .ok_or_else(|| AppError::Unauthorized("Not signed in".to_string()))?;

        let mut url = self.client.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "refresh_token");

        let request = self
            .client
            .request_with_token(Method::POST, url, self.client.anon_key())
            .json(&json!({ "refresh_token": current.refresh_token }));

        let response = self.client.send(request, Surface::Auth).await?;
        let session: Session = decode(response, Surface::Auth).await?;
        self.client.set_session(Some(session.clone())).await;
        debug!(user_id = %session.user.id, "Session refreshed");
        Ok(session)
    }

    /// The stored session, if any.
    pub async fn current_session(&self) -> Option<Session> {
        self.client.session().await
    }

    /// Resolve the user owning `access_token`.
    pub async fn get_user(&self, access_token: &str) -> AppResult<AuthUser> {
        let url = self.client.endpoint("auth/v1/user")?;
        let request = self
            .client
            .request_with_token(Method::GET, url, access_token);

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Request failed: {e}")))?;

        match response.status() {
            s if s.is_success() => decode(response, Surface::Auth).await,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(AppError::Unauthorized("Unauthorized".to_string()))
            }
            _ => Err(error_from_response(response, Surface::Auth).await),
        }
    }

    /// The signed-in user, refreshed from the auth service.
    pub async fn current_user(&self) -> AppResult<AuthUser> {
        let token = self
            .client
            .access_token()
            .await
            .ok_or_else(|| AppError::Unauthorized("Not signed in".to_string()))?;
        self.get_user(&token).await
    }

    /// Change the signed-in user's password.
    pub async fn update_password(&self, new_password: &str) -> AppResult<()> {
        if self.client.access_token().await.is_none() {
            return Err(AppError::Unauthorized("Not signed in".to_string()));
        }

        let url = self.client.endpoint("auth/v1/user")?;
        let request = self
            .client
            .request(Method::PUT, url)
            .await
            .json(&json!({ "password": new_password }));

        self.client.send(request, Surface::Auth).await?;
        info!("Password updated");
        Ok(())
    }

    /// Revoke the session server-side and forget it locally.
    pub async fn sign_out(&self) -> AppResult<()> {
        if self.client.access_token().await.is_some() {
            let url = self.client.endpoint("auth/v1/logout")?;
            let request = self.client.request(Method::POST, url).await;
            if let Err(e) = self.client.send(request, Surface::Auth).await {
                warn!(error = %e, "Logout request failed; clearing local session anyway");
            }
        }

        self.client.set_session(None).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broto_common::Config;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session_json(token: &str) -> Value {
        json!({
            "access_token": token,
            "refresh_token": "refresh-1",
            "expires_in": 3600,
            "token_type": "bearer",
            "user": {
                "id": "6f1d2c3b-0000-4000-8000-000000000001",
                "email": "student@example.com",
                "user_metadata": {"name": "Asha"}
            }
        })
    }

    fn auth_for(server: &MockServer) -> (BackendClient, AuthClient) {
        let client =
            BackendClient::new(&Config::for_backend(server.uri(), "anon").backend).unwrap();
        (client.clone(), AuthClient::new(client))
    }

    #[tokio::test]
    async fn test_sign_in_stores_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(body_json(json!({"email": "student@example.com", "password": "secret123"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_json("tok-1")))
            .expect(1)
            .mount(&server)
            .await;

        let (client, auth) = auth_for(&server);
        let session = auth
            .sign_in_with_password("student@example.com", "secret123")
            .await
            .unwrap();

        assert_eq!(session.user.email.as_deref(), Some("student@example.com"));
        assert_eq!(client.access_token().await.as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn test_verify_password_does_not_replace_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let (client, auth) = auth_for(&server);
        client
            .set_session(Some(Session::for_tests("existing", Uuid::nil())))
            .await;

        let ok = auth
            .verify_password("student@example.com", "wrong")
            .await
            .unwrap();

        assert!(!ok);
        assert_eq!(client.access_token().await.as_deref(), Some("existing"));
    }

    #[tokio::test]
    async fn test_get_user_rejects_bad_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer bad"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"msg": "invalid JWT"})))
            .mount(&server)
            .await;

        let (_, auth) = auth_for(&server);
        let err = auth.get_user("bad").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Unauthorized"));
    }

    #[tokio::test]
    async fn test_sign_out_clears_session_even_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (client, auth) = auth_for(&server);
        client
            .set_session(Some(Session::for_tests("tok", Uuid::nil())))
            .await;

        auth.sign_out().await.unwrap();
        assert!(client.session().await.is_none());
    }

    #[tokio::test]
    async fn test_sign_up_without_confirmation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "6f1d2c3b-0000-4000-8000-000000000002",
                "email": "new@example.com",
                "user_metadata": {"name": "Ravi"}
            })))
            .mount(&server)
            .await;

        let (client, auth) = auth_for(&server);
        let user = auth
            .sign_up("new@example.com", "password1", "Ravi")
            .await
            .unwrap();

        assert_eq!(user.user_metadata["name"], "Ravi");
        assert!(client.session().await.is_none());
    }
}
