//! HTTP client for the hosted backend.
//!
//! Every request carries the project `apikey` header and a bearer token:
//! the signed-in session's access token when there is one, the anonymous key
//! otherwise.

use std::sync::Arc;

use broto_common::{AppError, AppResult, BackendConfig};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

use crate::auth::Session;
use crate::query::Query;

/// Which backend surface a request went to. Picks the error variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Surface {
    Rest,
    Storage,
    Auth,
}

struct ClientInner {
    http: reqwest::Client,
    base: Url,
    anon_key: String,
    bucket: String,
    signed_url_ttl_secs: u64,
    session: RwLock<Option<Session>>,
}

/// Shared handle to the hosted backend.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<ClientInner>,
}

impl BackendClient {
    /// Create a new backend client.
    pub fn new(config: &BackendConfig) -> AppResult<Self> {
        let base = Url::parse(config.url.trim_end_matches('/'))
            .map_err(|e| AppError::Config(format!("Invalid backend url: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                base,
                anon_key: config.anon_key.clone(),
                bucket: config.attachments_bucket.clone(),
                signed_url_ttl_secs: config.signed_url_ttl_secs,
                session: RwLock::new(None),
            }),
        })
    }

    /// Project base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base
    }

    /// Anonymous project key.
    #[must_use]
    pub fn anon_key(&self) -> &str {
        &self.inner.anon_key
    }

    /// Attachment bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.inner.bucket
    }

    /// Signed URL lifetime in seconds.
    #[must_use]
    pub fn signed_url_ttl_secs(&self) -> u64 {
        self.inner.signed_url_ttl_secs
    }

    /// Underlying HTTP client, shared with other callers.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    /// Current session, if signed in.
    pub async fn session(&self) -> Option<Session> {
        self.inner.session.read().await.clone()
    }

    /// Current access token, if signed in.
    pub async fn access_token(&self) -> Option<String> {
        self.inner
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    /// Replace the stored session.
    pub async fn set_session(&self, session: Option<Session>) {
        *self.inner.session.write().await = session;
    }

    /// Absolute URL for a path below the project root.
    pub fn endpoint(&self, path: &str) -> AppResult<Url> {
        let raw = format!(
            "{}/{}",
            self.inner.base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&raw).map_err(|e| AppError::Internal(format!("Invalid endpoint {raw}: {e}")))
    }

    /// Start a request with the project key and the session bearer.
    pub(crate) async fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = self
            .access_token()
            .await
            .unwrap_or_else(|| self.inner.anon_key.clone());
        self.request_with_token(method, url, &bearer)
    }

    /// Start a request with an explicit bearer token.
    pub(crate) fn request_with_token(&self, method: Method, url: Url, token: &str) -> RequestBuilder {
        self.inner
            .http
            .request(method, url)
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(token)
    }

    /// Send a request and turn non-success statuses into [`AppError`]s.
    pub(crate) async fn send(&self, request: RequestBuilder, surface: Surface) -> AppResult<Response> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Backend request failed");
            surface.error(format!("Request failed: {e}"))
        })?;

        if response.status().is_success() {
            return Ok(response);
        }

        Err(error_from_response(response, surface).await)
    }

    // === Row API ===

    fn rest_url(&self, table: &str) -> AppResult<Url> {
        self.endpoint(&format!("rest/v1/{table}"))
    }

    /// Read rows matching `query`.
    pub async fn select<T: DeserializeOwned>(&self, query: &Query) -> AppResult<Vec<T>> {
        debug!(table = query.table_name(), "select");
        let url = self.rest_url(query.table_name())?;
        let request = self
            .request(Method::GET, url)
            .await
            .query(&query.read_pairs());

        let response = self.send(request, Surface::Rest).await?;
        decode(response, Surface::Rest).await
    }

    /// Read the first row matching `query`.
    pub async fn select_first<T: DeserializeOwned>(&self, query: &Query) -> AppResult<Option<T>> {
        let rows = self.select(&query.clone().limit(1)).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert one row and return it as stored.
    pub async fn insert<B, T>(&self, table: &str, row: &B) -> AppResult<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        debug!(table, "insert");
        let url = self.rest_url(table)?;
        let request = self
            .request(Method::POST, url)
            .await
            .header("Prefer", "return=representation")
            .json(row);

        let response = self.send(request, Surface::Rest).await?;
        let rows: Vec<T> = decode(response, Surface::Rest).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::Backend(format!("Insert into {table} returned no row")))
    }

    /// Insert several rows in one request.
    pub async fn insert_many<B, T>(&self, table: &str, rows: &[B]) -> AppResult<Vec<T>>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        debug!(table, count = rows.len(), "insert many");
        let url = self.rest_url(table)?;
        let request = self
            .request(Method::POST, url)
            .await
            .header("Prefer", "return=representation")
            .json(rows);

        let response = self.send(request, Surface::Rest).await?;
        decode(response, Surface::Rest).await
    }

    /// Patch rows matching `query` and return them.
    pub async fn update<B, T>(&self, query: &Query, changes: &B) -> AppResult<Vec<T>>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        debug!(table = query.table_name(), "update");
        let url = self.rest_url(query.table_name())?;
        let request = self
            .request(Method::PATCH, url)
            .await
            .query(&query.filter_pairs())
            .header("Prefer", "return=representation")
            .json(changes);

        let response = self.send(request, Surface::Rest).await?;
        decode(response, Surface::Rest).await
    }

    /// Delete rows matching `query`.
    pub async fn delete(&self, query: &Query) -> AppResult<()> {
        // PostgREST refuses unfiltered deletes; so do we.
        if !query.has_filters() {
            return Err(AppError::BadRequest(format!(
                "Refusing to delete every row of {}",
                query.table_name()
            )));
        }

        debug!(table = query.table_name(), "delete");
        let url = self.rest_url(query.table_name())?;
        let request = self
            .request(Method::DELETE, url)
            .await
            .query(&query.filter_pairs());

        self.send(request, Surface::Rest).await?;
        Ok(())
    }

    /// Call a database function.
    pub async fn rpc<B, T>(&self, function: &str, args: &B) -> AppResult<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        debug!(function, "rpc");
        let url = self.endpoint(&format!("rest/v1/rpc/{function}"))?;
        let request = self.request(Method::POST, url).await.json(args);

        let response = self.send(request, Surface::Rest).await?;
        decode(response, Surface::Rest).await
    }
}

impl Surface {
    pub(crate) fn error(self, message: String) -> AppError {
        match self {
            Self::Rest => AppError::Backend(message),
            Self::Storage => AppError::Storage(message),
            Self::Auth => AppError::Auth(message),
        }
    }
}

pub(crate) async fn decode<T: DeserializeOwned>(response: Response, surface: Surface) -> AppResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| surface.error(format!("Unexpected response body: {e}")))
}

/// Build an [`AppError`] from a failed backend response.
///
/// The row store, storage and auth services each report failures with a
/// different JSON shape; the first message-like field wins.
pub(crate) async fn error_from_response(response: Response, surface: Surface) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = extract_message(&body).unwrap_or_else(|| {
        if body.is_empty() {
            status.canonical_reason().unwrap_or("Request failed").to_string()
        } else {
            body.clone()
        }
    });

    warn!(status = %status, message = %message, "Backend returned an error");

    match status {
        StatusCode::UNAUTHORIZED => AppError::Unauthorized(message),
        StatusCode::FORBIDDEN => AppError::Forbidden(message),
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        StatusCode::CONFLICT => AppError::Conflict(message),
        StatusCode::TOO_MANY_REQUESTS => AppError::RateLimited(message),
        StatusCode::BAD_REQUEST if surface == Surface::Auth => AppError::Unauthorized(message),
        s if s.is_client_error() => AppError::BadRequest(message),
        _ => surface.error(message),
    }
}

fn extract_message(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| json[*key].as_str().map(ToString::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use broto_common::Config;
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize)]
    struct Row {
        id: i64,
        title: String,
    }

    fn client_for(server: &MockServer) -> BackendClient {
        BackendClient::new(&Config::for_backend(server.uri(), "anon-key").backend).unwrap()
    }

    #[tokio::test]
    async fn test_select_sends_key_and_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/complaints"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer anon-key"))
            .and(query_param("status", "eq.pending"))
            .and(query_param("order", "created_at.desc"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "title": "Broken fan"}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let rows: Vec<Row> = client
            .select(
                &Query::table("complaints")
                    .eq("status", "pending")
                    .order_desc("created_at"),
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[0].title, "Broken fan");
    }

    #[tokio::test]
    async fn test_insert_asks_for_representation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/complaints"))
            .and(header("prefer", "return=representation"))
            .and(body_json(json!({"title": "Wifi down"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": 7, "title": "Wifi down"}])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let row: Row = client
            .insert("complaints", &json!({"title": "Wifi down"}))
            .await
            .unwrap();
        assert_eq!(row.id, 7);
    }

    #[tokio::test]
    async fn test_error_message_is_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/complaints"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_json(json!({"code": "42501", "message": "permission denied"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .select::<Row>(&Query::table("complaints"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden(ref m) if m == "permission denied"));
    }

    #[tokio::test]
    async fn test_delete_requires_filter() {
        let server = MockServer::start().await;
        let client = client_for(&server);

        let err = client.delete(&Query::table("complaints")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_session_token_replaces_anon_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/has_role"))
            .and(header("authorization", "Bearer user-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client
            .set_session(Some(Session::for_tests("user-token", uuid::Uuid::nil())))
            .await;

        let is_admin: bool = client
            .rpc("has_role", &json!({"_user_id": uuid::Uuid::nil(), "_role": "admin"}))
            .await
            .unwrap();
        assert!(is_admin);
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let client =
            BackendClient::new(&Config::for_backend("http://localhost:54321/", "k").backend)
                .unwrap();
        assert_eq!(
            client.endpoint("/rest/v1/profiles").unwrap().as_str(),
            "http://localhost:54321/rest/v1/profiles"
        );
    }
}
