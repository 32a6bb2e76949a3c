//! Bucket storage over the hosted object store.

use broto_common::{AppError, AppResult, StorageBackend, UploadedFile};
use bytes::Bytes;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::client::{BackendClient, Surface, decode};

/// Storage backend writing to the configured attachment bucket.
#[derive(Clone)]
pub struct BucketStorage {
    client: BackendClient,
}

impl BucketStorage {
    /// Create a new bucket storage backend.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

#[async_trait::async_trait]
impl StorageBackend for BucketStorage {
    async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> AppResult<UploadedFile> {
        let size = data.len() as u64;
        let url = self
            .client
            .endpoint(&format!("storage/v1/object/{}/{key}", self.client.bucket()))?;

        let request = self
            .client
            .request(Method::POST, url)
            .await
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(data);

        self.client.send(request, Surface::Storage).await?;
        info!(key, size, "Uploaded attachment");

        Ok(UploadedFile {
            key: key.to_string(),
            size,
            content_type: content_type.to_string(),
        })
    }

    async fn remove(&self, keys: &[String]) -> AppResult<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let url = self
            .client
            .endpoint(&format!("storage/v1/object/{}", self.client.bucket()))?;
        let request = self
            .client
            .request(Method::DELETE, url)
            .await
            .json(&json!({ "prefixes": keys }));

        self.client.send(request, Surface::Storage).await?;
        debug!(count = keys.len(), "Removed attachments");
        Ok(())
    }

    async fn signed_url(&self, key: &str) -> AppResult<String> {
        let url = self
            .client
            .endpoint(&format!("storage/v1/object/sign/{}/{key}", self.client.bucket()))?;
        let request = self
            .client
            .request(Method::POST, url)
            .await
            .json(&json!({ "expiresIn": self.client.signed_url_ttl_secs() }));

        let response = self.client.send(request, Surface::Storage).await?;
        let signed: SignedUrlResponse = decode(response, Surface::Storage).await?;

        // The service answers with a path relative to `/storage/v1`.
        let absolute = self
            .client
            .endpoint(&format!("storage/v1/{}", signed.signed_url.trim_start_matches('/')))
            .map_err(|e| AppError::Storage(e.to_string()))?;
        Ok(absolute.to_string())
    }
}
