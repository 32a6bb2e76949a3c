//! Object storage abstraction for complaint attachments.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::AppResult;

/// A file picked by the user, not yet uploaded.
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Original file name as shown to users.
    pub name: String,
    /// MIME content type reported by the picker.
    pub content_type: String,
    /// File contents.
    pub data: Bytes,
}

impl FileUpload {
    /// Create a new pending upload.
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Extension taken from the file name, without the dot.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }
}

/// Uploaded object metadata.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Object path inside the bucket.
    pub key: String,
    /// File size in bytes.
    pub size: u64,
    /// MIME content type.
    pub content_type: String,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Upload an object under `key`.
    async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> AppResult<UploadedFile>;

    /// Remove objects by key.
    async fn remove(&self, keys: &[String]) -> AppResult<()>;

    /// Create a time-limited download URL for a key.
    async fn signed_url(&self, key: &str) -> AppResult<String>;
}

/// Object path for a complaint attachment: `{complaint_id}/{millis}.{ext}`.
#[must_use]
pub fn attachment_key(complaint_id: Uuid, file: &FileUpload, at: DateTime<Utc>) -> String {
    let millis = at.timestamp_millis();
    match file.extension() {
        Some(ext) => format!("{complaint_id}/{millis}.{ext}"),
        None => format!("{complaint_id}/{millis}"),
    }
}
