//! Complaint attachment entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Table name.
pub const TABLE: &str = "complaint_attachments";

/// A file attached to a complaint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Unique attachment ID.
    pub id: Uuid,
    /// Owning complaint.
    pub complaint_id: Uuid,
    /// Original file name.
    pub file_name: String,
    /// Object path inside the attachment bucket.
    pub file_url: String,
    /// When the attachment was uploaded.
    pub created_at: DateTime<Utc>,
}

/// Insert payload.
#[derive(Clone, Debug, Serialize)]
pub struct NewAttachment {
    pub complaint_id: Uuid,
    pub file_name: String,
    pub file_url: String,
}
