//! Official admin reply entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Table name.
pub const TABLE: &str = "complaint_replies";

/// An official reply posted by an admin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub complaint_id: Uuid,
    pub admin_id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload.
#[derive(Clone, Debug, Serialize)]
pub struct NewReply {
    pub complaint_id: Uuid,
    pub admin_id: Uuid,
    pub message: String,
}
