//! Complaint conversation message entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Table name.
pub const TABLE: &str = "complaint_messages";

/// A message in the student-visible conversation of a complaint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub complaint_id: Uuid,
    /// Student or admin who wrote the message.
    pub sender_id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload.
#[derive(Clone, Debug, Serialize)]
pub struct NewMessage {
    pub complaint_id: Uuid,
    pub sender_id: Uuid,
    pub message: String,
}
