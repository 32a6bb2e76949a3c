//! Notification entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Table name.
pub const TABLE: &str = "notifications";

/// Notification type for admin replies.
pub const TYPE_REPLY: &str = "reply";

/// Notification type for announcements.
pub const TYPE_ANNOUNCEMENT: &str = "announcement";

/// A per-user notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    /// Recipient.
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    /// Kind of event, e.g. `reply` or `announcement`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Row the notification points at (complaint or announcement).
    #[serde(default)]
    pub related_id: Option<Uuid>,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
