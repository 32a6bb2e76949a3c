//! Announcement entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Table name.
pub const TABLE: &str = "announcements";

/// Campus-wide announcement posted by an admin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Unique announcement ID.
    pub id: Uuid,

    /// Title of the announcement.
    pub title: String,

    /// Body of the announcement.
    pub message: String,

    /// Posting admin.
    pub admin_id: Uuid,

    /// Optional attachment link.
    #[serde(default)]
    pub attachment_url: Option<String>,

    /// When to stop showing the announcement. `None` never expires.
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,

    /// When the announcement was created.
    pub created_at: DateTime<Utc>,

    /// When the announcement was last updated.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// Whether the announcement is still visible at `now`.
    #[must_use]
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date.is_none_or(|expiry| expiry > now)
    }
}

/// Insert payload.
#[derive(Clone, Debug, Serialize)]
pub struct NewAnnouncement {
    pub title: String,
    pub message: String,
    pub admin_id: Uuid,
    pub attachment_url: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
}
