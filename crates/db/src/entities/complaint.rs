//! Complaint entity.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Table name.
pub const TABLE: &str = "complaints";

/// Complaint category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintCategory {
    Academic,
    Infrastructure,
    Technical,
    Administrative,
    Other,
}

impl ComplaintCategory {
    /// Every category, in display order.
    pub const ALL: [Self; 5] = [
        Self::Academic,
        Self::Infrastructure,
        Self::Technical,
        Self::Administrative,
        Self::Other,
    ];

    /// Database value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Academic => "academic",
            Self::Infrastructure => "infrastructure",
            Self::Technical => "technical",
            Self::Administrative => "administrative",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ComplaintCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complaint priority. Chosen on submission, adjustable by admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintPriority {
    Low,
    Medium,
    High,
}

/// Complaint lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Pending,
    InProgress,
    Resolved,
}

impl ComplaintStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::InProgress, Self::Resolved];

    /// Database value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complaint row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Unique complaint ID.
    pub id: Uuid,

    /// Short summary.
    pub title: String,

    /// Full description.
    pub description: String,

    /// Category chosen by the student or an admin.
    pub category: ComplaintCategory,

    /// Priority, unset until triaged.
    #[serde(default)]
    pub priority: Option<ComplaintPriority>,

    /// Lifecycle status.
    pub status: ComplaintStatus,

    /// Hide the student's identity from admins in listings.
    #[serde(default)]
    pub is_anonymous: bool,

    /// Student rating of the resolution (1..=5).
    #[serde(default)]
    pub rating: Option<i32>,

    /// Student feedback accompanying the rating.
    #[serde(default)]
    pub feedback: Option<String>,

    /// Submitting student.
    pub student_id: Uuid,

    /// Admin the complaint is assigned to.
    #[serde(default)]
    pub assigned_admin_id: Option<Uuid>,

    /// When the complaint was created.
    pub created_at: DateTime<Utc>,

    /// When the complaint was last updated.
    pub updated_at: DateTime<Utc>,

    /// When the complaint was moved to the trash.
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,

    /// Who moved it to the trash.
    #[serde(default)]
    pub deleted_by: Option<Uuid>,
}

impl Model {
    /// Whether the complaint is in the trash.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Insert payload.
#[derive(Clone, Debug, Serialize)]
pub struct NewComplaint {
    pub title: String,
    pub description: String,
    pub category: ComplaintCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<ComplaintPriority>,
    pub is_anonymous: bool,
    pub student_id: Uuid,
    pub status: ComplaintStatus,
}

/// Partial update. `Some(None)` writes an explicit null.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ComplaintChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ComplaintCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Option<ComplaintPriority>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ComplaintStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_anonymous: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_admin_id: Option<Option<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<Option<Uuid>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_row() {
        let row: Model = serde_json::from_value(json!({
            "id": "6f1d2c3b-0000-4000-8000-000000000001",
            "title": "Projector broken",
            "description": "The projector in room 204 has not worked for a week.",
            "category": "infrastructure",
            "priority": null,
            "status": "in_progress",
            "is_anonymous": false,
            "rating": null,
            "feedback": null,
            "student_id": "6f1d2c3b-0000-4000-8000-000000000002",
            "assigned_admin_id": null,
            "created_at": "2024-03-01T10:00:00.123456+00:00",
            "updated_at": "2024-03-02T10:00:00+00:00",
            "deleted_at": null,
            "deleted_by": null
        }))
        .unwrap();

        assert_eq!(row.category, ComplaintCategory::Infrastructure);
        assert_eq!(row.status, ComplaintStatus::InProgress);
        assert!(!row.is_deleted());
    }

    #[test]
    fn test_changes_write_explicit_nulls() {
        let restore = ComplaintChanges {
            deleted_at: Some(None),
            deleted_by: Some(None),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&restore).unwrap(),
            json!({"deleted_at": null, "deleted_by": null})
        );
    }
}
