//! General app feedback entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Table name.
pub const TABLE: &str = "feedback";

/// Review state of a feedback entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    UnderReview,
    Accepted,
    Implemented,
}

/// What the feedback is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackCategory {
    Suggestion,
    Improvement,
    Bug,
}

/// Feedback about the app itself, not a complaint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: FeedbackCategory,
    pub status: FeedbackStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert payload.
#[derive(Clone, Debug, Serialize)]
pub struct NewFeedback {
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: FeedbackCategory,
}
