//! Survey entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Table name.
pub const TABLE: &str = "surveys";

/// A multi-question survey.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub show_results: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Model {
    /// Whether the expiry date has passed at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date.is_some_and(|expiry| expiry < now)
    }
}

/// Insert payload.
#[derive(Clone, Debug, Serialize)]
pub struct NewSurvey {
    pub title: String,
    pub description: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub show_results: bool,
    pub created_by: Uuid,
}

/// Admin toggles.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SurveyChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_results: Option<bool>,
}
