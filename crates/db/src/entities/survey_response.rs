//! Survey response entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Table name.
pub const TABLE: &str = "survey_responses";

/// One user's submission of a survey.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert payload.
#[derive(Clone, Debug, Serialize)]
pub struct NewSurveyResponse {
    pub survey_id: Uuid,
    pub user_id: Uuid,
}
