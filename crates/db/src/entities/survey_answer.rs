//! Survey answer entity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Table name.
pub const TABLE: &str = "survey_answers";

/// Answer to one question within a response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub response_id: Uuid,
    pub question_id: Uuid,
    pub answer: String,
}

/// Insert payload.
#[derive(Clone, Debug, Serialize)]
pub struct NewSurveyAnswer {
    pub response_id: Uuid,
    pub question_id: Uuid,
    pub answer: String,
}
