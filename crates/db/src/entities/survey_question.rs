//! Survey question entity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Table name.
pub const TABLE: &str = "survey_questions";

/// How a question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// Pick one of `options`.
    MultipleChoice,
    /// Free text.
    Text,
}

/// A question in a survey.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,
    /// Choices for multiple-choice questions.
    #[serde(default)]
    pub options: Option<Vec<String>>,
    /// Position within the survey.
    pub order_index: i32,
}

/// Insert payload.
#[derive(Clone, Debug, Serialize)]
pub struct NewSurveyQuestion {
    pub survey_id: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,
    pub options: Option<Vec<String>>,
    pub order_index: i32,
}
