//! Survey repository.

use broto_common::{AppError, AppResult};
use uuid::Uuid;

use crate::client::BackendClient;
use crate::entities::survey::{self, NewSurvey, SurveyChanges};
use crate::entities::survey_answer::{self, NewSurveyAnswer};
use crate::entities::survey_question::{self, NewSurveyQuestion};
use crate::entities::survey_response::{self, NewSurveyResponse};
use crate::entities::{Survey, SurveyAnswer, SurveyQuestion, SurveyResponse};
use crate::query::Query;

/// Repository for surveys, questions, responses and answers.
#[derive(Clone)]
pub struct SurveyRepository {
    client: BackendClient,
}

impl SurveyRepository {
    /// Create a new survey repository.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Find a survey by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Survey>> {
        self.client
            .select_first(&Query::table(survey::TABLE).eq("id", id))
            .await
    }

    /// Every survey, newest first.
    pub async fn find_all(&self) -> AppResult<Vec<Survey>> {
        self.client
            .select(&Query::table(survey::TABLE).order_desc("created_at"))
            .await
    }

    /// Questions of the given surveys, in survey order.
    pub async fn find_questions(&self, survey_ids: &[Uuid]) -> AppResult<Vec<SurveyQuestion>> {
        if survey_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.client
            .select(
                &Query::table(survey_question::TABLE)
                    .in_list("survey_id", survey_ids)
                    .order_asc("order_index"),
            )
            .await
    }

    /// Responses to the given surveys.
    pub async fn find_responses(&self, survey_ids: &[Uuid]) -> AppResult<Vec<SurveyResponse>> {
        if survey_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.client
            .select(&Query::table(survey_response::TABLE).in_list("survey_id", survey_ids))
            .await
    }

    /// Answers belonging to the given responses.
    pub async fn find_answers(&self, response_ids: &[Uuid]) -> AppResult<Vec<SurveyAnswer>> {
        if response_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.client
            .select(&Query::table(survey_answer::TABLE).in_list("response_id", response_ids))
            .await
    }

    /// Create a survey.
    pub async fn create(&self, new: &NewSurvey) -> AppResult<Survey> {
        self.client.insert(survey::TABLE, new).await
    }

    /// Create questions for a survey.
    pub async fn create_questions(
        &self,
        questions: &[NewSurveyQuestion],
    ) -> AppResult<Vec<SurveyQuestion>> {
        self.client.insert_many(survey_question::TABLE, questions).await
    }

    /// Record a response header.
    pub async fn create_response(&self, new: &NewSurveyResponse) -> AppResult<SurveyResponse> {
        self.client.insert(survey_response::TABLE, new).await
    }

    /// Record the answers of a response.
    pub async fn create_answers(&self, answers: &[NewSurveyAnswer]) -> AppResult<Vec<SurveyAnswer>> {
        self.client.insert_many(survey_answer::TABLE, answers).await
    }

    /// Apply admin toggles.
    pub async fn update(&self, id: Uuid, changes: &SurveyChanges) -> AppResult<Survey> {
        let rows: Vec<Survey> = self
            .client
            .update(&Query::table(survey::TABLE).eq("id", id), changes)
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Survey not found".to_string()))
    }

    /// Delete a survey. Questions and responses cascade.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.client
            .delete(&Query::table(survey::TABLE).eq("id", id))
            .await
    }
}
