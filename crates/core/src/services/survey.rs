//! Survey service.

use std::collections::HashMap;

use broto_common::{AppError, AppResult};
use broto_db::entities::survey::{NewSurvey, SurveyChanges};
use broto_db::entities::survey_answer::NewSurveyAnswer;
use broto_db::entities::survey_question::NewSurveyQuestion;
use broto_db::entities::survey_response::NewSurveyResponse;
use broto_db::entities::{QuestionType, Survey, SurveyQuestion, SurveyResponse};
use broto_db::repositories::SurveyRepository;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::access::Viewer;
use super::poll::trimmed_opt;

/// A survey as the viewer sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurveyView {
    pub survey: Survey,
    /// Questions in display order.
    pub questions: Vec<SurveyQuestion>,
    pub has_responded: bool,
    pub is_expired: bool,
}

impl SurveyView {
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.survey.is_active && !self.is_expired
    }

    /// Whether the viewer may still answer.
    #[must_use]
    pub const fn can_respond(&self) -> bool {
        !self.has_responded && self.is_open()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SurveyBoard {
    pub active: Vec<SurveyView>,
    pub closed: Vec<SurveyView>,
}

/// One question of a new survey.
#[derive(Debug, Clone)]
pub struct QuestionInput {
    pub text: String,
    pub question_type: QuestionType,
    /// Choices for multiple-choice questions; ignored for text questions.
    pub options: Vec<String>,
}

/// Input for creating a survey.
#[derive(Debug, Clone, Default)]
pub struct CreateSurveyInput {
    pub title: String,
    pub description: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub show_results: bool,
    pub questions: Vec<QuestionInput>,
}

/// Answers to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerTally {
    /// Count per choice, in the question's option order.
    Choices { counts: Vec<(String, usize)> },
    /// Free-text answers as given.
    Text { answers: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionResults {
    pub question: SurveyQuestion,
    pub tally: AnswerTally,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurveyResults {
    pub survey_id: Uuid,
    pub response_count: usize,
    pub questions: Vec<QuestionResults>,
}

/// Build the survey board for one viewer.
#[must_use]
pub fn build_survey_board(
    surveys: Vec<Survey>,
    questions: &[SurveyQuestion],
    responses: &[SurveyResponse],
    viewer_id: Uuid,
    now: DateTime<Utc>,
) -> SurveyBoard {
    let (active, closed) = surveys
        .into_iter()
        .map(|survey| {
            let mut own: Vec<SurveyQuestion> = questions
                .iter()
                .filter(|q| q.survey_id == survey.id)
                .cloned()
                .collect();
            own.sort_by_key(|q| q.order_index);

            SurveyView {
                has_responded: responses
                    .iter()
                    .any(|r| r.survey_id == survey.id && r.user_id == viewer_id),
                is_expired: survey.is_expired_at(now),
                questions: own,
                survey,
            }
        })
        .partition(SurveyView::is_open);
    SurveyBoard { active, closed }
}

/// Survey service for business logic.
#[derive(Clone)]
pub struct SurveyService {
    survey_repo: SurveyRepository,
}

impl SurveyService {
    /// Create a new survey service.
    #[must_use]
    pub const fn new(survey_repo: SurveyRepository) -> Self {
        Self { survey_repo }
    }

    /// The surveys page.
    pub async fn board(&self, viewer: &Viewer) -> AppResult<SurveyBoard> {
        let surveys = self.survey_repo.find_all().await?;
        let ids: Vec<Uuid> = surveys.iter().map(|s| s.id).collect();
        let questions = self.survey_repo.find_questions(&ids).await?;
        let responses = self.survey_repo.find_responses(&ids).await?;
        Ok(build_survey_board(
            surveys,
            &questions,
            &responses,
            viewer.id,
            Utc::now(),
        ))
    }

    /// Submit answers keyed by question ID. Every question needs a
    /// non-blank answer. The response row is written before its answers.
    pub async fn submit(
        &self,
        viewer: &Viewer,
        survey_id: Uuid,
        answers: &HashMap<Uuid, String>,
    ) -> AppResult<SurveyResponse> {
        let survey = self
            .survey_repo
            .find_by_id(survey_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Survey not found".to_string()))?;
        let questions = self.survey_repo.find_questions(&[survey_id]).await?;

        let unanswered = questions.iter().any(|q| {
            answers
                .get(&q.id)
                .is_none_or(|a| a.trim().is_empty())
        });
        if unanswered {
            return Err(AppError::Validation("Please answer all questions".to_string()));
        }

        if !survey.is_active || survey.is_expired_at(Utc::now()) {
            return Err(AppError::BadRequest("This survey is closed".to_string()));
        }
        let responses = self.survey_repo.find_responses(&[survey_id]).await?;
        if responses.iter().any(|r| r.user_id == viewer.id) {
            return Err(AppError::Conflict(
                "You have already responded to this survey".to_string(),
            ));
        }

        let response = self
            .survey_repo
            .create_response(&NewSurveyResponse {
                survey_id,
                user_id: viewer.id,
            })
            .await?;

        let rows: Vec<NewSurveyAnswer> = questions
            .iter()
            .filter_map(|q| {
                answers.get(&q.id).map(|answer| NewSurveyAnswer {
                    response_id: response.id,
                    question_id: q.id,
                    answer: answer.trim().to_string(),
                })
            })
            .collect();
        self.survey_repo.create_answers(&rows).await?;

        Ok(response)
    }

    // === Admin ===

    /// Create a survey with its questions. Blank questions and blank choices
    /// are dropped.
    pub async fn create(&self, admin: &Viewer, input: CreateSurveyInput) -> AppResult<Survey> {
        admin.ensure_admin()?;
        let title = input.title.trim();
        let questions: Vec<&QuestionInput> = input
            .questions
            .iter()
            .filter(|q| !q.text.trim().is_empty())
            .collect();
        if title.is_empty() || questions.is_empty() {
            return Err(AppError::Validation(
                "Please provide a title and at least 1 question".to_string(),
            ));
        }

        let survey = self
            .survey_repo
            .create(&NewSurvey {
                title: title.to_string(),
                description: trimmed_opt(input.description.clone()),
                expiry_date: input.expiry_date,
                is_active: true,
                show_results: input.show_results,
                created_by: admin.id,
            })
            .await?;

        let rows: Vec<NewSurveyQuestion> = questions
            .iter()
            .zip(0..)
            .map(|(q, order_index)| NewSurveyQuestion {
                survey_id: survey.id,
                question_text: q.text.trim().to_string(),
                question_type: q.question_type,
                options: (q.question_type == QuestionType::MultipleChoice).then(|| {
                    q.options
                        .iter()
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                }),
                order_index,
            })
            .collect();
        self.survey_repo.create_questions(&rows).await?;

        info!(survey_id = %survey.id, questions = rows.len(), "Survey created");
        Ok(survey)
    }

    pub async fn set_active(&self, admin: &Viewer, id: Uuid, is_active: bool) -> AppResult<Survey> {
        admin.ensure_admin()?;
        self.survey_repo
            .update(
                id,
                &SurveyChanges {
                    is_active: Some(is_active),
                    ..Default::default()
                },
            )
            .await
    }

    pub async fn set_show_results(
        &self,
        admin: &Viewer,
        id: Uuid,
        show_results: bool,
    ) -> AppResult<Survey> {
        admin.ensure_admin()?;
        self.survey_repo
            .update(
                id,
                &SurveyChanges {
                    show_results: Some(show_results),
                    ..Default::default()
                },
            )
            .await
    }

    pub async fn delete(&self, admin: &Viewer, id: Uuid) -> AppResult<()> {
        admin.ensure_admin()?;
        self.survey_repo.delete(id).await
    }

    /// Per-question answer tallies.
    pub async fn results(&self, admin: &Viewer, survey_id: Uuid) -> AppResult<SurveyResults> {
        admin.ensure_admin()?;
        let questions = self.survey_repo.find_questions(&[survey_id]).await?;
        let responses = self.survey_repo.find_responses(&[survey_id]).await?;
        let response_ids: Vec<Uuid> = responses.iter().map(|r| r.id).collect();
        let answers = self.survey_repo.find_answers(&response_ids).await?;

        let questions = questions
            .into_iter()
            .map(|question| {
                let given: Vec<&str> = answers
                    .iter()
                    .filter(|a| a.question_id == question.id)
                    .map(|a| a.answer.as_str())
                    .collect();
                let tally = match question.question_type {
                    QuestionType::MultipleChoice => AnswerTally::Choices {
                        counts: question
                            .options
                            .iter()
                            .flatten()
                            .map(|choice| {
                                let n = given.iter().filter(|a| **a == choice.as_str()).count();
                                (choice.clone(), n)
                            })
                            .collect(),
                    },
                    QuestionType::Text => AnswerTally::Text {
                        answers: given.iter().map(ToString::to_string).collect(),
                    },
                };
                QuestionResults { question, tally }
            })
            .collect();

        Ok(SurveyResults {
            survey_id,
            response_count: responses.len(),
            questions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::backend_for;
    use broto_db::entities::AppRole;
    use chrono::Duration;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn survey(id: Uuid, is_active: bool, expiry: Option<DateTime<Utc>>) -> Survey {
        Survey {
            id,
            title: "Campus wifi".to_string(),
            description: None,
            expiry_date: expiry,
            is_active,
            show_results: false,
            created_by: Uuid::nil(),
            created_at: Utc::now(),
        }
    }

    fn question(survey_id: Uuid, order_index: i32) -> SurveyQuestion {
        SurveyQuestion {
            id: Uuid::new_v4(),
            survey_id,
            question_text: format!("Question {order_index}"),
            question_type: QuestionType::Text,
            options: None,
            order_index,
        }
    }

    fn student() -> Viewer {
        Viewer {
            id: Uuid::new_v4(),
            email: None,
            role: AppRole::Student,
        }
    }

    #[test]
    fn test_board_orders_questions_and_tracks_response() {
        let now = Utc::now();
        let me = Uuid::new_v4();
        let open = Uuid::new_v4();
        let expired = Uuid::new_v4();

        let questions = vec![question(open, 2), question(open, 1)];
        let responses = vec![SurveyResponse {
            id: Uuid::new_v4(),
            survey_id: open,
            user_id: me,
            created_at: None,
        }];

        let board = build_survey_board(
            vec![
                survey(open, true, None),
                survey(expired, true, Some(now - Duration::hours(1))),
            ],
            &questions,
            &responses,
            me,
            now,
        );

        assert_eq!(board.active.len(), 1);
        assert_eq!(board.active[0].questions[0].order_index, 1);
        assert!(board.active[0].has_responded);
        assert!(!board.active[0].can_respond());
        assert!(board.closed[0].is_expired);
    }

    #[tokio::test]
    async fn test_submit_requires_every_answer() {
        let server = MockServer::start().await;
        let survey_id = Uuid::new_v4();
        let q1 = question(survey_id, 0);
        let q2 = question(survey_id, 1);

        Mock::given(method("GET"))
            .and(path("/rest/v1/surveys"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([survey(survey_id, true, None)])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/survey_questions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([q1, q2])))
            .mount(&server)
            .await;

        let answers = HashMap::from([(q1.id, "Fine".to_string()), (q2.id, " ".to_string())]);
        let err = SurveyService::new(SurveyRepository::new(backend_for(&server)))
            .submit(&student(), survey_id, &answers)
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Please answer all questions");
    }

    #[tokio::test]
    async fn test_create_needs_a_question() {
        let server = MockServer::start().await;
        let admin = Viewer {
            id: Uuid::new_v4(),
            email: None,
            role: AppRole::Admin,
        };

        let err = SurveyService::new(SurveyRepository::new(backend_for(&server)))
            .create(
                &admin,
                CreateSurveyInput {
                    title: "Campus wifi".to_string(),
                    questions: vec![QuestionInput {
                        text: "  ".to_string(),
                        question_type: QuestionType::Text,
                        options: Vec::new(),
                    }],
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.user_message(),
            "Please provide a title and at least 1 question"
        );
    }
}
