//! Feedback repository.

use broto_common::{AppError, AppResult};
use serde_json::json;
use uuid::Uuid;

use crate::client::BackendClient;
use crate::entities::feedback::{self, NewFeedback};
use crate::entities::{Feedback, FeedbackStatus};
use crate::query::Query;

/// Repository for app feedback.
#[derive(Clone)]
pub struct FeedbackRepository {
    client: BackendClient,
}

impl FeedbackRepository {
    /// Create a new feedback repository.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Every feedback entry, newest first.
    pub async fn find_all(&self) -> AppResult<Vec<Feedback>> {
        self.client
            .select(&Query::table(feedback::TABLE).order_desc("created_at"))
            .await
    }

    /// A user's feedback, newest first.
    pub async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<Feedback>> {
        self.client
            .select(
                &Query::table(feedback::TABLE)
                    .eq("user_id", user_id)
                    .order_desc("created_at"),
            )
            .await
    }

    /// Submit feedback.
    pub async fn create(&self, new: &NewFeedback) -> AppResult<Feedback> {
        self.client.insert(feedback::TABLE, new).await
    }

    /// Change the review state.
    pub async fn update_status(&self, id: Uuid, status: FeedbackStatus) -> AppResult<Feedback> {
        let rows: Vec<Feedback> = self
            .client
            .update(
                &Query::table(feedback::TABLE).eq("id", id),
                &json!({ "status": status }),
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Feedback not found".to_string()))
    }
}
