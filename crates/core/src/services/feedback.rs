//! Product feedback from students.

use std::collections::HashMap;

use broto_common::{AppError, AppResult};
use broto_db::entities::feedback::NewFeedback;
use broto_db::entities::{Feedback, FeedbackCategory, FeedbackStatus, Profile};
use broto_db::repositories::{FeedbackRepository, ProfileRepository};
use serde::Serialize;
use uuid::Uuid;

use super::access::Viewer;
use super::complaint::StudentSummary;

/// Feedback together with its submitter, for the admin list.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackListing {
    pub feedback: Feedback,
    pub submitter: Option<StudentSummary>,
}

/// Feedback service for business logic.
#[derive(Clone)]
pub struct FeedbackService {
    feedback_repo: FeedbackRepository,
    profile_repo: ProfileRepository,
}

impl FeedbackService {
    /// Create a new feedback service.
    #[must_use]
    pub const fn new(feedback_repo: FeedbackRepository, profile_repo: ProfileRepository) -> Self {
        Self {
            feedback_repo,
            profile_repo,
        }
    }

    pub async fn submit(
        &self,
        viewer: &Viewer,
        title: &str,
        description: &str,
        category: Option<FeedbackCategory>,
    ) -> AppResult<Feedback> {
        let (title, description) = (title.trim(), description.trim());
        let Some(category) = category.filter(|_| !title.is_empty() && !description.is_empty())
        else {
            return Err(AppError::Validation("Please fill in all fields".to_string()));
        };

        self.feedback_repo
            .create(&NewFeedback {
                user_id: viewer.id,
                title: title.to_string(),
                description: description.to_string(),
                category,
            })
            .await
    }

    /// The viewer's own submissions.
    pub async fn mine(&self, viewer: &Viewer) -> AppResult<Vec<Feedback>> {
        self.feedback_repo.find_by_user(viewer.id).await
    }

    /// Every submission with its submitter, newest first.
    pub async fn list_all(&self, admin: &Viewer) -> AppResult<Vec<FeedbackListing>> {
        admin.ensure_admin()?;
        let feedback = self.feedback_repo.find_all().await?;

        let mut ids: Vec<Uuid> = feedback.iter().map(|f| f.user_id).collect();
        ids.sort_unstable();
        ids.dedup();
        let profiles: HashMap<Uuid, Profile> = self
            .profile_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(feedback
            .into_iter()
            .map(|feedback| FeedbackListing {
                submitter: profiles.get(&feedback.user_id).map(|p| StudentSummary {
                    name: p.name.clone(),
                    email: p.email.clone(),
                }),
                feedback,
            })
            .collect())
    }

    pub async fn update_status(
        &self,
        admin: &Viewer,
        id: Uuid,
        status: FeedbackStatus,
    ) -> AppResult<Feedback> {
        admin.ensure_admin()?;
        self.feedback_repo.update_status(id, status).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::backend_for;
    use broto_db::entities::AppRole;
    use wiremock::MockServer;

    #[tokio::test]
    async fn test_submit_requires_category() {
        let server = MockServer::start().await;
        let client = backend_for(&server);
        let service = FeedbackService::new(
            FeedbackRepository::new(client.clone()),
            ProfileRepository::new(client),
        );
        let viewer = Viewer {
            id: Uuid::new_v4(),
            email: None,
            role: AppRole::Student,
        };

        let err = service
            .submit(&viewer, "Dark mode", "Please add a dark theme", None)
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Please fill in all fields");
    }
}
