//! Announcement service.

use broto_common::{AppError, AppResult};
use broto_db::entities::Announcement;
use broto_db::entities::announcement::NewAnnouncement;
use broto_db::repositories::AnnouncementRepository;
use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use super::access::Viewer;

/// Input for posting an announcement.
#[derive(Debug, Clone, Default)]
pub struct CreateAnnouncementInput {
    pub title: String,
    pub message: String,
    pub attachment_url: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
}

/// Announcement service for business logic.
#[derive(Clone)]
pub struct AnnouncementService {
    announcement_repo: AnnouncementRepository,
}

impl AnnouncementService {
    /// Create a new announcement service.
    #[must_use]
    pub const fn new(announcement_repo: AnnouncementRepository) -> Self {
        Self { announcement_repo }
    }

    /// Announcements that have not expired, newest first.
    pub async fn visible(&self) -> AppResult<Vec<Announcement>> {
        self.announcement_repo.find_visible(Utc::now()).await
    }

    /// Every announcement, expired ones included.
    pub async fn all(&self, admin: &Viewer) -> AppResult<Vec<Announcement>> {
        admin.ensure_admin()?;
        self.announcement_repo.find_all().await
    }

    /// Post an announcement. Student notifications are fanned out by the
    /// backend.
    pub async fn create(
        &self,
        admin: &Viewer,
        input: CreateAnnouncementInput,
    ) -> AppResult<Announcement> {
        admin.ensure_admin()?;
        let title = input.title.trim();
        let message = input.message.trim();
        if title.is_empty() || message.is_empty() {
            return Err(AppError::Validation(
                "Please fill in all required fields".to_string(),
            ));
        }

        let announcement = self
            .announcement_repo
            .create(&NewAnnouncement {
                title: title.to_string(),
                message: message.to_string(),
                admin_id: admin.id,
                attachment_url: input.attachment_url,
                expiry_date: input.expiry_date,
            })
            .await?;
        info!(announcement_id = %announcement.id, "Announcement posted");
        Ok(announcement)
    }

    pub async fn delete(&self, admin: &Viewer, id: Uuid) -> AppResult<()> {
        admin.ensure_admin()?;
        self.announcement_repo.delete(id).await
    }
}
