//! Notification service.

use broto_common::AppResult;
use broto_db::entities::Notification;
use broto_db::entities::notification::{TYPE_ANNOUNCEMENT, TYPE_REPLY};
use broto_db::repositories::NotificationRepository;
use serde::Serialize;
use uuid::Uuid;

use super::access::Viewer;

/// How many notifications the bell dropdown shows.
pub const RECENT_LIMIT: u64 = 10;

/// Where a notification leads when clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "page", content = "id", rename_all = "snake_case")]
pub enum NavigationTarget {
    Complaint(Uuid),
    Announcements,
}

/// Resolve the page a notification opens, if any.
#[must_use]
pub fn navigation_target(notification: &Notification) -> Option<NavigationTarget> {
    let related = notification.related_id?;
    match notification.kind.as_str() {
        TYPE_REPLY => Some(NavigationTarget::Complaint(related)),
        TYPE_ANNOUNCEMENT => Some(NavigationTarget::Announcements),
        _ => None,
    }
}

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self { notification_repo }
    }

    /// The newest few, for the bell dropdown.
    pub async fn recent(&self, viewer: &Viewer) -> AppResult<Vec<Notification>> {
        self.notification_repo
            .find_by_user(viewer.id, Some(RECENT_LIMIT))
            .await
    }

    pub async fn all(&self, viewer: &Viewer) -> AppResult<Vec<Notification>> {
        self.notification_repo.find_by_user(viewer.id, None).await
    }

    pub async fn unread_count(&self, viewer: &Viewer) -> AppResult<usize> {
        self.notification_repo.count_unread(viewer.id).await
    }

    pub async fn mark_as_read(&self, id: Uuid) -> AppResult<()> {
        self.notification_repo.mark_as_read(id).await
    }

    pub async fn mark_all_as_read(&self, viewer: &Viewer) -> AppResult<()> {
        self.notification_repo.mark_all_as_read(viewer.id).await
    }

    pub async fn clear_all(&self, viewer: &Viewer) -> AppResult<()> {
        self.notification_repo.delete_all_for_user(viewer.id).await
    }

    /// Mark a clicked notification read and return where it leads.
    pub async fn open(&self, notification: &Notification) -> AppResult<Option<NavigationTarget>> {
        if !notification.is_read {
            self.notification_repo.mark_as_read(notification.id).await?;
        }
        Ok(navigation_target(notification))
    }
}
