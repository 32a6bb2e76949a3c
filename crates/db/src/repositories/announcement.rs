//! Announcement repository.

use broto_common::AppResult;
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::client::BackendClient;
use crate::entities::Announcement;
use crate::entities::announcement::{self, NewAnnouncement};
use crate::query::Query;

/// Repository for announcement operations.
#[derive(Clone)]
pub struct AnnouncementRepository {
    client: BackendClient,
}

impl AnnouncementRepository {
    /// Create a new announcement repository.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Announcements that have not expired at `now`, newest first.
    pub async fn find_visible(&self, now: DateTime<Utc>) -> AppResult<Vec<Announcement>> {
        let now = now.to_rfc3339_opts(SecondsFormat::Secs, true);
        self.client
            .select(
                &Query::table(announcement::TABLE)
                    .or([
                        "expiry_date.is.null".to_string(),
                        format!("expiry_date.gt.{now}"),
                    ])
                    .order_desc("created_at"),
            )
            .await
    }

    /// Every announcement (for admin), newest first.
    pub async fn find_all(&self) -> AppResult<Vec<Announcement>> {
        self.client
            .select(&Query::table(announcement::TABLE).order_desc("created_at"))
            .await
    }

    /// Create a new announcement.
    pub async fn create(&self, new: &NewAnnouncement) -> AppResult<Announcement> {
        self.client.insert(announcement::TABLE, new).await
    }

    /// Delete an announcement.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.client
            .delete(&Query::table(announcement::TABLE).eq("id", id))
            .await
    }
}
