//! Notification repository.

use broto_common::AppResult;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::client::BackendClient;
use crate::entities::Notification;
use crate::entities::notification;
use crate::query::Query;

/// Repository for notification operations.
#[derive(Clone)]
pub struct NotificationRepository {
    client: BackendClient,
}

#[derive(Deserialize)]
struct IdOnly {
    #[allow(dead_code)]
    id: Uuid,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// A user's notifications, newest first, optionally limited.
    pub async fn find_by_user(&self, user_id: Uuid, limit: Option<u64>) -> AppResult<Vec<Notification>> {
        let mut query = Query::table(notification::TABLE)
            .eq("user_id", user_id)
            .order_desc("created_at");
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        self.client.select(&query).await
    }

    /// Number of unread notifications for a user.
    pub async fn count_unread(&self, user_id: Uuid) -> AppResult<usize> {
        let rows: Vec<IdOnly> = self
            .client
            .select(
                &Query::table(notification::TABLE)
                    .select("id")
                    .eq("user_id", user_id)
                    .eq("is_read", false),
            )
            .await?;
        Ok(rows.len())
    }

    /// Mark one notification as read.
    pub async fn mark_as_read(&self, id: Uuid) -> AppResult<()> {
        let _: Vec<Notification> = self
            .client
            .update(
                &Query::table(notification::TABLE).eq("id", id),
                &json!({ "is_read": true }),
            )
            .await?;
        Ok(())
    }

    /// Mark every unread notification of a user as read.
    pub async fn mark_all_as_read(&self, user_id: Uuid) -> AppResult<()> {
        let _: Vec<Notification> = self
            .client
            .update(
                &Query::table(notification::TABLE)
                    .eq("user_id", user_id)
                    .eq("is_read", false),
                &json!({ "is_read": true }),
            )
            .await?;
        Ok(())
    }

    /// Delete every notification of a user.
    pub async fn delete_all_for_user(&self, user_id: Uuid) -> AppResult<()> {
        self.client
            .delete(&Query::table(notification::TABLE).eq("user_id", user_id))
            .await
    }
}
