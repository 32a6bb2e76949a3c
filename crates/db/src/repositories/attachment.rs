//! Complaint attachment repository.

use broto_common::AppResult;
use uuid::Uuid;

use crate::client::BackendClient;
use crate::entities::ComplaintAttachment;
use crate::entities::complaint_attachment::{self, NewAttachment};
use crate::query::Query;

/// Repository for attachment rows. Object bytes live in bucket storage.
#[derive(Clone)]
pub struct AttachmentRepository {
    client: BackendClient,
}

impl AttachmentRepository {
    /// Create a new attachment repository.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Find an attachment by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ComplaintAttachment>> {
        self.client
            .select_first(&Query::table(complaint_attachment::TABLE).eq("id", id))
            .await
    }

    /// Attachments of a complaint, oldest first.
    pub async fn find_by_complaint(&self, complaint_id: Uuid) -> AppResult<Vec<ComplaintAttachment>> {
        self.client
            .select(
                &Query::table(complaint_attachment::TABLE)
                    .eq("complaint_id", complaint_id)
                    .order_asc("created_at"),
            )
            .await
    }

    /// Record an uploaded attachment.
    pub async fn create(&self, new: &NewAttachment) -> AppResult<ComplaintAttachment> {
        self.client.insert(complaint_attachment::TABLE, new).await
    }

    /// Delete an attachment row.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.client
            .delete(&Query::table(complaint_attachment::TABLE).eq("id", id))
            .await
    }
}
