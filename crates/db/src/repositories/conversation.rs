//! Repositories for complaint messages, admin replies and internal notes.

use broto_common::{AppError, AppResult};
use serde_json::json;
use uuid::Uuid;

use crate::client::BackendClient;
use crate::entities::complaint_message::{self, NewMessage};
use crate::entities::complaint_reply::{self, NewReply};
use crate::entities::internal_note::{self, NewNote};
use crate::entities::{ComplaintMessage, ComplaintReply, InternalNote};
use crate::query::Query;

/// Repository for the student-visible conversation.
#[derive(Clone)]
pub struct MessageRepository {
    client: BackendClient,
}

impl MessageRepository {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Messages of a complaint, oldest first.
    pub async fn find_by_complaint(&self, complaint_id: Uuid) -> AppResult<Vec<ComplaintMessage>> {
        self.client
            .select(
                &Query::table(complaint_message::TABLE)
                    .eq("complaint_id", complaint_id)
                    .order_asc("created_at"),
            )
            .await
    }

    /// Post a message.
    pub async fn create(&self, new: &NewMessage) -> AppResult<ComplaintMessage> {
        self.client.insert(complaint_message::TABLE, new).await
    }
}

/// Repository for official admin replies.
#[derive(Clone)]
pub struct ReplyRepository {
    client: BackendClient,
}

impl ReplyRepository {
    /// Create a new reply repository.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Replies to a complaint, oldest first.
    pub async fn find_by_complaint(&self, complaint_id: Uuid) -> AppResult<Vec<ComplaintReply>> {
        self.client
            .select(
                &Query::table(complaint_reply::TABLE)
                    .eq("complaint_id", complaint_id)
                    .order_asc("created_at"),
            )
            .await
    }

    /// Post a reply.
    pub async fn create(&self, new: &NewReply) -> AppResult<ComplaintReply> {
        self.client.insert(complaint_reply::TABLE, new).await
    }
}

/// Repository for admin-only notes.
#[derive(Clone)]
pub struct InternalNoteRepository {
    client: BackendClient,
}

impl InternalNoteRepository {
    /// Create a new internal note repository.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Notes on a complaint, newest first.
    pub async fn find_by_complaint(&self, complaint_id: Uuid) -> AppResult<Vec<InternalNote>> {
        self.client
            .select(
                &Query::table(internal_note::TABLE)
                    .eq("complaint_id", complaint_id)
                    .order_desc("created_at"),
            )
            .await
    }

    /// Find a note by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<InternalNote>> {
        self.client
            .select_first(&Query::table(internal_note::TABLE).eq("id", id))
            .await
    }

    /// Add a note.
    pub async fn create(&self, new: &NewNote) -> AppResult<InternalNote> {
        self.client.insert(internal_note::TABLE, new).await
    }

    /// Replace a note's text.
    pub async fn update(&self, id: Uuid, note: &str) -> AppResult<InternalNote> {
        let rows: Vec<InternalNote> = self
            .client
            .update(
                &Query::table(internal_note::TABLE).eq("id", id),
                &json!({ "note": note, "updated_at": chrono::Utc::now() }),
            )
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Note not found".to_string()))
    }

    /// Delete a note.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.client
            .delete(&Query::table(internal_note::TABLE).eq("id", id))
            .await
    }
}
