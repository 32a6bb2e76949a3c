//! Conversation around a complaint: student messages, official admin
//! replies, internal notes and reply templates.

use broto_common::{AppError, AppResult};
use broto_db::entities::admin_template::NewTemplate;
use broto_db::entities::complaint_message::NewMessage;
use broto_db::entities::complaint_reply::NewReply;
use broto_db::entities::internal_note::NewNote;
use broto_db::entities::{
    AdminTemplate, Complaint, ComplaintMessage, ComplaintReply, InternalNote,
};
use broto_db::repositories::{
    ComplaintRepository, InternalNoteRepository, MessageRepository, ReplyRepository,
    TemplateRepository,
};
use tracing::info;
use uuid::Uuid;

use super::access::Viewer;
use crate::validation::{FormInput, MessageForm};

/// Conversation service for business logic.
#[derive(Clone)]
pub struct ConversationService {
    complaint_repo: ComplaintRepository,
    message_repo: MessageRepository,
    reply_repo: ReplyRepository,
    note_repo: InternalNoteRepository,
    template_repo: TemplateRepository,
}

impl ConversationService {
    /// Create a new conversation service.
    #[must_use]
    pub const fn new(
        complaint_repo: ComplaintRepository,
        message_repo: MessageRepository,
        reply_repo: ReplyRepository,
        note_repo: InternalNoteRepository,
        template_repo: TemplateRepository,
    ) -> Self {
        Self {
            complaint_repo,
            message_repo,
            reply_repo,
            note_repo,
            template_repo,
        }
    }

    async fn complaint_for(&self, viewer: &Viewer, complaint_id: Uuid) -> AppResult<Complaint> {
        self.complaint_repo
            .find_by_id(complaint_id)
            .await?
            .filter(|c| viewer.is_admin() || c.student_id == viewer.id)
            .ok_or_else(|| AppError::NotFound("Complaint not found".to_string()))
    }

    // === Messages ===

    /// Messages on a complaint, oldest first.
    pub async fn messages(
        &self,
        viewer: &Viewer,
        complaint_id: Uuid,
    ) -> AppResult<Vec<ComplaintMessage>> {
        self.complaint_for(viewer, complaint_id).await?;
        self.message_repo.find_by_complaint(complaint_id).await
    }

    /// Post a message as the student owner or as an admin.
    pub async fn send_message(
        &self,
        viewer: &Viewer,
        complaint_id: Uuid,
        form: MessageForm,
    ) -> AppResult<ComplaintMessage> {
        let form = form.validated()?;
        self.complaint_for(viewer, complaint_id).await?;

        self.message_repo
            .create(&NewMessage {
                complaint_id,
                sender_id: viewer.id,
                message: form.message,
            })
            .await
    }

    // === Replies ===

    /// Official replies, oldest first.
    pub async fn replies(
        &self,
        viewer: &Viewer,
        complaint_id: Uuid,
    ) -> AppResult<Vec<ComplaintReply>> {
        self.complaint_for(viewer, complaint_id).await?;
        self.reply_repo.find_by_complaint(complaint_id).await
    }

    /// Post an official reply. The backend notifies the student.
    pub async fn post_reply(
        &self,
        admin: &Viewer,
        complaint_id: Uuid,
        form: MessageForm,
    ) -> AppResult<ComplaintReply> {
        admin.ensure_admin()?;
        let form = form.validated()?;
        self.complaint_for(admin, complaint_id).await?;

        let reply = self
            .reply_repo
            .create(&NewReply {
                complaint_id,
                admin_id: admin.id,
                message: form.message,
            })
            .await?;
        info!(complaint_id = %complaint_id, admin_id = %admin.id, "Reply posted");

        Ok(reply)
    }

    // === Internal notes ===

    /// Admin-only notes, newest first.
    pub async fn notes(&self, admin: &Viewer, complaint_id: Uuid) -> AppResult<Vec<InternalNote>> {
        admin.ensure_admin()?;
        self.note_repo.find_by_complaint(complaint_id).await
    }

    pub async fn add_note(
        &self,
        admin: &Viewer,
        complaint_id: Uuid,
        note: &str,
    ) -> AppResult<InternalNote> {
        admin.ensure_admin()?;
        let note = non_empty_note(note)?;
        self.note_repo
            .create(&NewNote {
                complaint_id,
                admin_id: admin.id,
                note,
            })
            .await
    }

    /// Rewrite a note. Only its author may edit it.
    pub async fn edit_note(&self, admin: &Viewer, note_id: Uuid, note: &str) -> AppResult<InternalNote> {
        admin.ensure_admin()?;
        let note = non_empty_note(note)?;
        self.authored_note(admin, note_id).await?;
        self.note_repo.update(note_id, &note).await
    }

    /// Delete a note. Only its author may delete it.
    pub async fn delete_note(&self, admin: &Viewer, note_id: Uuid) -> AppResult<()> {
        admin.ensure_admin()?;
        self.authored_note(admin, note_id).await?;
        self.note_repo.delete(note_id).await
    }

    async fn authored_note(&self, admin: &Viewer, note_id: Uuid) -> AppResult<InternalNote> {
        let note = self
            .note_repo
            .find_by_id(note_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Note not found".to_string()))?;
        if note.admin_id != admin.id {
            return Err(AppError::Forbidden(
                "Only the author can change this note".to_string(),
            ));
        }
        Ok(note)
    }

    // === Templates ===

    pub async fn templates(&self, admin: &Viewer) -> AppResult<Vec<AdminTemplate>> {
        admin.ensure_admin()?;
        self.template_repo.find_all().await
    }

    pub async fn create_template(
        &self,
        admin: &Viewer,
        title: &str,
        content: &str,
    ) -> AppResult<AdminTemplate> {
        admin.ensure_admin()?;
        let (title, content) = (title.trim(), content.trim());
        if title.is_empty() || content.is_empty() {
            return Err(AppError::Validation("Please fill in all fields".to_string()));
        }

        self.template_repo
            .create(&NewTemplate {
                title: title.to_string(),
                content: content.to_string(),
                created_by: admin.id,
            })
            .await
    }

    pub async fn delete_template(&self, admin: &Viewer, id: Uuid) -> AppResult<()> {
        admin.ensure_admin()?;
        self.template_repo.delete(id).await
    }
}

fn non_empty_note(note: &str) -> AppResult<String> {
    let note = note.trim();
    if note.is_empty() {
        return Err(AppError::Validation("Note cannot be empty".to_string()));
    }
    Ok(note.to_string())
}
