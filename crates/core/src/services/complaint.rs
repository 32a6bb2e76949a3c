//! Complaint service: submission, editing, triage, rating and the trash.

use std::collections::HashMap;

use broto_common::{AppError, AppResult, FileUpload, attachment_key};
use broto_db::entities::audit_log::{ACTION_COMPLAINT_DELETED, NewAuditLog};
use broto_db::entities::complaint::{ComplaintChanges, NewComplaint};
use broto_db::entities::complaint_attachment::NewAttachment;
use broto_db::entities::{
    Complaint, ComplaintAttachment, ComplaintCategory, ComplaintMessage, ComplaintPriority,
    ComplaintReply, ComplaintStatus, Profile,
};
use broto_db::repositories::{
    AttachmentRepository, AuditLogRepository, ComplaintRepository, MessageRepository,
    ProfileRepository, ReplyRepository,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use super::StorageService;
use super::access::Viewer;
use super::timeline::{TimelineStep, build_timeline};
use crate::validation::{ComplaintForm, FormInput, RatingForm, validate_files};

/// Name and email shown next to a complaint on admin pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentSummary {
    pub name: String,
    pub email: String,
}

impl StudentSummary {
    fn from_profile(profile: Option<&Profile>, fallback: &str) -> Self {
        profile.map_or_else(
            || Self {
                name: fallback.to_string(),
                email: String::new(),
            },
            |p| Self {
                name: p.name.clone(),
                email: p.email.clone(),
            },
        )
    }
}

/// A complaint as listed on admin pages. `student` is `None` for anonymous
/// complaints.
#[derive(Debug, Clone, Serialize)]
pub struct ComplaintListing {
    pub complaint: Complaint,
    pub student: Option<StudentSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttachmentLink {
    pub attachment: ComplaintAttachment,
    /// Time-limited download link; `None` when signing failed.
    pub download_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplyView {
    pub reply: ComplaintReply,
    pub admin_name: String,
}

/// Everything the detail page renders for one complaint.
#[derive(Debug, Clone, Serialize)]
pub struct ComplaintDetail {
    pub complaint: Complaint,
    pub student: Option<StudentSummary>,
    pub attachments: Vec<AttachmentLink>,
    pub replies: Vec<ReplyView>,
    pub messages: Vec<ComplaintMessage>,
    pub timeline: Vec<TimelineStep>,
}

/// Complaint service for business logic.
#[derive(Clone)]
pub struct ComplaintService {
    complaint_repo: ComplaintRepository,
    attachment_repo: AttachmentRepository,
    reply_repo: ReplyRepository,
    message_repo: MessageRepository,
    profile_repo: ProfileRepository,
    audit_repo: AuditLogRepository,
    storage: StorageService,
}

impl ComplaintService {
    /// Create a new complaint service.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        complaint_repo: ComplaintRepository,
        attachment_repo: AttachmentRepository,
        reply_repo: ReplyRepository,
        message_repo: MessageRepository,
        profile_repo: ProfileRepository,
        audit_repo: AuditLogRepository,
        storage: StorageService,
    ) -> Self {
        Self {
            complaint_repo,
            attachment_repo,
            reply_repo,
            message_repo,
            profile_repo,
            audit_repo,
            storage,
        }
    }

    /// File a new complaint and upload its attachments.
    ///
    /// The row is inserted first; each file is then uploaded and recorded in
    /// turn. A failed upload leaves the complaint and earlier files in place.
    pub async fn submit(
        &self,
        student: &Viewer,
        form: ComplaintForm,
        files: Vec<FileUpload>,
    ) -> AppResult<Complaint> {
        let form = form.validated()?;
        validate_files(&files)?;

        let complaint = self
            .complaint_repo
            .create(&NewComplaint {
                title: form.title,
                description: form.description,
                category: form.category,
                priority: Some(form.priority),
                is_anonymous: form.is_anonymous,
                student_id: student.id,
                status: ComplaintStatus::Pending,
            })
            .await?;
        info!(complaint_id = %complaint.id, student_id = %student.id, "Complaint submitted");

        self.attach_files(complaint.id, files).await?;
        Ok(complaint)
    }

    /// Edit a complaint. Only the owner may edit, and only while pending.
    pub async fn edit(
        &self,
        student: &Viewer,
        id: Uuid,
        form: ComplaintForm,
        new_files: Vec<FileUpload>,
    ) -> AppResult<Complaint> {
        let current = self.owned_pending(student, id).await?;
        let form = form.validated()?;
        validate_files(&new_files)?;

        let updated = self
            .complaint_repo
            .update(
                current.id,
                &ComplaintChanges {
                    title: Some(form.title),
                    description: Some(form.description),
                    category: Some(form.category),
                    priority: Some(Some(form.priority)),
                    is_anonymous: Some(form.is_anonymous),
                    ..Default::default()
                },
            )
            .await?;

        self.attach_files(updated.id, new_files).await?;
        Ok(updated)
    }

    /// Remove one attachment from a pending complaint: the stored object
    /// first, then its row.
    pub async fn remove_attachment(&self, student: &Viewer, attachment_id: Uuid) -> AppResult<()> {
        let attachment = self
            .attachment_repo
            .find_by_id(attachment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Attachment not found".to_string()))?;
        self.owned_pending(student, attachment.complaint_id).await?;

        self.storage.remove(&[attachment.file_url.clone()]).await?;
        self.attachment_repo.delete(attachment.id).await
    }

    async fn owned_pending(&self, student: &Viewer, id: Uuid) -> AppResult<Complaint> {
        let complaint = self
            .complaint_repo
            .find_by_id(id)
            .await?
            .filter(|c| c.student_id == student.id)
            .ok_or_else(|| AppError::NotFound("Complaint not found or unauthorized".to_string()))?;

        if complaint.status != ComplaintStatus::Pending {
            return Err(AppError::Conflict(
                "Cannot edit complaint after it's been reviewed".to_string(),
            ));
        }
        Ok(complaint)
    }

    async fn attach_files(&self, complaint_id: Uuid, files: Vec<FileUpload>) -> AppResult<()> {
        for file in files {
            let key = attachment_key(complaint_id, &file, Utc::now());
            self.storage
                .upload(&key, file.data.clone(), &file.content_type)
                .await?;
            self.attachment_repo
                .create(&NewAttachment {
                    complaint_id,
                    file_name: file.name,
                    file_url: key,
                })
                .await?;
        }
        Ok(())
    }

    /// The student's own live complaints, newest first.
    pub async fn list_for_student(&self, student: &Viewer) -> AppResult<Vec<Complaint>> {
        self.complaint_repo.find_by_student(student.id).await
    }

    /// Every live complaint for the admin dashboard, newest first.
    pub async fn list_all(
        &self,
        admin: &Viewer,
        status: Option<ComplaintStatus>,
    ) -> AppResult<Vec<ComplaintListing>> {
        admin.ensure_admin()?;
        let complaints = self.complaint_repo.find_all(status).await?;
        self.with_students(complaints).await
    }

    async fn with_students(&self, complaints: Vec<Complaint>) -> AppResult<Vec<ComplaintListing>> {
        let mut ids: Vec<Uuid> = complaints.iter().map(|c| c.student_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let profiles: HashMap<Uuid, Profile> = self
            .profile_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(complaints
            .into_iter()
            .map(|complaint| {
                let student = (!complaint.is_anonymous).then(|| {
                    StudentSummary::from_profile(profiles.get(&complaint.student_id), "Unknown")
                });
                ComplaintListing { complaint, student }
            })
            .collect())
    }

    /// Load the detail page. Students only see their own complaints.
    pub async fn detail(&self, viewer: &Viewer, id: Uuid) -> AppResult<ComplaintDetail> {
        let complaint = self
            .complaint_repo
            .find_by_id(id)
            .await?
            .filter(|c| viewer.is_admin() || c.student_id == viewer.id)
            .ok_or_else(|| AppError::NotFound("Complaint not found".to_string()))?;

        let attachments = self.attachment_repo.find_by_complaint(id).await?;
        let replies = self.reply_repo.find_by_complaint(id).await?;
        let messages = self.message_repo.find_by_complaint(id).await?;

        let mut profile_ids: Vec<Uuid> = replies.iter().map(|r| r.admin_id).collect();
        profile_ids.push(complaint.student_id);
        profile_ids.sort_unstable();
        profile_ids.dedup();
        let profiles: HashMap<Uuid, Profile> = self
            .profile_repo
            .find_by_ids(&profile_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut links = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            let download_url = match self.storage.signed_url(&attachment.file_url).await {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(error = %e, key = %attachment.file_url, "Could not sign attachment URL");
                    None
                }
            };
            links.push(AttachmentLink {
                attachment,
                download_url,
            });
        }

        let replies: Vec<ReplyView> = replies
            .into_iter()
            .map(|reply| ReplyView {
                admin_name: profiles
                    .get(&reply.admin_id)
                    .map_or_else(|| "Admin".to_string(), |p| p.name.clone()),
                reply,
            })
            .collect();

        let admin_replied = !replies.is_empty();
        let admin_viewed = admin_replied || complaint.status != ComplaintStatus::Pending;
        let timeline = build_timeline(&complaint, admin_viewed, admin_replied);

        let student = (viewer.is_admin() && !complaint.is_anonymous).then(|| {
            StudentSummary::from_profile(profiles.get(&complaint.student_id), "Unknown Student")
        });

        Ok(ComplaintDetail {
            complaint,
            student,
            attachments: links,
            replies,
            messages,
            timeline,
        })
    }

    /// Move a complaint to another status.
    pub async fn update_status(
        &self,
        admin: &Viewer,
        id: Uuid,
        status: ComplaintStatus,
    ) -> AppResult<Complaint> {
        admin.ensure_admin()?;
        let updated = self
            .complaint_repo
            .update(
                id,
                &ComplaintChanges {
                    status: Some(status),
                    ..Default::default()
                },
            )
            .await?;
        info!(complaint_id = %id, status = %status, "Complaint status updated");
        Ok(updated)
    }

    /// Change category and priority.
    pub async fn recategorize(
        &self,
        admin: &Viewer,
        id: Uuid,
        category: ComplaintCategory,
        priority: Option<ComplaintPriority>,
    ) -> AppResult<Complaint> {
        admin.ensure_admin()?;
        self.complaint_repo
            .update(
                id,
                &ComplaintChanges {
                    category: Some(category),
                    priority: Some(priority),
                    ..Default::default()
                },
            )
            .await
    }

    /// Assign a complaint to an admin, or clear the assignment.
    pub async fn assign(
        &self,
        admin: &Viewer,
        id: Uuid,
        assignee: Option<Uuid>,
    ) -> AppResult<Complaint> {
        admin.ensure_admin()?;
        self.complaint_repo
            .update(
                id,
                &ComplaintChanges {
                    assigned_admin_id: Some(assignee),
                    ..Default::default()
                },
            )
            .await
    }

    /// Rate a resolved complaint the student owns.
    pub async fn rate(&self, student: &Viewer, id: Uuid, form: RatingForm) -> AppResult<Complaint> {
        let form = form.validated()?;
        let complaint = self
            .complaint_repo
            .find_by_id(id)
            .await?
            .filter(|c| c.student_id == student.id)
            .ok_or_else(|| AppError::NotFound("Complaint not found".to_string()))?;

        if complaint.status != ComplaintStatus::Resolved {
            return Err(AppError::BadRequest(
                "Only resolved complaints can be rated".to_string(),
            ));
        }

        self.complaint_repo
            .update(
                id,
                &ComplaintChanges {
                    rating: Some(form.rating),
                    feedback: Some(form.feedback),
                    ..Default::default()
                },
            )
            .await
    }

    async fn visible_to(&self, actor: &Viewer, id: Uuid) -> AppResult<Complaint> {
        self.complaint_repo
            .find_by_id(id)
            .await?
            .filter(|c| actor.is_admin() || c.student_id == actor.id)
            .ok_or_else(|| AppError::NotFound("Complaint not found".to_string()))
    }

    /// Move a complaint to the trash.
    pub async fn soft_delete(&self, actor: &Viewer, id: Uuid) -> AppResult<Complaint> {
        self.visible_to(actor, id).await?;
        let trashed = self
            .complaint_repo
            .update(
                id,
                &ComplaintChanges {
                    deleted_at: Some(Some(Utc::now())),
                    deleted_by: Some(Some(actor.id)),
                    ..Default::default()
                },
            )
            .await?;
        info!(complaint_id = %id, actor = %actor.id, "Complaint moved to trash");
        Ok(trashed)
    }

    /// Trashed complaints: all of them for admins, the student's own
    /// otherwise.
    pub async fn trash(&self, actor: &Viewer) -> AppResult<Vec<ComplaintListing>> {
        if actor.is_admin() {
            let complaints = self.complaint_repo.find_deleted(None).await?;
            self.with_students(complaints).await
        } else {
            let complaints = self.complaint_repo.find_deleted(Some(actor.id)).await?;
            Ok(complaints
                .into_iter()
                .map(|complaint| ComplaintListing {
                    complaint,
                    student: None,
                })
                .collect())
        }
    }

    /// Bring a complaint back from the trash.
    pub async fn restore(&self, actor: &Viewer, id: Uuid) -> AppResult<Complaint> {
        self.visible_to(actor, id).await?;
        self.complaint_repo
            .update(
                id,
                &ComplaintChanges {
                    deleted_at: Some(None),
                    deleted_by: Some(None),
                    ..Default::default()
                },
            )
            .await
    }

    /// Permanently delete a trashed complaint and its stored files, then
    /// record the deletion in the audit log.
    ///
    /// Only the row delete can fail the call. File cleanup and the audit
    /// entry are logged on failure.
    pub async fn purge(&self, actor: &Viewer, id: Uuid) -> AppResult<()> {
        let complaint = self.visible_to(actor, id).await?;
        if !complaint.is_deleted() {
            return Err(AppError::BadRequest(
                "Move the complaint to trash before deleting it permanently".to_string(),
            ));
        }

        let keys: Vec<String> = match self.attachment_repo.find_by_complaint(id).await {
            Ok(attachments) => attachments.into_iter().map(|a| a.file_url).collect(),
            Err(e) => {
                warn!(error = %e, complaint_id = %id, "Failed to list attachments for cleanup");
                Vec::new()
            }
        };
        if let Err(e) = self.storage.remove(&keys).await {
            warn!(error = %e, complaint_id = %id, files = keys.len(), "Failed to remove stored files");
        }

        self.complaint_repo.delete(id).await?;
        info!(complaint_id = %id, actor = %actor.id, files = keys.len(), "Complaint purged");

        let entry = NewAuditLog {
            user_id: actor.id,
            action: ACTION_COMPLAINT_DELETED.to_string(),
            entity_type: "complaint".to_string(),
            entity_id: Some(id),
            details: json!({ "reason": "user_requested" }),
        };
        if let Err(e) = self.audit_repo.create(&entry).await {
            warn!(error = %e, complaint_id = %id, "Failed to write audit log");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{backend_for, complaint_json};
    use broto_db::entities::AppRole;
    use broto_db::{BackendClient, BucketStorage};
    use std::sync::Arc;
    use wiremock::matchers::{
        body_json, body_partial_json, method, path, path_regex, query_param,
        query_param_is_missing,
    };
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(client: &BackendClient) -> ComplaintService {
        ComplaintService::new(
            ComplaintRepository::new(client.clone()),
            AttachmentRepository::new(client.clone()),
            ReplyRepository::new(client.clone()),
            MessageRepository::new(client.clone()),
            ProfileRepository::new(client.clone()),
            AuditLogRepository::new(client.clone()),
            Arc::new(BucketStorage::new(client.clone())),
        )
    }

    fn viewer(id: Uuid, role: AppRole) -> Viewer {
        Viewer {
            id,
            email: None,
            role,
        }
    }

    fn form(title: &str) -> ComplaintForm {
        ComplaintForm {
            title: title.to_string(),
            description: "The projector in room 4 has not worked for a week.".to_string(),
            category: ComplaintCategory::Infrastructure,
            priority: ComplaintPriority::Medium,
            is_anonymous: false,
        }
    }

    #[tokio::test]
    async fn test_submit_rejects_invalid_form_before_any_request() {
        let server = MockServer::start().await;
        let student = viewer(Uuid::new_v4(), AppRole::Student);

        let err = service(&backend_for(&server))
            .submit(&student, form("Hey"), Vec::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_uploads_then_records_each_file() {
        let server = MockServer::start().await;
        let student = viewer(Uuid::new_v4(), AppRole::Student);
        let complaint_id = Uuid::new_v4();

        Mock::given(method("POST"))
            .and(path("/rest/v1/complaints"))
            .and(body_partial_json(json!({
                "status": "pending",
                "title": "Projector broken",
                "priority": "medium"
            })))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!([complaint_json(complaint_id, student.id, "pending")])),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(format!(
                r"^/storage/v1/object/complaint-attachments/{complaint_id}/\d+\.png$"
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Key": "k"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/complaint_attachments"))
            .and(body_partial_json(json!({"file_name": "photo.png"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
                "id": Uuid::new_v4(),
                "complaint_id": complaint_id,
                "file_name": "photo.png",
                "file_url": format!("{complaint_id}/1.png"),
                "created_at": "2024-03-01T09:00:00+00:00"
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let files = vec![FileUpload::new("photo.png", "image/png", vec![1, 2, 3])];
        let complaint = service(&backend_for(&server))
            .submit(&student, form("Projector broken"), files)
            .await
            .unwrap();

        assert_eq!(complaint.id, complaint_id);
    }

    #[tokio::test]
    async fn test_edit_refused_once_reviewed() {
        let server = MockServer::start().await;
        let student = viewer(Uuid::new_v4(), AppRole::Student);
        let id = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path("/rest/v1/complaints"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([complaint_json(id, student.id, "in_progress")])),
            )
            .mount(&server)
            .await;

        let err = service(&backend_for(&server))
            .edit(&student, id, form("Projector broken"), Vec::new())
            .await
            .unwrap_err();

        assert_eq!(
            err.user_message(),
            "Cannot edit complaint after it's been reviewed"
        );
    }

    #[tokio::test]
    async fn test_list_all_hides_anonymous_students() {
        let server = MockServer::start().await;
        let admin = viewer(Uuid::new_v4(), AppRole::Admin);
        let named = Uuid::new_v4();
        let hidden = Uuid::new_v4();

        let mut anonymous = complaint_json(Uuid::new_v4(), hidden, "pending");
        anonymous["is_anonymous"] = json!(true);

        Mock::given(method("GET"))
            .and(path("/rest/v1/complaints"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                complaint_json(Uuid::new_v4(), named, "pending"),
                anonymous,
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let listings = service(&backend_for(&server))
            .list_all(&admin, None)
            .await
            .unwrap();

        assert_eq!(
            listings[0].student.as_ref().map(|s| s.name.as_str()),
            Some("Unknown")
        );
        assert!(listings[1].student.is_none());
    }

    #[tokio::test]
    async fn test_students_cannot_list_all() {
        let server = MockServer::start().await;
        let student = viewer(Uuid::new_v4(), AppRole::Student);

        let err = service(&backend_for(&server))
            .list_all(&student, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_rate_requires_resolved() {
        let server = MockServer::start().await;
        let student = viewer(Uuid::new_v4(), AppRole::Student);
        let id = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path("/rest/v1/complaints"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([complaint_json(id, student.id, "pending")])),
            )
            .mount(&server)
            .await;

        let err = service(&backend_for(&server))
            .rate(
                &student,
                id,
                RatingForm {
                    rating: 4,
                    feedback: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_purge_removes_files_row_and_writes_audit() {
        let server = MockServer::start().await;
        let student = viewer(Uuid::new_v4(), AppRole::Student);
        let id = Uuid::new_v4();

        let mut trashed = complaint_json(id, student.id, "pending");
        trashed["deleted_at"] = json!("2024-03-05T09:00:00+00:00");

        Mock::given(method("GET"))
            .and(path("/rest/v1/complaints"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([trashed])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/complaint_attachments"))
            .and(query_param("complaint_id", format!("eq.{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": Uuid::new_v4(),
                "complaint_id": id,
                "file_name": "scan.pdf",
                "file_url": format!("{id}/17.pdf"),
                "created_at": "2024-03-01T09:00:00+00:00"
            }])))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/storage/v1/object/complaint-attachments"))
            .and(body_partial_json(json!({"prefixes": [format!("{id}/17.pdf")]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/complaints"))
            .and(query_param("id", format!("eq.{id}")))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/audit_logs"))
            .and(body_partial_json(json!({
                "action": "complaint_deleted",
                "entity_type": "complaint",
                "details": {"reason": "user_requested"}
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
                "id": Uuid::new_v4(),
                "user_id": student.id,
                "action": "complaint_deleted",
                "entity_type": "complaint",
                "entity_id": id,
                "details": {"reason": "user_requested"}
            }])))
            .expect(1)
            .mount(&server)
            .await;

        service(&backend_for(&server))
            .purge(&student, id)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_purge_refuses_live_complaint() {
        let server = MockServer::start().await;
        let student = viewer(Uuid::new_v4(), AppRole::Student);
        let id = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path("/rest/v1/complaints"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([complaint_json(id, student.id, "pending")])),
            )
            .mount(&server)
            .await;

        let err = service(&backend_for(&server))
            .purge(&student, id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_purge_survives_cleanup_and_audit_failures() {
        let server = MockServer::start().await;
        let student = viewer(Uuid::new_v4(), AppRole::Student);
        let id = Uuid::new_v4();

        let mut trashed = complaint_json(id, student.id, "pending");
        trashed["deleted_at"] = json!("2024-03-05T09:00:00+00:00");

        Mock::given(method("GET"))
            .and(path("/rest/v1/complaints"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([trashed])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/complaint_attachments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": Uuid::new_v4(),
                "complaint_id": id,
                "file_name": "scan.pdf",
                "file_url": format!("{id}/17.pdf"),
                "created_at": "2024-03-01T09:00:00+00:00"
            }])))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/storage/v1/object/complaint-attachments"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/complaints"))
            .and(query_param("id", format!("eq.{id}")))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/audit_logs"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
            .expect(1)
            .mount(&server)
            .await;

        let result = service(&backend_for(&server)).purge(&student, id).await;
        assert!(result.is_ok(), "purge failed after the row was deleted: {result:?}");
    }

    #[tokio::test]
    async fn test_soft_delete_records_time_and_actor() {
        let server = MockServer::start().await;
        let student = viewer(Uuid::new_v4(), AppRole::Student);
        let id = Uuid::new_v4();

        let mut trashed = complaint_json(id, student.id, "pending");
        trashed["deleted_at"] = json!("2024-03-05T09:00:00+00:00");
        trashed["deleted_by"] = json!(student.id);

        Mock::given(method("GET"))
            .and(path("/rest/v1/complaints"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([complaint_json(id, student.id, "pending")])),
            )
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/complaints"))
            .and(query_param("id", format!("eq.{id}")))
            .and(body_partial_json(json!({"deleted_by": student.id})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([trashed])))
            .expect(1)
            .mount(&server)
            .await;

        let complaint = service(&backend_for(&server))
            .soft_delete(&student, id)
            .await
            .unwrap();
        assert!(complaint.is_deleted());

        let requests = server.received_requests().await.unwrap();
        let patch = requests
            .iter()
            .find(|r| r.method.as_str() == "PATCH")
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&patch.body).unwrap();
        assert!(body["deleted_at"].is_string());
        assert!(body.get("status").is_none());
    }

    #[tokio::test]
    async fn test_soft_delete_hides_other_students_complaints() {
        let server = MockServer::start().await;
        let student = viewer(Uuid::new_v4(), AppRole::Student);
        let id = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path("/rest/v1/complaints"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([complaint_json(id, Uuid::new_v4(), "pending")])),
            )
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/complaints"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let err = service(&backend_for(&server))
            .soft_delete(&student, id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_restore_writes_explicit_nulls() {
        let server = MockServer::start().await;
        let admin = viewer(Uuid::new_v4(), AppRole::Admin);
        let id = Uuid::new_v4();

        let mut trashed = complaint_json(id, Uuid::new_v4(), "pending");
        trashed["deleted_at"] = json!("2024-03-05T09:00:00+00:00");

        Mock::given(method("GET"))
            .and(path("/rest/v1/complaints"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([trashed])))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/complaints"))
            .and(query_param("id", format!("eq.{id}")))
            .and(body_json(json!({"deleted_at": null, "deleted_by": null})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([complaint_json(id, Uuid::new_v4(), "pending")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let complaint = service(&backend_for(&server))
            .restore(&admin, id)
            .await
            .unwrap();
        assert!(!complaint.is_deleted());
    }

    #[tokio::test]
    async fn test_student_trash_only_lists_own_complaints() {
        let server = MockServer::start().await;
        let student = viewer(Uuid::new_v4(), AppRole::Student);

        let mut trashed = complaint_json(Uuid::new_v4(), student.id, "pending");
        trashed["deleted_at"] = json!("2024-03-05T09:00:00+00:00");

        Mock::given(method("GET"))
            .and(path("/rest/v1/complaints"))
            .and(query_param("deleted_at", "not.is.null"))
            .and(query_param("student_id", format!("eq.{}", student.id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([trashed])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let listings = service(&backend_for(&server)).trash(&student).await.unwrap();
        assert_eq!(listings.len(), 1);
        assert!(listings[0].student.is_none());
    }

    #[tokio::test]
    async fn test_admin_trash_lists_everyone_with_profiles() {
        let server = MockServer::start().await;
        let admin = viewer(Uuid::new_v4(), AppRole::Admin);
        let owner = Uuid::new_v4();

        let mut trashed = complaint_json(Uuid::new_v4(), owner, "resolved");
        trashed["deleted_at"] = json!("2024-03-05T09:00:00+00:00");

        Mock::given(method("GET"))
            .and(path("/rest/v1/complaints"))
            .and(query_param("deleted_at", "not.is.null"))
            .and(query_param_is_missing("student_id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([trashed])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": owner,
                "name": "Asha",
                "email": "asha@example.com",
                "created_at": "2024-01-01T09:00:00+00:00"
            }])))
            .mount(&server)
            .await;

        let listings = service(&backend_for(&server)).trash(&admin).await.unwrap();
        assert_eq!(
            listings[0].student,
            Some(StudentSummary {
                name: "Asha".to_string(),
                email: "asha@example.com".to_string(),
            })
        );
    }
}
