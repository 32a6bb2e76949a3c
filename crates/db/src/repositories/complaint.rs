//! Complaint repository.

use broto_common::{AppError, AppResult};
use uuid::Uuid;

use crate::client::BackendClient;
use crate::entities::complaint::{self, ComplaintChanges, NewComplaint};
use crate::entities::{Complaint, ComplaintStatus};
use crate::query::Query;

/// Repository for complaint operations.
#[derive(Clone)]
pub struct ComplaintRepository {
    client: BackendClient,
}

impl ComplaintRepository {
    /// Create a new complaint repository.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Find a complaint by ID, trashed or not.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Complaint>> {
        self.client
            .select_first(&Query::table(complaint::TABLE).eq("id", id))
            .await
    }

    /// Find a complaint by ID or fail with `NotFound`.
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Complaint> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Complaint not found".to_string()))
    }

    /// A student's live complaints, newest first.
    pub async fn find_by_student(&self, student_id: Uuid) -> AppResult<Vec<Complaint>> {
        self.client
            .select(
                &Query::table(complaint::TABLE)
                    .eq("student_id", student_id)
                    .is_null("deleted_at")
                    .order_desc("created_at"),
            )
            .await
    }

    /// Every live complaint, newest first, optionally filtered by status.
    pub async fn find_all(&self, status: Option<ComplaintStatus>) -> AppResult<Vec<Complaint>> {
        let mut query = Query::table(complaint::TABLE).is_null("deleted_at");
        if let Some(status) = status {
            query = query.eq("status", status);
        }
        self.client.select(&query.order_desc("created_at")).await
    }

    /// Trashed complaints, most recently deleted first. `student_id`
    /// restricts the list to one student.
    pub async fn find_deleted(&self, student_id: Option<Uuid>) -> AppResult<Vec<Complaint>> {
        let mut query = Query::table(complaint::TABLE).not_null("deleted_at");
        if let Some(student_id) = student_id {
            query = query.eq("student_id", student_id);
        }
        self.client.select(&query.order_desc("deleted_at")).await
    }

    /// Create a new complaint.
    pub async fn create(&self, new: &NewComplaint) -> AppResult<Complaint> {
        self.client.insert(complaint::TABLE, new).await
    }

    /// Apply a partial update and return the updated row.
    pub async fn update(&self, id: Uuid, changes: &ComplaintChanges) -> AppResult<Complaint> {
        let rows: Vec<Complaint> = self
            .client
            .update(&Query::table(complaint::TABLE).eq("id", id), changes)
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Complaint not found".to_string()))
    }

    /// Permanently delete a complaint. Dependent rows cascade.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.client
            .delete(&Query::table(complaint::TABLE).eq("id", id))
            .await
    }

    /// Permanently delete every complaint of a student.
    pub async fn delete_by_student(&self, student_id: Uuid) -> AppResult<()> {
        self.client
            .delete(&Query::table(complaint::TABLE).eq("student_id", student_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broto_common::Config;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn complaint_json(id: &str, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": "Library closes early",
            "description": "The library has been closing at 6pm instead of 9pm.",
            "category": "administrative",
            "priority": null,
            "status": status,
            "is_anonymous": false,
            "rating": null,
            "feedback": null,
            "student_id": "00000000-0000-4000-8000-0000000000aa",
            "assigned_admin_id": null,
            "created_at": "2024-05-01T08:00:00+00:00",
            "updated_at": "2024-05-01T08:00:00+00:00",
            "deleted_at": null,
            "deleted_by": null
        })
    }

    fn repo_for(server: &MockServer) -> ComplaintRepository {
        ComplaintRepository::new(
            BackendClient::new(&Config::for_backend(server.uri(), "anon").backend).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_find_all_filters_status_and_trash() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/complaints"))
            .and(query_param("deleted_at", "is.null"))
            .and(query_param("status", "eq.in_progress"))
            .and(query_param("order", "created_at.desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([complaint_json(
                "00000000-0000-4000-8000-000000000001",
                "in_progress"
            )])))
            .expect(1)
            .mount(&server)
            .await;

        let complaints = repo_for(&server)
            .find_all(Some(ComplaintStatus::InProgress))
            .await
            .unwrap();

        assert_eq!(complaints.len(), 1);
        assert_eq!(complaints[0].status, ComplaintStatus::InProgress);
    }

    #[tokio::test]
    async fn test_find_deleted_orders_by_deletion() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/complaints"))
            .and(query_param("deleted_at", "not.is.null"))
            .and(query_param("order", "deleted_at.desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let trashed = repo_for(&server).find_deleted(None).await.unwrap();
        assert!(trashed.is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/complaints"))
            .and(body_json(json!({"status": "resolved"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let err = repo_for(&server)
            .update(
                Uuid::nil(),
                &ComplaintChanges {
                    status: Some(ComplaintStatus::Resolved),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }
}
