//! Shared helpers for service tests.

use broto_common::Config;
use broto_db::{AuthUser, BackendClient, Session};
use serde_json::Value;
use uuid::Uuid;
use wiremock::MockServer;

pub fn backend_for(server: &MockServer) -> BackendClient {
    BackendClient::new(&Config::for_backend(server.uri(), "anon").backend).unwrap()
}

pub async fn sign_in_as(client: &BackendClient, user_id: Uuid) {
    client
        .set_session(Some(Session {
            access_token: "token-1".to_string(),
            refresh_token: "refresh-1".to_string(),
            expires_in: 3600,
            token_type: "bearer".to_string(),
            user: AuthUser {
                id: user_id,
                email: Some("asha@example.com".to_string()),
                user_metadata: Value::Null,
            },
        }))
        .await;
}

pub fn complaint_json(id: Uuid, student_id: Uuid, status: &str) -> Value {
    serde_json::json!({
        "id": id,
        "title": "Projector broken in room 4",
        "description": "The projector in room 4 has not worked for a week.",
        "category": "infrastructure",
        "priority": null,
        "status": status,
        "is_anonymous": false,
        "rating": null,
        "feedback": null,
        "student_id": student_id,
        "assigned_admin_id": null,
        "created_at": "2024-03-01T09:00:00+00:00",
        "updated_at": "2024-03-03T09:00:00+00:00",
        "deleted_at": null,
        "deleted_by": null
    })
}
