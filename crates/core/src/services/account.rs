//! Account service: registration, sign-in, profile and account deletion.

use broto_common::{AppError, AppResult};
use broto_db::entities::Profile;
use broto_db::entities::audit_log::{ACTION_ACCOUNT_DELETED, NewAuditLog};
use broto_db::entities::profile::ProfileChanges;
use broto_db::repositories::{AuditLogRepository, ComplaintRepository, ProfileRepository};
use broto_db::{AuthClient, AuthUser, Session};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use super::access::{AccessService, Viewer};
use super::analytics::{ProfileStats, profile_stats};
use crate::validation::{FormInput, SignInForm, SignUpForm};

/// Minimum length of a new password set from the profile page.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Profile page contents.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileOverview {
    pub profile: Profile,
    pub stats: ProfileStats,
}

/// Profile edit form. Leave `new_password` empty to keep the password.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileInput {
    pub name: String,
    pub phone: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Account service for business logic.
#[derive(Clone)]
pub struct AccountService {
    auth: AuthClient,
    access: AccessService,
    profile_repo: ProfileRepository,
    complaint_repo: ComplaintRepository,
    audit_repo: AuditLogRepository,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub const fn new(
        auth: AuthClient,
        access: AccessService,
        profile_repo: ProfileRepository,
        complaint_repo: ComplaintRepository,
        audit_repo: AuditLogRepository,
    ) -> Self {
        Self {
            auth,
            access,
            profile_repo,
            complaint_repo,
            audit_repo,
        }
    }

    /// Register a student account. The backend creates the profile row.
    pub async fn sign_up(&self, form: SignUpForm) -> AppResult<AuthUser> {
        let form = form.validated()?;
        self.auth
            .sign_up(&form.email, &form.password, &form.name)
            .await
    }

    /// Sign in and resolve the viewer's role.
    pub async fn sign_in(&self, form: SignInForm) -> AppResult<Viewer> {
        let form = form.validated()?;
        let session = self
            .auth
            .sign_in_with_password(&form.email, &form.password)
            .await?;
        let role = self.access.role_of(session.user.id).await?;

        Ok(Viewer {
            id: session.user.id,
            email: session.user.email,
            role,
        })
    }

    pub async fn sign_out(&self) -> AppResult<()> {
        self.auth.sign_out().await
    }

    pub async fn current_session(&self) -> Option<Session> {
        self.auth.current_session().await
    }

    /// The signed-in viewer, checked against the auth service.
    pub async fn current_viewer(&self) -> AppResult<Viewer> {
        self.access.require_user().await
    }

    async fn own_profile(&self, viewer: &Viewer) -> AppResult<Profile> {
        self.profile_repo
            .find_by_id(viewer.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
    }

    /// Profile with complaint statistics.
    pub async fn profile(&self, viewer: &Viewer) -> AppResult<ProfileOverview> {
        let profile = self.own_profile(viewer).await?;
        let complaints = self.complaint_repo.find_by_student(viewer.id).await?;
        let stats = profile_stats(&complaints, profile.created_at);
        Ok(ProfileOverview { profile, stats })
    }

    /// Save name and phone, then change the password when one is given.
    pub async fn update_profile(
        &self,
        viewer: &Viewer,
        input: UpdateProfileInput,
    ) -> AppResult<Profile> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }
        let phone = input.phone.trim();

        let profile = self
            .profile_repo
            .update(
                viewer.id,
                &ProfileChanges {
                    name: Some(name.to_string()),
                    phone: Some((!phone.is_empty()).then(|| phone.to_string())),
                    ..Default::default()
                },
            )
            .await?;

        if !input.new_password.is_empty() {
            if input.new_password != input.confirm_password {
                return Err(AppError::Validation("Passwords do not match".to_string()));
            }
            if input.new_password.chars().count() < MIN_PASSWORD_LEN {
                return Err(AppError::Validation(
                    "Password must be at least 8 characters".to_string(),
                ));
            }
            self.auth.update_password(&input.new_password).await?;
        }

        Ok(profile)
    }

    /// Delete a student's account data after re-checking the password.
    ///
    /// Complaints are hard-deleted, the deletion is logged, and the session
    /// is ended. The auth user itself is removed by the backend.
    pub async fn delete_account(&self, viewer: &Viewer, password: &str) -> AppResult<()> {
        if password.trim().is_empty() {
            return Err(AppError::Validation(
                "Please enter your password to confirm deletion".to_string(),
            ));
        }
        if viewer.is_admin() {
            return Err(AppError::Forbidden(
                "Admin accounts cannot be deleted from user side".to_string(),
            ));
        }

        let email = match &viewer.email {
            Some(email) => email.clone(),
            None => self.own_profile(viewer).await?.email,
        };
        if !self.auth.verify_password(&email, password).await? {
            return Err(AppError::Unauthorized("Invalid password".to_string()));
        }

        self.complaint_repo.delete_by_student(viewer.id).await?;

        let audit = NewAuditLog {
            user_id: viewer.id,
            action: ACTION_ACCOUNT_DELETED.to_string(),
            entity_type: "user".to_string(),
            entity_id: Some(viewer.id),
            details: json!({ "reason": "user_requested" }),
        };
        if let Err(e) = self.audit_repo.create(&audit).await {
            warn!(error = %e, user_id = %viewer.id, "Failed to write account deletion audit log");
        }

        info!(user_id = %viewer.id, "Account deleted");
        self.auth.sign_out().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{backend_for, sign_in_as};
    use broto_db::BackendClient;
    use broto_db::entities::AppRole;
    use broto_db::repositories::RoleRepository;
    use uuid::Uuid;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(client: &BackendClient) -> AccountService {
        let auth = AuthClient::new(client.clone());
        AccountService::new(
            auth.clone(),
            AccessService::new(auth, RoleRepository::new(client.clone())),
            ProfileRepository::new(client.clone()),
            ComplaintRepository::new(client.clone()),
            AuditLogRepository::new(client.clone()),
        )
    }

    fn student() -> Viewer {
        Viewer {
            id: Uuid::new_v4(),
            email: Some("asha@example.com".to_string()),
            role: AppRole::Student,
        }
    }

    #[tokio::test]
    async fn test_delete_requires_password() {
        let server = MockServer::start().await;
        let err = service(&backend_for(&server))
            .delete_account(&student(), "  ")
            .await
            .unwrap_err();
        assert_eq!(
            err.user_message(),
            "Please enter your password to confirm deletion"
        );
    }

    #[tokio::test]
    async fn test_admin_cannot_delete_self() {
        let server = MockServer::start().await;
        let admin = Viewer {
            role: AppRole::Admin,
            ..student()
        };
        let err = service(&backend_for(&server))
            .delete_account(&admin, "secret123")
            .await
            .unwrap_err();
        assert_eq!(
            err.user_message(),
            "Admin accounts cannot be deleted from user side"
        );
    }

    #[tokio::test]
    async fn test_wrong_password_deletes_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let err = service(&backend_for(&server))
            .delete_account(&student(), "wrong-pass1")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Invalid password");
    }

    #[tokio::test]
    async fn test_delete_removes_complaints_logs_and_signs_out() {
        let server = MockServer::start().await;
        let viewer = student();
        let client = backend_for(&server);
        sign_in_as(&client, viewer.id).await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh",
                "refresh_token": "r",
                "expires_in": 3600,
                "token_type": "bearer",
                "user": {"id": viewer.id, "email": "asha@example.com", "user_metadata": {}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/complaints"))
            .and(query_param("student_id", format!("eq.{}", viewer.id)))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/audit_logs"))
            .and(body_partial_json(serde_json::json!({
                "action": "account_deleted",
                "entity_type": "user"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([{
                "id": Uuid::new_v4(),
                "user_id": viewer.id,
                "action": "account_deleted",
                "entity_type": "user",
                "entity_id": viewer.id,
                "details": {"reason": "user_requested"}
            }])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        service(&client)
            .delete_account(&viewer, "secret123")
            .await
            .unwrap();
        assert!(client.session().await.is_none());
    }

    #[tokio::test]
    async fn test_mismatched_passwords_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "id": Uuid::nil(),
                "name": "Asha",
                "email": "asha@example.com",
                "phone": null,
                "created_at": "2024-01-01T00:00:00+00:00"
            }])))
            .mount(&server)
            .await;

        let err = service(&backend_for(&server))
            .update_profile(
                &student(),
                UpdateProfileInput {
                    name: "Asha".to_string(),
                    new_password: "newpass12".to_string(),
                    confirm_password: "newpass13".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Passwords do not match");
    }
}
