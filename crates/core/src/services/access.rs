//! Who is signed in, and what they may do.

use broto_common::{AppError, AppResult};
use broto_db::entities::AppRole;
use broto_db::repositories::RoleRepository;
use broto_db::AuthClient;
use uuid::Uuid;

/// The signed-in user together with their resolved role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: AppRole,
}

impl Viewer {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == AppRole::Admin
    }

    /// Fail with `Forbidden` unless this viewer is an admin.
    pub fn ensure_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }
}

/// Resolves sessions into viewers and guards admin-only pages.
#[derive(Clone)]
pub struct AccessService {
    auth: AuthClient,
    role_repo: RoleRepository,
}

impl AccessService {
    /// Create a new access service.
    #[must_use]
    pub const fn new(auth: AuthClient, role_repo: RoleRepository) -> Self {
        Self { auth, role_repo }
    }

    /// Role of a user. A user holding both roles counts as admin; no role
    /// row at all counts as student.
    pub async fn role_of(&self, user_id: Uuid) -> AppResult<AppRole> {
        let roles = self.role_repo.find_by_user(user_id).await?;
        if roles.iter().any(|r| r.role == AppRole::Admin) {
            Ok(AppRole::Admin)
        } else {
            Ok(AppRole::Student)
        }
    }

    /// Ask the backend whether `user_id` holds `role`.
    pub async fn has_role(&self, user_id: Uuid, role: AppRole) -> AppResult<bool> {
        self.role_repo.has_role(user_id, role).await
    }

    /// The signed-in viewer. Fails with `Unauthorized` without a session.
    pub async fn require_user(&self) -> AppResult<Viewer> {
        let user = self.auth.current_user().await?;
        let role = self.role_of(user.id).await?;
        Ok(Viewer {
            id: user.id,
            email: user.email,
            role,
        })
    }

    /// The signed-in viewer, who must be an admin.
    pub async fn require_admin(&self) -> AppResult<Viewer> {
        let viewer = self.require_user().await?;
        viewer.ensure_admin()?;
        Ok(viewer)
    }
}
