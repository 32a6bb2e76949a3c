//! Profile and role repositories.

use broto_common::{AppError, AppResult};
use serde_json::json;
use uuid::Uuid;

use crate::client::BackendClient;
use crate::entities::profile::{self, ProfileChanges};
use crate::entities::user_role;
use crate::entities::{AppRole, Profile, UserRole};
use crate::query::Query;

/// Repository for user profiles.
#[derive(Clone)]
pub struct ProfileRepository {
    client: BackendClient,
}

impl ProfileRepository {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Find a profile by user ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Profile>> {
        self.client
            .select_first(&Query::table(profile::TABLE).eq("id", id))
            .await
    }

    /// Find several profiles in one request.
    pub async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Profile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.client
            .select(&Query::table(profile::TABLE).in_list("id", ids))
            .await
    }

    /// Update a profile.
    pub async fn update(&self, id: Uuid, changes: &ProfileChanges) -> AppResult<Profile> {
        let rows: Vec<Profile> = self
            .client
            .update(&Query::table(profile::TABLE).eq("id", id), changes)
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
    }
}

/// Repository for role grants.
#[derive(Clone)]
pub struct RoleRepository {
    client: BackendClient,
}

impl RoleRepository {
    /// Create a new role repository.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Roles granted to a user.
    pub async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<UserRole>> {
        self.client
            .select(&Query::table(user_role::TABLE).eq("user_id", user_id))
            .await
    }

    /// Ask the database whether a user holds a role.
    pub async fn has_role(&self, user_id: Uuid, role: AppRole) -> AppResult<bool> {
        self.client
            .rpc("has_role", &json!({ "_user_id": user_id, "_role": role }))
            .await
    }
}
