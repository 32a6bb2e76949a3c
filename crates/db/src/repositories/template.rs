//! Admin reply template repository.

use broto_common::AppResult;
use uuid::Uuid;

use crate::client::BackendClient;
use crate::entities::AdminTemplate;
use crate::entities::admin_template::{self, NewTemplate};
use crate::query::Query;

/// Repository for canned admin replies.
#[derive(Clone)]
pub struct TemplateRepository {
    client: BackendClient,
}

impl TemplateRepository {
    /// Create a new template repository.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Every template, alphabetical.
    pub async fn find_all(&self) -> AppResult<Vec<AdminTemplate>> {
        self.client
            .select(&Query::table(admin_template::TABLE).order_asc("title"))
            .await
    }

    /// Save a template.
    pub async fn create(&self, new: &NewTemplate) -> AppResult<AdminTemplate> {
        self.client.insert(admin_template::TABLE, new).await
    }

    /// Delete a template.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.client
            .delete(&Query::table(admin_template::TABLE).eq("id", id))
            .await
    }
}
