//! Canned admin reply entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Table name.
pub const TABLE: &str = "admin_templates";

/// A reusable reply text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub created_by: Uuid,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert payload.
#[derive(Clone, Debug, Serialize)]
pub struct NewTemplate {
    pub title: String,
    pub content: String,
    pub created_by: Uuid,
}
