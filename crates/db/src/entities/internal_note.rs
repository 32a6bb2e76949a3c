//! Admin-only internal note entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Table name.
pub const TABLE: &str = "internal_notes";

/// A note visible only to admins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub complaint_id: Uuid,
    pub admin_id: Uuid,
    pub note: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert payload.
#[derive(Clone, Debug, Serialize)]
pub struct NewNote {
    pub complaint_id: Uuid,
    pub admin_id: Uuid,
    pub note: String,
}
