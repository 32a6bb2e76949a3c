//! Audit log entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Table name.
pub const TABLE: &str = "audit_logs";

/// Audit action for a permanently deleted complaint.
pub const ACTION_COMPLAINT_DELETED: &str = "complaint_deleted";

/// Audit action for a self-deleted account.
pub const ACTION_ACCOUNT_DELETED: &str = "account_deleted";

/// Record of a destructive action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub entity_type: String,
    #[serde(default)]
    pub entity_id: Option<Uuid>,
    #[serde(default)]
    pub details: Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert payload.
#[derive(Clone, Debug, Serialize)]
pub struct NewAuditLog {
    pub user_id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub details: Value,
}
