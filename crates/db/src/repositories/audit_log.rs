//! Audit log repository.

use broto_common::AppResult;

use crate::client::BackendClient;
use crate::entities::AuditLog;
use crate::entities::audit_log::{self, NewAuditLog};

/// Append-only audit trail.
#[derive(Clone)]
pub struct AuditLogRepository {
    client: BackendClient,
}

impl AuditLogRepository {
    /// Create a new audit log repository.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Append an entry.
    pub async fn create(&self, new: &NewAuditLog) -> AppResult<AuditLog> {
        self.client.insert(audit_log::TABLE, new).await
    }
}
