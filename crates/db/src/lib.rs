//! Data access layer for Broto Complain Track.
//!
//! Rows, files, users and change events all live in a hosted
//! backend-as-a-service; this crate is the typed client for it:
//!
//! - **Rows**: [`BackendClient`] with the PostgREST [`Query`] builder, plus
//!   one repository per table group
//! - **Files**: [`BucketStorage`] for complaint attachments
//! - **Users**: [`AuthClient`] for sign-up, sign-in and sessions
//! - **Changes**: [`RealtimeClient`] for INSERT notifications

pub mod auth;
pub mod client;
pub mod entities;
pub mod query;
pub mod realtime;
pub mod repositories;
pub mod storage;

pub use auth::{AuthClient, AuthUser, Session};
pub use client::BackendClient;
pub use query::Query;
pub use realtime::{ChangeEvent, RealtimeClient, RealtimeHandle};
pub use storage::BucketStorage;

use broto_common::{AppResult, Config};
use tracing::info;

/// Initialize the backend client.
pub fn init(config: &Config) -> AppResult<BackendClient> {
    let client = BackendClient::new(&config.backend)?;
    info!(url = %client.base_url(), "Backend client ready");
    Ok(client)
}
