//! Request extractors.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use broto_db::AuthUser;

/// The authenticated caller, set by the auth middleware.
#[derive(Debug, Clone)]
pub struct Caller(pub AuthUser);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(Caller)
            .ok_or((StatusCode::UNAUTHORIZED, "Unauthorized"))
    }
}
