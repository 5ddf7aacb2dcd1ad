//! Current session extractor.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::models::invitation::InvitationKey;
use domain::models::session::Session;

use crate::error::ApiError;

/// The session resolved by `require_session` for this request.
///
/// Only usable on routes behind that middleware; anywhere else it rejects
/// with `session_expired`.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

impl CurrentSession {
    pub fn invitation_key(&self) -> &InvitationKey {
        &self.0.invitation_key
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(CurrentSession)
            .ok_or(ApiError::SessionExpired)
    }
}
