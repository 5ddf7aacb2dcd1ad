//! Direct invitation links (`/{code}`).
//!
//! A valid link logs the visitor in and lands them on the RSVP page.
//! Failures never render an error page; they redirect to the login page
//! with an `error` query parameter.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Redirect,
};
use chrono::Utc;
use domain::models::invitation::{InvitationKey, InvitationMode};

use crate::app::AppState;
use crate::extractors::ClientIp;
use crate::middleware::metrics::record_login;
use crate::routes::auth::login_outcome_label;
use crate::services::ServiceError;

/// Landing page for a successful link login.
pub const RSVP_PAGE: &str = "/rsvp";

pub const INVALID_CODE_REDIRECT: &str = "/?error=invalid_code";
pub const RATE_LIMIT_REDIRECT: &str = "/?error=rate_limit";
pub const SYSTEM_ERROR_REDIRECT: &str = "/?error=system";

/// GET /:code
pub async fn invitation_link(
    State(state): State<AppState>,
    Path(code): Path<String>,
    client_ip: ClientIp,
) -> (HeaderMap, Redirect) {
    let mut headers = HeaderMap::new();

    // Paths that cannot be a code are not login attempts.
    if state.config.invitations.mode != InvitationMode::Code
        || InvitationKey::from_code(&code).is_err()
    {
        return (headers, Redirect::to(INVALID_CODE_REDIRECT));
    }

    let now = Utc::now();
    match state.auth_service().login(&code, client_ip.as_str(), now).await {
        Ok(outcome) => {
            record_login("success");
            state
                .session_cookie()
                .set(&mut headers, &outcome.token, outcome.session.expires_at, now);
            (headers, Redirect::to(RSVP_PAGE))
        }
        Err(e) => {
            record_login(login_outcome_label(&e));
            let target = match e {
                ServiceError::InvalidCredential => INVALID_CODE_REDIRECT,
                ServiceError::RateLimitExceeded { .. } => RATE_LIMIT_REDIRECT,
                other => {
                    tracing::error!(error = %other, "Invitation link login failed");
                    SYSTEM_ERROR_REDIRECT
                }
            };
            (headers, Redirect::to(target))
        }
    }
}
