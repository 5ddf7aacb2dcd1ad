//! Login and logout routes.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use domain::models::invitation::{InvitationSummary, LoginRequest, LoginResponse};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ClientIp;
use crate::middleware::metrics::record_login;
use crate::services::ServiceError;

/// Maps a login failure to its metrics label.
pub(crate) fn login_outcome_label(err: &ServiceError) -> &'static str {
    match err {
        ServiceError::InvalidCredential => "invalid",
        ServiceError::RateLimitExceeded { .. } => "rate_limited",
        _ => "error",
    }
}

/// Log in with an invitation code or email and receive the session cookie.
///
/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    client_ip: ClientIp,
    Json(request): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<LoginResponse>), ApiError> {
    request.validate()?;

    let auth = state.auth_service();
    let credential = request.credential(auth.mode()).ok_or_else(|| {
        ApiError::validation(format!("{} is required", auth.mode().as_str()))
    })?;

    let now = Utc::now();
    let outcome = auth
        .login(credential, client_ip.as_str(), now)
        .await
        .map_err(|e| {
            record_login(login_outcome_label(&e));
            ApiError::from(e)
        })?;
    record_login("success");

    let mut headers = HeaderMap::new();
    state
        .session_cookie()
        .set(&mut headers, &outcome.token, outcome.session.expires_at, now);

    Ok((
        headers,
        Json(LoginResponse {
            invitation: InvitationSummary::from(&outcome.invitation),
            expires_at: outcome.session.expires_at,
        }),
    ))
}

/// Delete the server-side session and clear the cookie.
///
/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    request_headers: HeaderMap,
) -> (StatusCode, HeaderMap) {
    let cookie = state.session_cookie();

    if let Err(e) = state.auth_service().logout(cookie.extract(&request_headers)).await {
        tracing::warn!(error = %e, "Failed to delete session on logout");
    }

    let mut headers = HeaderMap::new();
    cookie.clear(&mut headers);
    (StatusCode::NO_CONTENT, headers)
}
