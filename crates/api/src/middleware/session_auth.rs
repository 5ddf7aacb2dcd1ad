//! Session authentication middleware.
//!
//! Resolves the session cookie on every request to a protected route and
//! stores the [`Session`] in request extensions for that request only.
//! Browser navigations without a valid session are redirected to the login
//! page; API calls get a 401.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use domain::models::session::Session;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::ServiceError;

/// Where unauthenticated browser navigations are sent.
pub const AUTH_REQUIRED_REDIRECT: &str = "/?error=auth_required";

/// Middleware that requires a live session.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let cookie = state.session_cookie();
    let token = cookie.extract(req.headers()).map(str::to_string);

    let result = state
        .auth_service()
        .session_from_token(token.as_deref(), Utc::now())
        .await;

    match result {
        Ok(session) => {
            tracing::debug!(
                invitation_key = %session.invitation_key,
                session_id = session.log_id(),
                "Session resolved"
            );
            req.extensions_mut().insert::<Session>(session);
            next.run(req).await
        }
        Err(ServiceError::SessionExpired) => {
            let mut response = if wants_html(req.headers()) {
                Redirect::to(AUTH_REQUIRED_REDIRECT).into_response()
            } else {
                ApiError::SessionExpired.into_response()
            };
            if token.is_some() {
                cookie.clear(response.headers_mut());
            }
            response
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// True for top-level browser navigations (HTML preferred over JSON).
fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("text/html"))
        .unwrap_or(false)
}
