//! Security headers and same-origin checks.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::app::AppState;

/// Middleware that adds security headers to all responses.
///
/// `Strict-Transport-Security` is only sent outside development, matching
/// the `Secure` flag on the session cookie.
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("same-origin"),
    );

    if !state.config.security.environment.is_development() {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }

    response
}

/// Rejects cross-site state-changing requests in production.
///
/// For POST/PUT/PATCH/DELETE, an `Origin` or `Referer` header that is
/// present must name the same host as the `Host` header. Requests without
/// either header (non-browser clients) pass.
pub async fn same_origin_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let unsafe_method = matches!(
        *req.method(),
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    );
    if unsafe_method
        && !state.config.security.environment.is_development()
        && !is_same_origin(req.headers())
    {
        warn!(
            origin = ?req.headers().get(header::ORIGIN),
            host = ?req.headers().get(header::HOST),
            "Cross-origin request rejected"
        );
        return (StatusCode::FORBIDDEN, "Cross-origin request rejected").into_response();
    }

    next.run(req).await
}

/// Host part (`host[:port]`) of an absolute http(s) URL.
fn authority(url: &str) -> Option<&str> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    Some(&rest[..end])
}

fn is_same_origin(headers: &HeaderMap) -> bool {
    let host = headers.get(header::HOST).and_then(|h| h.to_str().ok());
    let matches_host = |name: header::HeaderName| match headers.get(name) {
        None => true,
        Some(value) => match (value.to_str().ok().and_then(authority), host) {
            (Some(authority), Some(host)) => authority.eq_ignore_ascii_case(host),
            _ => false,
        },
    };
    matches_host(header::ORIGIN) && matches_host(header::REFERER)
}
