//! Integration tests for login, logout, sessions and invitation links.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::{Duration, Utc};
use common::{
    authed_request, config_with, create_test_app, create_test_pool, json_request,
    login_with_code, parse_response_body, seed_invitation, test_config,
};
use serde_json::json;
use tower::ServiceExt;

fn login_from(ip: &str, code: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(json!({ "code": code }).to_string()))
        .unwrap()
}

// ============================================================================
// Code login
// ============================================================================

#[tokio::test]
async fn test_code_login_sets_session_cookie() {
    let pool = create_test_pool().await;
    let code = seed_invitation(&pool, "smith-2025", 3).await;
    let app = create_test_app(test_config(), pool);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/login",
            json!({ "code": "  SMITH-2025 " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("rsvp_session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age="));

    let body = parse_response_body(response).await;
    assert_eq!(body["invitation"]["key"], code);
    assert_eq!(body["invitation"]["max_guests"], 3);
    assert!(body["expires_at"].is_string());
}

#[tokio::test]
async fn test_development_cookie_is_lax_and_not_secure() {
    let pool = create_test_pool().await;
    let code = seed_invitation(&pool, "jones-2025", 2).await;
    let app = create_test_app(config_with(&[("security.environment", "development")]), pool);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/login",
            json!({ "code": code }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.contains("SameSite=Lax"));
    assert!(!cookie.contains("Secure"));
    assert!(response
        .headers()
        .get(header::STRICT_TRANSPORT_SECURITY)
        .is_none());
}

#[tokio::test]
async fn test_unknown_code_is_invalid_credential() {
    let pool = create_test_pool().await;
    let app = create_test_app(test_config(), pool);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/login",
            json!({ "code": "nobody-here" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "invalid_credential");
}

#[tokio::test]
async fn test_missing_code_is_validation_error() {
    let pool = create_test_pool().await;
    let app = create_test_app(test_config(), pool);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/login",
            json!({ "email": "someone@example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_code_login_rate_limited_per_ip() {
    let pool = create_test_pool().await;
    let code = seed_invitation(&pool, "brown-2025", 2).await;
    let app = create_test_app(test_config(), pool);

    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(login_from("203.0.113.7", "wrong-code-1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Even the right code is refused once the window is full.
    let response = app
        .clone()
        .oneshot(login_from("203.0.113.7", &code))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response.headers()[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "rate_limited");

    // A different client is unaffected.
    let response = app
        .oneshot(login_from("198.51.100.20", &code))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Email login
// ============================================================================

#[tokio::test]
async fn test_email_login_creates_invitation_once() {
    let pool = create_test_pool().await;
    let app = create_test_app(
        config_with(&[
            ("invitations.mode", "email"),
            ("invitations.default_max_guests", "4"),
        ]),
        pool.clone(),
    );

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/v1/auth/login",
                json!({ "email": " Guest@Example.COM " }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_response_body(response).await;
        assert_eq!(body["invitation"]["key"], "guest@example.com");
        assert_eq!(body["invitation"]["max_guests"], 4);
    }

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invitations")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_email_login_rejects_malformed_address() {
    let pool = create_test_pool().await;
    let app = create_test_app(config_with(&[("invitations.mode", "email")]), pool);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/login",
            json!({ "email": "not-an-email" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Sessions and logout
// ============================================================================

#[tokio::test]
async fn test_protected_route_requires_session() {
    let pool = create_test_pool().await;
    let app = create_test_app(test_config(), pool);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/rsvp")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "session_expired");

    // Browser navigations are sent back to the login page instead.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/rsvp")
                .header(header::ACCEPT, "text/html,application/xhtml+xml")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(response.headers()[header::LOCATION], "/?error=auth_required");
}

#[tokio::test]
async fn test_tampered_cookie_is_rejected() {
    let pool = create_test_pool().await;
    let code = seed_invitation(&pool, "green-2025", 2).await;
    let app = create_test_app(test_config(), pool);

    let cookie = login_with_code(&app, &code).await;
    let tampered = format!("{}x", cookie);

    let response = app
        .oneshot(authed_request(Method::GET, "/api/v1/rsvp", &tampered))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let cleared = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_expired_session_is_purged() {
    let pool = create_test_pool().await;
    let code = seed_invitation(&pool, "white-2025", 2).await;
    let app = create_test_app(test_config(), pool.clone());

    let cookie = login_with_code(&app, &code).await;

    sqlx::query("UPDATE sessions SET expires_at = ?")
        .bind(Utc::now() - Duration::hours(1))
        .execute(&pool)
        .await
        .unwrap();

    let response = app
        .oneshot(authed_request(Method::GET, "/api/v1/rsvp", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let pool = create_test_pool().await;
    let code = seed_invitation(&pool, "black-2025", 2).await;
    let app = create_test_app(test_config(), pool.clone());

    let cookie = login_with_code(&app, &code).await;

    let response = app
        .clone()
        .oneshot(authed_request(Method::POST, "/api/v1/auth/logout", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cleared = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cleared.starts_with("rsvp_session=;"));
    assert!(cleared.contains("Max-Age=0"));

    let sessions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(sessions, 0);

    let response = app
        .oneshot(authed_request(Method::GET, "/api/v1/rsvp", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_without_cookie_still_clears() {
    let pool = create_test_pool().await;
    let app = create_test_app(test_config(), pool);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.headers().get(header::SET_COOKIE).is_some());
}

// ============================================================================
// Invitation links
// ============================================================================

#[tokio::test]
async fn test_invitation_link_logs_in_and_redirects() {
    let pool = create_test_pool().await;
    let code = seed_invitation(&pool, "miller-2025", 2).await;
    let app = create_test_app(test_config(), pool);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/{}", code))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(response.headers()[header::LOCATION], "/rsvp");

    let cookie = common::session_cookie_pair(&response).expect("cookie set");
    let response = app
        .oneshot(authed_request(Method::GET, "/api/v1/rsvp", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_invitation_link_failures_redirect_with_error() {
    let pool = create_test_pool().await;
    let app = create_test_app(test_config(), pool);

    for path in ["/unknown-code-1", "/rsvp"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_redirection());
        assert_eq!(response.headers()[header::LOCATION], "/?error=invalid_code");
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }
}

#[tokio::test]
async fn test_invitation_link_rate_limited() {
    let pool = create_test_pool().await;
    let app = create_test_app(test_config(), pool);

    let mut last = None;
    for _ in 0..6 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/guessed-code")
                    .header("x-forwarded-for", "192.0.2.55")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        last = Some(response.headers()[header::LOCATION].to_str().unwrap().to_string());
    }
    assert_eq!(last.as_deref(), Some("/?error=rate_limit"));
}
