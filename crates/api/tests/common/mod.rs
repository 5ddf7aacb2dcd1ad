//! Common test utilities for integration tests.
//!
//! Every test gets its own in-memory SQLite database with the embedded
//! migrations applied, so no external services are needed.

// Not every helper is used by every test binary.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::Utc;
use fake::{faker::name::en::Name, Fake};
use persistence::db::DatabaseConfig;
use rsvp_api::{
    app::create_app,
    config::Config,
    services::{InvitationProvisioner, ProvisionRequest},
};
use serde_json::Value;
use shared::crypto::SecretKey;
use sqlx::SqlitePool;
use std::path::PathBuf;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret-key-0123456789";

/// Create a fresh in-memory database with the schema applied.
pub async fn create_test_pool() -> SqlitePool {
    persistence::db::create_in_memory_pool()
        .await
        .expect("Failed to create in-memory database")
}

/// A WAL database file shared by several connections, removed on drop.
///
/// Needed wherever requests must actually race; the in-memory pool has a
/// single connection and serializes everything.
pub struct FileDatabase {
    pub pool: SqlitePool,
    path: PathBuf,
}

impl FileDatabase {
    pub async fn new(max_connections: u32) -> Self {
        let path = std::env::temp_dir().join(format!("rsvp-test-{}.db", uuid::Uuid::new_v4()));
        let pool = persistence::db::create_pool(&DatabaseConfig {
            url: format!("sqlite://{}", path.display()),
            max_connections,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 60,
        })
        .await
        .expect("Failed to create file database");
        persistence::db::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        Self { pool, path }
    }
}

impl Drop for FileDatabase {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

/// Production-like configuration for code logins.
pub fn test_config() -> Config {
    config_with(&[])
}

/// Test configuration with extra `section.key` overrides.
pub fn config_with(overrides: &[(&str, &str)]) -> Config {
    let mut all = vec![
        ("database.url", "sqlite::memory:"),
        ("logging.level", "debug"),
        ("logging.format", "pretty"),
        ("server.public_base_url", "http://rsvp.test"),
    ];
    all.extend_from_slice(overrides);
    Config::from_overrides(&all).expect("Failed to build test config")
}

pub fn create_test_app(config: Config, pool: SqlitePool) -> Router {
    create_app(config, pool, SecretKey::from_encoded(TEST_SECRET))
}

/// Provision an invitation and return its code.
pub async fn seed_invitation(pool: &SqlitePool, code: &str, max_guests: i64) -> String {
    let family: String = Name().fake();
    InvitationProvisioner::new(pool.clone(), "http://rsvp.test")
        .add(
            ProvisionRequest {
                display_name: family,
                max_guests,
                code: Some(code.to_string()),
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .expect("Failed to seed invitation")
        .key
        .to_string()
}

pub fn fake_guest_name() -> String {
    Name().fake()
}

/// JSON request without a session cookie.
pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// JSON request carrying the session cookie.
pub fn authed_json_request(method: Method, uri: &str, cookie: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, cookie)
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Body-less request carrying the session cookie.
pub fn authed_request(method: Method, uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

pub async fn parse_response_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}

/// The `name=value` pair of the first `Set-Cookie` header, if any.
pub fn session_cookie_pair(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|pair| pair.trim().to_string())
}

/// Log in with a code and return the `Cookie` header value.
pub async fn login_with_code(app: &Router, code: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/login",
            serde_json::json!({ "code": code }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK, "login for {code} failed");
    session_cookie_pair(&response).expect("login response sets a cookie")
}

/// Add a guest through the API and return its id.
pub async fn add_guest(app: &Router, cookie: &str, name: &str) -> i64 {
    let response = app
        .clone()
        .oneshot(authed_json_request(
            Method::POST,
            "/api/v1/rsvp/guests",
            cookie,
            serde_json::json!({ "name": name }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    parse_response_body(response).await["id"]
        .as_i64()
        .expect("guest id")
}
