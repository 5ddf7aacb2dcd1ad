use axum::{
    http::{header, Method},
    middleware,
    routing::{get, patch, post},
    Router,
};
use domain::models::guest::MealOptions;
use shared::crypto::SecretKey;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, require_session, same_origin_middleware,
    security_headers_middleware, trace_id,
};
use crate::routes::{auth, health, invite_link, rsvp};
use crate::services::{AuthService, RosterService, SessionCookie};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    /// Signing key, built once at startup.
    pub secret: SecretKey,
}

impl AppState {
    pub fn auth_service(&self) -> AuthService {
        AuthService::new(self.pool.clone(), &self.config, self.secret.clone())
    }

    pub fn roster_service(&self) -> RosterService {
        RosterService::new(
            self.pool.clone(),
            MealOptions::new(self.config.invitations.meal_options.clone()),
        )
    }

    pub fn session_cookie(&self) -> SessionCookie {
        SessionCookie::from_config(&self.config.security)
    }
}

pub fn create_app(config: Config, pool: SqlitePool, secret: SecretKey) -> Router {
    let config = Arc::new(config);

    let state = AppState {
        pool,
        config: config.clone(),
        secret,
    };

    // Cookies are the credential, so cross-origin callers never get them:
    // only the configured public origin may make credentialed requests.
    let cors = {
        let origin = config
            .server
            .public_base_url
            .trim_end_matches('/')
            .parse()
            .map(AllowOrigin::exact)
            .unwrap_or_else(|_| AllowOrigin::list(Vec::new()));
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
            ])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true)
    };

    // Routes that need a live session
    let protected_routes = Router::new()
        .route("/api/v1/rsvp", get(rsvp::get_roster).put(rsvp::submit_roster))
        .route("/api/v1/rsvp/attendance", post(rsvp::record_attendance))
        .route("/api/v1/rsvp/guests", post(rsvp::add_guest))
        .route(
            "/api/v1/rsvp/guests/:guest_id",
            patch(rsvp::update_guest).delete(rsvp::delete_guest),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/:code", get(invite_link::invitation_link));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            same_origin_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
