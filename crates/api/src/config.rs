use domain::models::guest::DEFAULT_MEAL_OPTIONS;
use domain::models::invitation::{InvitationMode, DEFAULT_MAX_GUESTS};
use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    #[serde(default)]
    pub invitations: InvitationsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Base URL printed in shareable invitation links.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl DatabaseConfig {
    /// Pool settings for the persistence layer.
    pub fn pool_config(&self) -> persistence::db::DatabaseConfig {
        persistence::db::DatabaseConfig {
            url: self.url.clone(),
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            connect_timeout_secs: self.connect_timeout_secs,
            idle_timeout_secs: self.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Deployment environment. Anything but development gets strict cookies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[serde(alias = "dev")]
    Development,
    #[default]
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Longest accepted session lifetime.
pub const MAX_SESSION_TTL_DAYS: i64 = 3650;

/// Longest accepted rate limit window.
pub const MAX_LOGIN_ATTEMPT_WINDOW_SECS: u64 = 86_400;

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub environment: Environment,

    /// Base64 (or raw) signing key. A random key is generated when absent.
    #[serde(default)]
    pub secret_key: Option<String>,

    #[serde(default = "default_session_ttl_days")]
    pub session_ttl_days: i64,

    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    #[serde(default = "default_login_attempt_limit")]
    pub login_attempt_limit: u32,

    #[serde(default = "default_login_attempt_window")]
    pub login_attempt_window_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvitationsConfig {
    #[serde(default)]
    pub mode: InvitationMode,

    /// Capacity given to invitations created on first email login.
    #[serde(default = "default_max_guests")]
    pub default_max_guests: i64,

    #[serde(default = "default_meal_options")]
    pub meal_options: Vec<String>,
}

impl Default for InvitationsConfig {
    fn default() -> Self {
        Self {
            mode: InvitationMode::default(),
            default_max_guests: default_max_guests(),
            meal_options: default_meal_options(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_max_connections() -> u32 {
    5
}
fn default_min_connections() -> u32 {
    1
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_session_ttl_days() -> i64 {
    domain::models::session::DEFAULT_SESSION_TTL_DAYS
}
fn default_cookie_name() -> String {
    "rsvp_session".to_string()
}
fn default_login_attempt_limit() -> u32 {
    5
}
fn default_login_attempt_window() -> u64 {
    60
}
fn default_max_guests() -> i64 {
    DEFAULT_MAX_GUESTS
}
fn default_meal_options() -> Vec<String> {
    DEFAULT_MEAL_OPTIONS.iter().map(|s| s.to_string()).collect()
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Embedded defaults used by `from_overrides`, mirroring config/default.toml.
const EMBEDDED_DEFAULTS: &str = r#"
    [server]
    host = "0.0.0.0"
    port = 8080
    request_timeout_secs = 30
    public_base_url = "http://localhost:8080"

    [database]
    url = ""
    max_connections = 5
    min_connections = 1
    connect_timeout_secs = 10
    idle_timeout_secs = 600

    [logging]
    level = "info"
    format = "json"

    [security]
    environment = "production"
    session_ttl_days = 30
    cookie_name = "rsvp_session"
    login_attempt_limit = 5
    login_attempt_window_secs = 60

    [invitations]
    mode = "code"
    default_max_guests = 2
"#;

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. embedded defaults
    /// 2. config/default.toml - deployment defaults (optional)
    /// 3. config/local.toml - local overrides (optional, not in git)
    /// 4. Environment variables with RSVP__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with_overrides(&[])
    }

    /// Like [`Config::load`], with `section.key` overrides (such as command
    /// line flags) applied on top of every other source before validation.
    pub fn load_with_overrides(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(
                EMBEDDED_DEFAULTS,
                config::FileFormat::Toml,
            ))
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("RSVP")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("invitations.meal_options"),
            );

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Build a configuration from embedded defaults plus key/value overrides.
    ///
    /// No files or environment variables are read and validation is skipped,
    /// which is what test harnesses want.
    pub fn from_overrides(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder().add_source(config::File::from_str(
            EMBEDDED_DEFAULTS,
            config::FileFormat::Toml,
        ));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "RSVP__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if !(1..=MAX_SESSION_TTL_DAYS).contains(&self.security.session_ttl_days) {
            return Err(ConfigValidationError::InvalidValue(format!(
                "session_ttl_days must be between 1 and {}",
                MAX_SESSION_TTL_DAYS
            )));
        }

        if !(1..=MAX_LOGIN_ATTEMPT_WINDOW_SECS).contains(&self.security.login_attempt_window_secs) {
            return Err(ConfigValidationError::InvalidValue(format!(
                "login_attempt_window_secs must be between 1 and {}",
                MAX_LOGIN_ATTEMPT_WINDOW_SECS
            )));
        }

        if self.security.login_attempt_limit == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "login_attempt_limit must be at least 1".to_string(),
            ));
        }

        if self.security.cookie_name.trim().is_empty() {
            return Err(ConfigValidationError::InvalidValue(
                "cookie_name cannot be empty".to_string(),
            ));
        }

        if self.invitations.default_max_guests < 1 {
            return Err(ConfigValidationError::InvalidValue(
                "default_max_guests must be at least 1".to_string(),
            ));
        }

        if self.invitations.meal_options.is_empty() {
            return Err(ConfigValidationError::InvalidValue(
                "meal_options cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigValidationError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|_| {
                ConfigValidationError::InvalidValue(format!(
                    "Invalid socket address {}:{}",
                    self.server.host, self.server.port
                ))
            })
    }

    /// Session lifetime, clamped to the accepted range.
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.security.session_ttl_days.clamp(1, MAX_SESSION_TTL_DAYS))
    }
}
