//! Login attempt rate limiting.
//!
//! Sliding window per hashed client IP, backed by the `login_attempts`
//! table so every process sharing the database sees the same counts.
//! Storage failures never block a login.

use chrono::{DateTime, Duration, Utc};
use persistence::repositories::LoginAttemptRepository;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::config::{SecurityConfig, MAX_LOGIN_ATTEMPT_WINDOW_SECS};
use crate::services::ServiceError;

/// Rate limiter for invitation code guesses.
#[derive(Clone)]
pub struct LoginRateLimiter {
    attempts: LoginAttemptRepository,
    limit: u32,
    window: Duration,
}

impl LoginRateLimiter {
    pub fn new(pool: SqlitePool, limit: u32, window: Duration) -> Self {
        Self {
            attempts: LoginAttemptRepository::new(pool),
            limit,
            window,
        }
    }

    pub fn from_config(pool: SqlitePool, config: &SecurityConfig) -> Self {
        let window_secs = config
            .login_attempt_window_secs
            .min(MAX_LOGIN_ATTEMPT_WINDOW_SECS);
        Self::new(
            pool,
            config.login_attempt_limit,
            Duration::seconds(window_secs as i64),
        )
    }

    /// Reject the attempt if the window is full, otherwise record it.
    ///
    /// Returns `RateLimitExceeded` with the number of seconds until the
    /// oldest attempt in the window falls out of it.
    pub async fn check_and_record(
        &self,
        ip_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        let now_ms = now.timestamp_millis();
        let window_ms = self.window.num_milliseconds();
        let since_ms = now_ms.saturating_sub(window_ms);

        match self
            .attempts
            .record_within_limit(ip_hash, now_ms, since_ms, i64::from(self.limit))
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                let oldest_ms = match self.attempts.window(ip_hash, since_ms).await {
                    Ok(window) => window.oldest_ms.unwrap_or(now_ms),
                    Err(e) => {
                        warn!(error = %e, "Failed to read login attempt window");
                        now_ms
                    }
                };
                let remaining_ms = (window_ms - (now_ms - oldest_ms)).max(0);
                let retry_after_secs = u64::try_from((remaining_ms + 999) / 1000)
                    .unwrap_or(0)
                    .max(1);
                debug!(retry_after_secs, "Login attempt rate limited");
                metrics::counter!("login_attempts_rate_limited_total").increment(1);
                return Err(ServiceError::RateLimitExceeded { retry_after_secs });
            }
            Err(e) => {
                warn!(error = %e, "Rate limit check failed, allowing attempt");
                return Ok(());
            }
        }

        match self.attempts.purge_before(since_ms).await {
            Ok(purged) if purged > 0 => debug!(purged, "Purged stale login attempts"),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Failed to purge stale login attempts"),
        }

        Ok(())
    }
}
