//! Login attempt repository for rate limiting.
//!
//! Times are stored as integer milliseconds so window queries compare numbers.

use sqlx::SqlitePool;

use crate::entities::AttemptWindowEntity;
use crate::metrics::QueryTimer;

/// Repository for login attempt markers.
#[derive(Clone)]
pub struct LoginAttemptRepository {
    pool: SqlitePool,
}

impl LoginAttemptRepository {
    /// Creates a new LoginAttemptRepository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Count attempts for `ip_hash` at or after `since_ms`.
    pub async fn window(
        &self,
        ip_hash: &str,
        since_ms: i64,
    ) -> Result<AttemptWindowEntity, sqlx::Error> {
        let timer = QueryTimer::new("login_attempt_window");
        let result = sqlx::query_as::<_, AttemptWindowEntity>(
            r#"
            SELECT COUNT(*) AS attempts, MIN(attempted_at_ms) AS oldest_ms
            FROM login_attempts
            WHERE ip_hash = $1 AND attempted_at_ms >= $2
            "#,
        )
        .bind(ip_hash)
        .bind(since_ms)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Record an attempt only while fewer than `limit` attempts for
    /// `ip_hash` fall at or after `since_ms`.
    ///
    /// Count and insert are one statement, so a burst of concurrent
    /// attempts cannot overshoot the limit. Returns whether it was recorded.
    pub async fn record_within_limit(
        &self,
        ip_hash: &str,
        at_ms: i64,
        since_ms: i64,
        limit: i64,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("record_login_attempt");
        let result = sqlx::query(
            r#"
            INSERT INTO login_attempts (ip_hash, attempted_at_ms)
            SELECT $1, $2
            WHERE (
                SELECT COUNT(*) FROM login_attempts
                WHERE ip_hash = $1 AND attempted_at_ms >= $3
            ) < $4
            "#,
        )
        .bind(ip_hash)
        .bind(at_ms)
        .bind(since_ms)
        .bind(limit)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected() == 1)
    }

    /// Remove markers older than `cutoff_ms` for every IP. Returns rows affected.
    pub async fn purge_before(&self, cutoff_ms: i64) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("purge_login_attempts");
        let result = sqlx::query("DELETE FROM login_attempts WHERE attempted_at_ms < $1")
            .bind(cutoff_ms)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}
