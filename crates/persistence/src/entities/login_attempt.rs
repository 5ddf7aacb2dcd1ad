//! Login attempt aggregate (database row mapping).

use sqlx::FromRow;

/// Attempts recorded for one IP hash inside a time window.
#[derive(Debug, Clone, Copy, Default, FromRow)]
pub struct AttemptWindowEntity {
    pub attempts: i64,
    /// Oldest marker in the window, milliseconds since the epoch.
    pub oldest_ms: Option<i64>,
}
