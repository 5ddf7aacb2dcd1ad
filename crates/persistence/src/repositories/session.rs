//! Session repository for database operations.

use domain::models::session::Session;
use sqlx::SqlitePool;

use crate::entities::SessionEntity;
use crate::metrics::QueryTimer;

/// Repository for session-related database operations.
#[derive(Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Creates a new SessionRepository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a new session.
    pub async fn insert(&self, session: &Session) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("insert_session");
        let result = sqlx::query(
            r#"
            INSERT INTO sessions (id, invitation_key, created_at, expires_at, ip_hash)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&session.id)
        .bind(session.invitation_key.as_str())
        .bind(session.created_at)
        .bind(session.expires_at)
        .bind(&session.ip_hash)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ())
    }

    /// Find session by id, expired or not.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<SessionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_session_by_id");
        let result = sqlx::query_as::<_, SessionEntity>(
            r#"
            SELECT id, invitation_key, created_at, expires_at, ip_hash
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete a session. Returns rows affected.
    pub async fn delete(&self, id: &str) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_session");
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Count sessions belonging to an invitation.
    pub async fn count_for_invitation(&self, key: &str) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_sessions_for_invitation");
        let result =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sessions WHERE invitation_key = $1")
                .bind(key)
                .fetch_one(&self.pool)
                .await;
        timer.record();
        result
    }
}
