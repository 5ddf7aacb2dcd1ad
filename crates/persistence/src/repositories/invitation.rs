//! Invitation repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::invitation::NewInvitation;
use sqlx::SqlitePool;

use crate::entities::{InvitationEntity, InvitationWithCountEntity};
use crate::metrics::QueryTimer;

const INVITATION_COLUMNS: &str = "invitation_key, display_name, max_guests, contact_email, contact_phone, \
     approved, attendance_decision, registration_ip_hash, created_at, last_access_at";

/// Repository for invitation-related database operations.
#[derive(Clone)]
pub struct InvitationRepository {
    pool: SqlitePool,
}

impl InvitationRepository {
    /// Creates a new InvitationRepository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find invitation by its key.
    pub async fn find_by_key(&self, key: &str) -> Result<Option<InvitationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_invitation_by_key");
        let result = sqlx::query_as::<_, InvitationEntity>(&format!(
            "SELECT {} FROM invitations WHERE invitation_key = $1",
            INVITATION_COLUMNS
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Insert a new invitation. Fails on a duplicate key.
    pub async fn create(
        &self,
        invitation: &NewInvitation,
        now: DateTime<Utc>,
    ) -> Result<InvitationEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_invitation");
        let result = sqlx::query_as::<_, InvitationEntity>(&format!(
            r#"
            INSERT INTO invitations
                (invitation_key, display_name, max_guests, contact_email, contact_phone, registration_ip_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            INVITATION_COLUMNS
        ))
        .bind(invitation.key.as_str())
        .bind(&invitation.display_name)
        .bind(invitation.max_guests)
        .bind(&invitation.contact_email)
        .bind(&invitation.contact_phone)
        .bind(&invitation.registration_ip_hash)
        .bind(now)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Insert the invitation unless the key exists, then return the stored row.
    ///
    /// Concurrent first logins for the same email converge on one row.
    pub async fn create_if_absent(
        &self,
        invitation: &NewInvitation,
        now: DateTime<Utc>,
    ) -> Result<InvitationEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_invitation_if_absent");
        let inserted = sqlx::query(
            r#"
            INSERT INTO invitations
                (invitation_key, display_name, max_guests, contact_email, contact_phone, registration_ip_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (invitation_key) DO NOTHING
            "#,
        )
        .bind(invitation.key.as_str())
        .bind(&invitation.display_name)
        .bind(invitation.max_guests)
        .bind(&invitation.contact_email)
        .bind(&invitation.contact_phone)
        .bind(&invitation.registration_ip_hash)
        .bind(now)
        .execute(&self.pool)
        .await;
        timer.record();
        inserted?;

        self.find_by_key(invitation.key.as_str())
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Check if a key is taken.
    pub async fn key_exists(&self, key: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("check_invitation_key_exists");
        let result = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM invitations WHERE invitation_key = $1)",
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Record the time of the latest successful login.
    pub async fn touch_last_access(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("touch_invitation_last_access");
        let result = sqlx::query("UPDATE invitations SET last_access_at = $1 WHERE invitation_key = $2")
            .bind(now)
            .bind(key)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Store the party-level attendance decision.
    pub async fn set_attendance_decision(
        &self,
        key: &str,
        attending: Option<bool>,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("set_invitation_attendance_decision");
        let result = sqlx::query("UPDATE invitations SET attendance_decision = $1 WHERE invitation_key = $2")
            .bind(attending)
            .bind(key)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// List all invitations with their guest counts, newest first.
    pub async fn list_with_counts(&self) -> Result<Vec<InvitationWithCountEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_invitations_with_counts");
        let result = sqlx::query_as::<_, InvitationWithCountEntity>(
            r#"
            SELECT
                i.invitation_key, i.display_name, i.max_guests, i.contact_email, i.contact_phone,
                i.approved, i.attendance_decision, i.registration_ip_hash,
                i.created_at, i.last_access_at,
                (SELECT COUNT(*) FROM guests g WHERE g.invitation_key = i.invitation_key) AS guest_count
            FROM invitations i
            ORDER BY i.created_at DESC, i.invitation_key
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Generate an unused key by retrying on collision.
    pub async fn generate_unique_key<F>(&self, generator: F) -> Result<String, sqlx::Error>
    where
        F: Fn() -> String,
    {
        const MAX_ATTEMPTS: usize = 10;
        for _ in 0..MAX_ATTEMPTS {
            let key = generator();
            if !self.key_exists(&key).await? {
                return Ok(key);
            }
            tracing::debug!("Generated invitation key collided, retrying");
        }
        Err(sqlx::Error::Protocol(
            "could not generate a unique invitation key".into(),
        ))
    }
}
