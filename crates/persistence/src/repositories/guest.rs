//! Guest repository for database operations.
//!
//! Every mutation is scoped by `(id, invitation_key)` so a guest can only be
//! changed through the invitation that owns it. Inserts go through a
//! conditional `INSERT ... SELECT` that re-checks capacity in the same
//! statement.

use chrono::{DateTime, Utc};
use domain::models::guest::GuestRsvp;
use sqlx::{Executor, Sqlite, SqlitePool, Transaction};

use crate::entities::GuestEntity;
use crate::metrics::QueryTimer;

const GUEST_COLUMNS: &str =
    "id, invitation_key, name, attending, meal_preference, dietary_restrictions, last_updated";

/// Repository for guest-related database operations.
#[derive(Clone)]
pub struct GuestRepository {
    pool: SqlitePool,
}

impl GuestRepository {
    /// Creates a new GuestRepository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List guests of an invitation ordered by id.
    pub async fn list_by_invitation(&self, key: &str) -> Result<Vec<GuestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_guests_by_invitation");
        let result = list_by_invitation(&self.pool, key).await;
        timer.record();
        result
    }

    /// Find a guest by id, only if owned by `key`.
    pub async fn find_owned(&self, id: i64, key: &str) -> Result<Option<GuestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_owned_guest");
        let result = sqlx::query_as::<_, GuestEntity>(&format!(
            "SELECT {} FROM guests WHERE id = $1 AND invitation_key = $2",
            GUEST_COLUMNS
        ))
        .bind(id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count guests of an invitation.
    pub async fn count_by_invitation(&self, key: &str) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_guests_by_invitation");
        let result =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM guests WHERE invitation_key = $1")
                .bind(key)
                .fetch_one(&self.pool)
                .await;
        timer.record();
        result
    }

    /// Insert a guest if the invitation still has room.
    ///
    /// Returns `None` when the invitation is full or does not exist.
    pub async fn insert_within_capacity(
        &self,
        key: &str,
        name: &str,
        rsvp: Option<&GuestRsvp>,
        now: DateTime<Utc>,
    ) -> Result<Option<GuestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("insert_guest_within_capacity");
        let result = insert_within_capacity(&self.pool, key, name, rsvp, now).await;
        timer.record();
        result
    }

    /// Update the RSVP fields of a guest owned by `key`. Returns rows affected.
    pub async fn update_rsvp(
        &self,
        id: i64,
        key: &str,
        rsvp: &GuestRsvp,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("update_guest_rsvp");
        let result = update_rsvp(&self.pool, id, key, rsvp, now).await;
        timer.record();
        result
    }

    /// Rename a guest owned by `key`. Returns rows affected.
    pub async fn update_name(
        &self,
        id: i64,
        key: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("update_guest_name");
        let result = update_name(&self.pool, id, key, name, now).await;
        timer.record();
        result
    }

    /// Delete a guest owned by `key`. Returns rows affected.
    pub async fn delete(&self, id: i64, key: &str) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_guest");
        let result = delete(&self.pool, id, key).await;
        timer.record();
        result
    }

    /// Start a transaction for rewriting one invitation's roster.
    ///
    /// The first statement is a no-op write on the invitation row, so the
    /// database write lock is held before anything is read. Concurrent
    /// saves wait on the busy timeout instead of failing to upgrade a
    /// read snapshot.
    pub async fn begin_roster(&self, key: &str) -> Result<RosterTransaction, sqlx::Error> {
        let timer = QueryTimer::new("begin_roster_transaction");
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "UPDATE invitations SET max_guests = max_guests WHERE invitation_key = $1",
        )
        .bind(key)
        .execute(&mut *tx)
        .await;
        timer.record();
        result?;

        Ok(RosterTransaction {
            tx,
            key: key.to_string(),
        })
    }
}

/// Roster changes for one invitation applied atomically.
///
/// Dropping it without calling [`RosterTransaction::commit`] rolls back.
pub struct RosterTransaction {
    tx: Transaction<'static, Sqlite>,
    key: String,
}

impl RosterTransaction {
    pub async fn list_guests(&mut self) -> Result<Vec<GuestEntity>, sqlx::Error> {
        list_by_invitation(&mut *self.tx, &self.key).await
    }

    pub async fn max_guests(&mut self) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT max_guests FROM invitations WHERE invitation_key = $1",
        )
        .bind(&self.key)
        .fetch_optional(&mut *self.tx)
        .await
    }

    pub async fn delete_guest(&mut self, id: i64) -> Result<u64, sqlx::Error> {
        delete(&mut *self.tx, id, &self.key).await
    }

    pub async fn update_name(
        &mut self,
        id: i64,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        update_name(&mut *self.tx, id, &self.key, name, now).await
    }

    pub async fn update_rsvp(
        &mut self,
        id: i64,
        rsvp: &GuestRsvp,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        update_rsvp(&mut *self.tx, id, &self.key, rsvp, now).await
    }

    pub async fn insert_within_capacity(
        &mut self,
        name: &str,
        rsvp: &GuestRsvp,
        now: DateTime<Utc>,
    ) -> Result<Option<GuestEntity>, sqlx::Error> {
        insert_within_capacity(&mut *self.tx, &self.key, name, Some(rsvp), now).await
    }

    pub async fn set_attendance_decision(&mut self, attending: bool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE invitations SET attendance_decision = $1 WHERE invitation_key = $2",
        )
        .bind(attending)
        .bind(&self.key)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn commit(self) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("commit_roster_transaction");
        let result = self.tx.commit().await;
        timer.record();
        result
    }
}

async fn list_by_invitation<'e, E>(executor: E, key: &str) -> Result<Vec<GuestEntity>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, GuestEntity>(&format!(
        "SELECT {} FROM guests WHERE invitation_key = $1 ORDER BY id",
        GUEST_COLUMNS
    ))
    .bind(key)
    .fetch_all(executor)
    .await
}

async fn insert_within_capacity<'e, E>(
    executor: E,
    key: &str,
    name: &str,
    rsvp: Option<&GuestRsvp>,
    now: DateTime<Utc>,
) -> Result<Option<GuestEntity>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, GuestEntity>(&format!(
        r#"
        INSERT INTO guests
            (invitation_key, name, attending, meal_preference, dietary_restrictions, last_updated)
        SELECT $1, $2, $3, $4, $5, $6
        WHERE (SELECT COUNT(*) FROM guests WHERE invitation_key = $1)
            < (SELECT max_guests FROM invitations WHERE invitation_key = $1)
        RETURNING {}
        "#,
        GUEST_COLUMNS
    ))
    .bind(key)
    .bind(name)
    .bind(rsvp.and_then(|r| r.attending.as_option()))
    .bind(rsvp.and_then(|r| r.meal_preference.as_deref()))
    .bind(rsvp.and_then(|r| r.dietary_restrictions.as_deref()))
    .bind(now)
    .fetch_optional(executor)
    .await
}

async fn update_rsvp<'e, E>(
    executor: E,
    id: i64,
    key: &str,
    rsvp: &GuestRsvp,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE guests
        SET attending = $1, meal_preference = $2, dietary_restrictions = $3, last_updated = $4
        WHERE id = $5 AND invitation_key = $6
        "#,
    )
    .bind(rsvp.attending.as_option())
    .bind(rsvp.meal_preference.as_deref())
    .bind(rsvp.dietary_restrictions.as_deref())
    .bind(now)
    .bind(id)
    .bind(key)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

async fn update_name<'e, E>(
    executor: E,
    id: i64,
    key: &str,
    name: &str,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE guests SET name = $1, last_updated = $2 WHERE id = $3 AND invitation_key = $4",
    )
    .bind(name)
    .bind(now)
    .bind(id)
    .bind(key)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

async fn delete<'e, E>(executor: E, id: i64, key: &str) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM guests WHERE id = $1 AND invitation_key = $2")
        .bind(id)
        .bind(key)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
