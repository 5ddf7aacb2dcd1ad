//! Session entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::invitation::InvitationKey;
use domain::models::session::Session;
use sqlx::FromRow;

/// Database row mapping for the sessions table.
#[derive(Debug, Clone, FromRow)]
pub struct SessionEntity {
    pub id: String,
    pub invitation_key: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub ip_hash: Option<String>,
}

impl From<SessionEntity> for Session {
    fn from(entity: SessionEntity) -> Self {
        Self {
            id: entity.id,
            invitation_key: InvitationKey::from_stored(entity.invitation_key),
            created_at: entity.created_at,
            expires_at: entity.expires_at,
            ip_hash: entity.ip_hash,
        }
    }
}
