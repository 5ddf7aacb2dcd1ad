//! Session domain model.

use chrono::{DateTime, Duration, Utc};

use super::invitation::InvitationKey;

/// Default session lifetime.
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 30;

/// Server-side session tied to one invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub invitation_key: InvitationKey,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub ip_hash: Option<String>,
}

impl Session {
    /// Builds a session starting at `now` and lasting `ttl`.
    ///
    /// A lifetime reaching past the largest representable time saturates
    /// there.
    pub fn new(
        id: String,
        invitation_key: InvitationKey,
        now: DateTime<Utc>,
        ttl: Duration,
        ip_hash: Option<String>,
    ) -> Self {
        Self {
            id,
            invitation_key,
            created_at: now,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
            ip_hash,
        }
    }

    /// A session is dead once `now` is past `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Short id prefix that is safe to log.
    pub fn log_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }
}
