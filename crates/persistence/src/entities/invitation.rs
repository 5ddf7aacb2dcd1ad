//! Invitation entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::invitation::{Invitation, InvitationKey, InvitationOverview};
use sqlx::FromRow;

/// Database row mapping for the invitations table.
#[derive(Debug, Clone, FromRow)]
pub struct InvitationEntity {
    pub invitation_key: String,
    pub display_name: Option<String>,
    pub max_guests: i64,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub approved: bool,
    pub attendance_decision: Option<bool>,
    pub registration_ip_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_access_at: Option<DateTime<Utc>>,
}

impl From<InvitationEntity> for Invitation {
    fn from(entity: InvitationEntity) -> Self {
        Self {
            key: InvitationKey::from_stored(entity.invitation_key),
            display_name: entity.display_name,
            max_guests: entity.max_guests,
            contact_email: entity.contact_email,
            contact_phone: entity.contact_phone,
            approved: entity.approved,
            attendance_decision: entity.attendance_decision,
            created_at: entity.created_at,
            last_access_at: entity.last_access_at,
        }
    }
}

/// Invitation row joined with its guest count.
#[derive(Debug, Clone, FromRow)]
pub struct InvitationWithCountEntity {
    #[sqlx(flatten)]
    pub invitation: InvitationEntity,
    pub guest_count: i64,
}

impl From<InvitationWithCountEntity> for InvitationOverview {
    fn from(entity: InvitationWithCountEntity) -> Self {
        Self {
            invitation: entity.invitation.into(),
            guest_count: entity.guest_count,
        }
    }
}
