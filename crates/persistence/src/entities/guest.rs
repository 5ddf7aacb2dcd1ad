//! Guest entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::guest::{Attendance, Guest};
use domain::models::invitation::InvitationKey;
use sqlx::FromRow;

/// Database row mapping for the guests table.
#[derive(Debug, Clone, FromRow)]
pub struct GuestEntity {
    pub id: i64,
    pub invitation_key: String,
    pub name: String,
    pub attending: Option<bool>,
    pub meal_preference: Option<String>,
    pub dietary_restrictions: Option<String>,
    pub last_updated: DateTime<Utc>,
}

impl From<GuestEntity> for Guest {
    fn from(entity: GuestEntity) -> Self {
        Self {
            id: entity.id,
            invitation_key: InvitationKey::from_stored(entity.invitation_key),
            name: entity.name,
            attending: Attendance::from(entity.attending),
            meal_preference: entity.meal_preference,
            dietary_restrictions: entity.dietary_restrictions,
            last_updated: entity.last_updated,
        }
    }
}
