//! Invitation provisioning for operators.

use chrono::{DateTime, Utc};
use domain::models::invitation::{
    Invitation, InvitationKey, InvitationOverview, NewInvitation, MAX_GUESTS_LIMIT,
};
use persistence::repositories::InvitationRepository;
use shared::crypto::generate_invitation_code;
use sqlx::SqlitePool;
use tracing::info;

use crate::services::ServiceError;

/// Operator input for a new invitation.
#[derive(Debug, Clone, Default)]
pub struct ProvisionRequest {
    pub display_name: String,
    pub max_guests: i64,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    /// Use this code instead of generating one.
    pub code: Option<String>,
}

/// Creates invitations and lists them with guest counts.
#[derive(Clone)]
pub struct InvitationProvisioner {
    invitations: InvitationRepository,
    public_base_url: String,
}

impl InvitationProvisioner {
    pub fn new(pool: SqlitePool, public_base_url: &str) -> Self {
        Self {
            invitations: InvitationRepository::new(pool),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Insert a code invitation, generating a unique code unless one is given.
    pub async fn add(
        &self,
        request: ProvisionRequest,
        now: DateTime<Utc>,
    ) -> Result<Invitation, ServiceError> {
        if !(1..=MAX_GUESTS_LIMIT).contains(&request.max_guests) {
            return Err(ServiceError::Validation(format!(
                "max guests must be between 1 and {}",
                MAX_GUESTS_LIMIT
            )));
        }
        let display_name = request.display_name.trim();
        if display_name.is_empty() {
            return Err(ServiceError::Validation("family name is required".into()));
        }

        let key = match request.code.as_deref() {
            Some(code) => InvitationKey::from_code(code)
                .map_err(|e| ServiceError::Validation(e.to_string()))?,
            None => InvitationKey::from_stored(
                self.invitations
                    .generate_unique_key(generate_invitation_code)
                    .await?,
            ),
        };

        if self.invitations.key_exists(key.as_str()).await? {
            return Err(ServiceError::Validation(format!(
                "invitation code {} is already in use",
                key
            )));
        }

        let entity = self
            .invitations
            .create(
                &NewInvitation {
                    key,
                    display_name: Some(display_name.to_string()),
                    max_guests: request.max_guests,
                    contact_email: request.contact_email.filter(|e| !e.trim().is_empty()),
                    contact_phone: request.contact_phone.filter(|p| !p.trim().is_empty()),
                    registration_ip_hash: None,
                },
                now,
            )
            .await?;

        info!(
            invitation_key = %entity.invitation_key,
            max_guests = entity.max_guests,
            "Invitation provisioned"
        );
        Ok(entity.into())
    }

    /// All invitations, newest first, with their guest counts.
    pub async fn list(&self) -> Result<Vec<InvitationOverview>, ServiceError> {
        Ok(self
            .invitations
            .list_with_counts()
            .await?
            .into_iter()
            .map(InvitationOverview::from)
            .collect())
    }

    /// Shareable link that logs the party in directly.
    pub fn invitation_url(&self, key: &InvitationKey) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}
