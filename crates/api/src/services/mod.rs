//! Application services: authentication, rate limiting, roster management
//! and invitation provisioning.
//!
//! Services return typed [`ServiceError`] outcomes and never build HTTP
//! responses themselves.

pub mod auth;
pub mod cookies;
pub mod provisioning;
pub mod rate_limit;
pub mod roster;

use domain::services::roster::PlanError;
use shared::crypto::CryptoError;
use thiserror::Error;

pub use auth::{AuthService, LoginOutcome};
pub use cookies::SessionCookie;
pub use provisioning::{InvitationProvisioner, ProvisionRequest};
pub use rate_limit::LoginRateLimiter;
pub use roster::RosterService;

/// Outcomes of a failed service call.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or unknown invitation code/email.
    #[error("Invalid credential")]
    InvalidCredential,

    /// Missing, tampered or lapsed session.
    #[error("Session expired")]
    SessionExpired,

    #[error("Too many login attempts")]
    RateLimitExceeded { retry_after_secs: u64 },

    /// Guest is not owned by the caller's invitation.
    #[error("Guest does not belong to this invitation")]
    Unauthorized,

    #[error("Invitation allows at most {max_guests} guests")]
    CapacityExceeded { max_guests: i64 },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PlanError> for ServiceError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::ForeignGuest(_) => ServiceError::Unauthorized,
            PlanError::CapacityExceeded { max_guests, .. } => {
                ServiceError::CapacityExceeded { max_guests }
            }
            PlanError::DuplicateGuest(_) | PlanError::InvalidMeal(_) => {
                ServiceError::Validation(err.to_string())
            }
        }
    }
}

impl From<CryptoError> for ServiceError {
    fn from(err: CryptoError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::guest::UnknownMealOption;

    #[test]
    fn test_plan_error_mapping() {
        assert!(matches!(
            ServiceError::from(PlanError::ForeignGuest(7)),
            ServiceError::Unauthorized
        ));
        assert!(matches!(
            ServiceError::from(PlanError::CapacityExceeded {
                max_guests: 2,
                requested: 3
            }),
            ServiceError::CapacityExceeded { max_guests: 2 }
        ));
        assert!(matches!(
            ServiceError::from(PlanError::DuplicateGuest(5)),
            ServiceError::Validation(_)
        ));
        assert!(matches!(
            ServiceError::from(PlanError::InvalidMeal(UnknownMealOption("Steak".into()))),
            ServiceError::Validation(_)
        ));
    }
}
