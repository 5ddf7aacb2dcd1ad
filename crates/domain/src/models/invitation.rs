//! Invitation domain models.
//!
//! An invitation is the unit of access control: one per invited party,
//! identified either by an opaque code or by the party's email address.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::{
    normalize_code, normalize_email, validate_invitation_code, validate_invitation_email,
};
use thiserror::Error;
use validator::Validate;

/// Default capacity for invitations created without an explicit guest count.
pub const DEFAULT_MAX_GUESTS: i64 = 2;

/// Upper bound accepted by provisioning.
pub const MAX_GUESTS_LIMIT: i64 = 50;

/// How guests identify themselves at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationMode {
    /// Printed invitation code, rate limited per client IP.
    #[default]
    Code,
    /// Email address, unknown addresses get an invitation on first login.
    Email,
}

impl InvitationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationMode::Code => "code",
            InvitationMode::Email => "email",
        }
    }
}

/// Rejected login input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInvitationKey {
    #[error("invitation code is malformed")]
    MalformedCode,
    #[error("email address is malformed")]
    MalformedEmail,
}

/// Normalized invitation key (code or email).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvitationKey(String);

impl InvitationKey {
    /// Parses a code: trimmed, lowercased, 8-32 of `[a-z0-9-]`.
    pub fn from_code(raw: &str) -> Result<Self, InvalidInvitationKey> {
        let code = normalize_code(raw);
        validate_invitation_code(&code).map_err(|_| InvalidInvitationKey::MalformedCode)?;
        Ok(Self(code))
    }

    /// Parses an email address: trimmed and lowercased before validation.
    pub fn from_email(raw: &str) -> Result<Self, InvalidInvitationKey> {
        let email = normalize_email(raw);
        validate_invitation_email(&email).map_err(|_| InvalidInvitationKey::MalformedEmail)?;
        Ok(Self(email))
    }

    /// Parses raw input according to the configured mode.
    pub fn parse(mode: InvitationMode, raw: &str) -> Result<Self, InvalidInvitationKey> {
        match mode {
            InvitationMode::Code => Self::from_code(raw),
            InvitationMode::Email => Self::from_email(raw),
        }
    }

    /// Wraps a key read back from storage. No validation is applied.
    pub fn from_stored(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvitationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl AsRef<str> for InvitationKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Invitation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Invitation {
    pub key: InvitationKey,
    pub display_name: Option<String>,
    pub max_guests: i64,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub approved: bool,
    /// Party-level decision, recorded even when no guest is named.
    pub attendance_decision: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub last_access_at: Option<DateTime<Utc>>,
}

/// Values used when inserting a new invitation.
#[derive(Debug, Clone)]
pub struct NewInvitation {
    pub key: InvitationKey,
    pub display_name: Option<String>,
    pub max_guests: i64,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub registration_ip_hash: Option<String>,
}

impl NewInvitation {
    /// Defaults for an invitation created lazily at login.
    pub fn self_registered(key: InvitationKey, max_guests: i64, ip_hash: String) -> Self {
        Self {
            contact_email: Some(key.as_str().to_string()),
            key,
            display_name: None,
            max_guests,
            contact_phone: None,
            registration_ip_hash: Some(ip_hash),
        }
    }
}

/// Public view of an invitation returned to the authenticated party.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InvitationSummary {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub max_guests: i64,
    pub attendance_decision: Option<bool>,
}

impl From<&Invitation> for InvitationSummary {
    fn from(invitation: &Invitation) -> Self {
        Self {
            key: invitation.key.to_string(),
            display_name: invitation.display_name.clone(),
            max_guests: invitation.max_guests,
            attendance_decision: invitation.attendance_decision,
        }
    }
}

/// Invitation listing row used by the admin CLI.
#[derive(Debug, Clone, Serialize)]
pub struct InvitationOverview {
    pub invitation: Invitation,
    pub guest_count: i64,
}

/// Login request: exactly one of `code` or `email` depending on the mode.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct LoginRequest {
    #[validate(length(max = 64, message = "Invitation code too long"))]
    pub code: Option<String>,

    #[validate(length(max = 254, message = "Email too long"))]
    pub email: Option<String>,
}

impl LoginRequest {
    /// Returns the credential matching the mode, if it was supplied.
    pub fn credential(&self, mode: InvitationMode) -> Option<&str> {
        match mode {
            InvitationMode::Code => self.code.as_deref(),
            InvitationMode::Email => self.email.as_deref(),
        }
    }
}

/// Successful login response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LoginResponse {
    pub invitation: InvitationSummary,
    pub expires_at: DateTime<Utc>,
}
