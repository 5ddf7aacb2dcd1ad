//! Common validation utilities.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

/// Maximum accepted email length (RFC 5321 path limit).
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Minimum accepted email length.
pub const MIN_EMAIL_LENGTH: usize = 5;

/// Maximum length of a guest name.
pub const MAX_GUEST_NAME_LENGTH: usize = 100;

/// Maximum length of free-text dietary notes.
pub const MAX_DIETARY_LENGTH: usize = 500;

lazy_static! {
    static ref INVITATION_CODE_REGEX: Regex = Regex::new(r"^[a-z0-9-]{8,32}$").unwrap();
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

/// Canonical form of an invitation code: trimmed and lowercased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}

/// Canonical form of an email key: trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates an already-normalized invitation code.
pub fn validate_invitation_code(code: &str) -> Result<(), ValidationError> {
    if INVITATION_CODE_REGEX.is_match(code) {
        Ok(())
    } else {
        let mut err = ValidationError::new("invitation_code_format");
        err.message = Some("Invitation code must be 8-32 letters, digits or dashes".into());
        Err(err)
    }
}

/// Validates an already-normalized email address used as an invitation key.
pub fn validate_invitation_email(email: &str) -> Result<(), ValidationError> {
    let len = email.len();
    if !(MIN_EMAIL_LENGTH..=MAX_EMAIL_LENGTH).contains(&len) {
        let mut err = ValidationError::new("email_length");
        err.message = Some("Email must be between 5 and 254 characters".into());
        return Err(err);
    }

    let domain_ok = email
        .rsplit_once('@')
        .map(|(_, domain)| !domain.starts_with('.') && !domain.ends_with('.'))
        .unwrap_or(false);

    if EMAIL_REGEX.is_match(email) && domain_ok {
        Ok(())
    } else {
        let mut err = ValidationError::new("email_format");
        err.message = Some("Invalid email address".into());
        Err(err)
    }
}

/// Validates a guest name. Empty names are allowed while the form is being filled.
pub fn validate_guest_name(name: &str) -> Result<(), ValidationError> {
    if name.chars().count() <= MAX_GUEST_NAME_LENGTH {
        Ok(())
    } else {
        let mut err = ValidationError::new("guest_name_length");
        err.message = Some("Guest name must be at most 100 characters".into());
        Err(err)
    }
}
