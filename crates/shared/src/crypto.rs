//! Secret key material and random identifiers.
//!
//! The signing key is loaded once at startup and handed to whoever needs it
//! (token codec, IP hashing). Clones share the same underlying bytes.

use std::fmt;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, Rng, RngCore};
use sha2::Sha256;
use thiserror::Error;

pub type HmacSha256 = Hmac<Sha256>;

/// Size of a generated signing key in bytes (256 bits).
pub const SECRET_KEY_LEN: usize = 32;

/// Number of random bytes in a session id (hex encoded to 48 chars).
pub const SESSION_ID_BYTES: usize = 24;

/// Length of generated invitation codes.
pub const INVITATION_CODE_LEN: usize = 8;

// No 0/o, 1/l: codes are read aloud and typed from paper invitations.
const INVITATION_CODE_CHARSET: &[u8] = b"abcdefghijkmnpqrstuvwxyz23456789";

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("secure random generator unavailable: {0}")]
    RandomUnavailable(String),
}

/// HMAC signing key shared by the token codec and IP hashing.
#[derive(Clone)]
pub struct SecretKey {
    bytes: Arc<[u8]>,
    ephemeral: bool,
}

impl SecretKey {
    /// Builds the key from the configured value, or generates a fresh one.
    ///
    /// A configured value is decoded as standard base64 when possible and
    /// used as raw bytes otherwise. A missing or blank value yields a random
    /// key that only lives as long as the process.
    pub fn from_config(configured: Option<&str>) -> Result<Self, CryptoError> {
        match configured.map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => Ok(Self::from_encoded(value)),
            None => Self::generate(),
        }
    }

    /// Decodes a pre-shared key (base64, falling back to raw bytes).
    pub fn from_encoded(value: &str) -> Self {
        let bytes = STANDARD
            .decode(value)
            .unwrap_or_else(|_| value.as_bytes().to_vec());
        Self {
            bytes: bytes.into(),
            ephemeral: false,
        }
    }

    /// Generates a random 256-bit key from the operating system RNG.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut bytes = [0u8; SECRET_KEY_LEN];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| CryptoError::RandomUnavailable(e.to_string()))?;
        Ok(Self {
            bytes: bytes.to_vec().into(),
            ephemeral: true,
        })
    }

    /// True when the key was generated at startup rather than configured.
    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }

    /// Returns a fresh HMAC-SHA256 instance keyed with this secret.
    pub fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.bytes).expect("HMAC can take key of any size")
    }

    /// Keyed hash of a client IP address, hex encoded.
    ///
    /// Raw addresses are never persisted; this is what sessions, login
    /// attempt markers and registration audit columns store instead.
    pub fn hash_ip(&self, ip: &str) -> String {
        let mut mac = self.mac();
        mac.update(ip.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("len", &self.bytes.len())
            .field("ephemeral", &self.ephemeral)
            .finish_non_exhaustive()
    }
}

/// Generates a new session id: 24 random bytes, hex encoded.
pub fn generate_session_id() -> Result<String, CryptoError> {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::RandomUnavailable(e.to_string()))?;
    Ok(hex::encode(bytes))
}

/// Generates a random invitation code from an unambiguous alphabet.
pub fn generate_invitation_code() -> String {
    let mut rng = rand::thread_rng();
    (0..INVITATION_CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..INVITATION_CODE_CHARSET.len());
            INVITATION_CODE_CHARSET[idx] as char
        })
        .collect()
}
