//! Signed session tokens carried in the session cookie.
//!
//! Wire format: `base64url_nopad(payload "." hex(hmac_sha256(payload)))` where
//! the payload is `<len>:<session_id>|<unix_ts>`. The length prefix keeps the
//! session id unambiguous whatever characters it contains.
//!
//! The token only proves that the session id was minted by a holder of the
//! key. Expiry is enforced by the session store, not here.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use hmac::Mac;

use crate::crypto::SecretKey;

/// Result of a successful token verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub session_id: String,
    /// Unix timestamp (seconds) at which the token was minted.
    pub issued_at: i64,
}

/// Creates and verifies session tokens with a fixed signing key.
#[derive(Debug, Clone)]
pub struct SessionTokenCodec {
    key: SecretKey,
}

impl SessionTokenCodec {
    pub fn new(key: SecretKey) -> Self {
        Self { key }
    }

    /// Creates a token for the session, stamped with the current time.
    pub fn create_token(&self, session_id: &str) -> String {
        self.create_token_at(session_id, Utc::now().timestamp())
    }

    /// Creates a token with an explicit issuance timestamp.
    pub fn create_token_at(&self, session_id: &str, issued_at: i64) -> String {
        let payload = encode_payload(session_id, issued_at);
        let signature = self.sign(&payload);
        URL_SAFE_NO_PAD.encode(format!("{}.{}", payload, signature))
    }

    /// Verifies a token and returns the embedded session id.
    ///
    /// Returns `None` for anything that is not a well-formed token signed
    /// with this codec's key. Never panics on untrusted input.
    pub fn verify_token(&self, token: &str) -> Option<VerifiedToken> {
        let raw = URL_SAFE_NO_PAD.decode(token).ok()?;
        let raw = String::from_utf8(raw).ok()?;
        let (payload, signature) = raw.rsplit_once('.')?;

        if !is_lower_hex(signature) {
            return None;
        }
        let signature = hex::decode(signature).ok()?;

        let mut mac = self.key.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).ok()?;

        decode_payload(payload)
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = self.key.mac();
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

fn encode_payload(session_id: &str, issued_at: i64) -> String {
    format!("{}:{}|{}", session_id.len(), session_id, issued_at)
}

fn decode_payload(payload: &str) -> Option<VerifiedToken> {
    let (len, rest) = payload.split_once(':')?;
    if len.is_empty() || !len.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let len: usize = len.parse().ok()?;

    let session_id = rest.get(..len)?;
    let timestamp = rest.get(len..)?.strip_prefix('|')?;
    let digits = timestamp.strip_prefix('-').unwrap_or(timestamp);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    Some(VerifiedToken {
        session_id: session_id.to_string(),
        issued_at: timestamp.parse().ok()?,
    })
}

fn is_lower_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
