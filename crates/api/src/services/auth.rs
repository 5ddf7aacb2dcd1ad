//! Authentication and session lifecycle.
//!
//! Login resolves an invitation by code or email, then mints a server-side
//! session and a signed token for the cookie. Sessions expire lazily: an
//! expired row is deleted the next time it is looked up.

use chrono::{DateTime, Duration, Utc};
use domain::models::invitation::{Invitation, InvitationKey, InvitationMode, NewInvitation};
use domain::models::session::Session;
use persistence::repositories::{InvitationRepository, SessionRepository};
use shared::crypto::{generate_session_id, SecretKey};
use shared::token::SessionTokenCodec;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::services::rate_limit::LoginRateLimiter;
use crate::services::ServiceError;

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub invitation: Invitation,
    pub session: Session,
    /// Signed token for the session cookie.
    pub token: String,
}

/// Service for login, session lookup and logout.
#[derive(Clone)]
pub struct AuthService {
    invitations: InvitationRepository,
    sessions: SessionRepository,
    rate_limiter: LoginRateLimiter,
    codec: SessionTokenCodec,
    secret: SecretKey,
    mode: InvitationMode,
    default_max_guests: i64,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(pool: SqlitePool, config: &Config, secret: SecretKey) -> Self {
        Self {
            invitations: InvitationRepository::new(pool.clone()),
            sessions: SessionRepository::new(pool.clone()),
            rate_limiter: LoginRateLimiter::from_config(pool, &config.security),
            codec: SessionTokenCodec::new(secret.clone()),
            secret,
            mode: config.invitations.mode,
            default_max_guests: config.invitations.default_max_guests,
            session_ttl: config.session_ttl(),
        }
    }

    pub fn mode(&self) -> InvitationMode {
        self.mode
    }

    /// Authenticate with a code or email (per the configured mode).
    ///
    /// Code logins are rate limited per hashed client IP before any lookup.
    /// Email logins create the invitation on first use.
    pub async fn login(
        &self,
        credential: &str,
        client_ip: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, ServiceError> {
        let ip_hash = self.secret.hash_ip(client_ip);

        let invitation = match self.mode {
            InvitationMode::Code => {
                self.rate_limiter.check_and_record(&ip_hash, now).await?;
                let key = InvitationKey::from_code(credential).map_err(|e| {
                    debug!(error = %e, "Rejected malformed invitation code");
                    ServiceError::InvalidCredential
                })?;
                self.resolve_invitation(&key).await?
            }
            InvitationMode::Email => {
                let key = InvitationKey::from_email(credential).map_err(|e| {
                    debug!(error = %e, "Rejected malformed invitation email");
                    ServiceError::InvalidCredential
                })?;
                self.resolve_or_create_invitation(&key, &ip_hash, now).await?
            }
        };

        self.touch_last_access(&invitation.key, now).await;

        let (session, token) = self
            .create_session(&invitation.key, Some(ip_hash), now)
            .await?;

        info!(
            invitation_key = %invitation.key,
            session_id = session.log_id(),
            "Invitation login succeeded"
        );

        Ok(LoginOutcome {
            invitation,
            session,
            token,
        })
    }

    /// Exact-match lookup. Unknown keys are an invalid credential.
    pub async fn resolve_invitation(&self, key: &InvitationKey) -> Result<Invitation, ServiceError> {
        match self.invitations.find_by_key(key.as_str()).await? {
            Some(entity) => Ok(entity.into()),
            None => {
                info!("Login with unknown invitation key");
                Err(ServiceError::InvalidCredential)
            }
        }
    }

    /// Lookup that creates the invitation with default capacity if absent.
    pub async fn resolve_or_create_invitation(
        &self,
        key: &InvitationKey,
        ip_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Invitation, ServiceError> {
        if let Some(entity) = self.invitations.find_by_key(key.as_str()).await? {
            return Ok(entity.into());
        }

        let new_invitation =
            NewInvitation::self_registered(key.clone(), self.default_max_guests, ip_hash.to_string());
        let entity = self
            .invitations
            .create_if_absent(&new_invitation, now)
            .await?;
        info!(
            invitation_key = %key,
            max_guests = entity.max_guests,
            "Created invitation on first login"
        );
        Ok(entity.into())
    }

    /// Best-effort last access update. Failures are logged and ignored.
    pub async fn touch_last_access(&self, key: &InvitationKey, now: DateTime<Utc>) {
        if let Err(e) = self.invitations.touch_last_access(key.as_str(), now).await {
            warn!(invitation_key = %key, error = %e, "Failed to update last access time");
        }
    }

    /// Persist a new session and return it with its signed token.
    pub async fn create_session(
        &self,
        key: &InvitationKey,
        ip_hash: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(Session, String), ServiceError> {
        let session_id = generate_session_id()?;
        let session = Session::new(session_id, key.clone(), now, self.session_ttl, ip_hash);
        self.sessions.insert(&session).await?;

        let token = self.codec.create_token_at(&session.id, now.timestamp());
        Ok((session, token))
    }

    /// Load a live session. An expired one is deleted and reported as expired.
    pub async fn get_session(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, ServiceError> {
        let session: Session = match self.sessions.find_by_id(session_id).await? {
            Some(entity) => entity.into(),
            None => return Err(ServiceError::SessionExpired),
        };

        if session.is_expired(now) {
            match self.sessions.delete(&session.id).await {
                Ok(_) => debug!(session_id = session.log_id(), "Purged expired session"),
                Err(e) => warn!(
                    session_id = session.log_id(),
                    error = %e,
                    "Failed to purge expired session"
                ),
            }
            return Err(ServiceError::SessionExpired);
        }

        Ok(session)
    }

    /// Resolve the session behind a cookie token.
    pub async fn session_from_token(
        &self,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Session, ServiceError> {
        let token = token.ok_or(ServiceError::SessionExpired)?;
        let verified = self.codec.verify_token(token).ok_or_else(|| {
            debug!("Session token failed verification");
            ServiceError::SessionExpired
        })?;
        self.get_session(&verified.session_id, now).await
    }

    /// Delete the session behind the token, if the token verifies.
    pub async fn logout(&self, token: Option<&str>) -> Result<(), ServiceError> {
        let Some(verified) = token.and_then(|t| self.codec.verify_token(t)) else {
            return Ok(());
        };
        let deleted = self.sessions.delete(&verified.session_id).await?;
        if deleted > 0 {
            let log_id: String = verified.session_id.chars().take(8).collect();
            info!(session_id = %log_id, "Session logged out");
        }
        Ok(())
    }
}
