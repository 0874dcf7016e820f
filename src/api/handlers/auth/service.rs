//! Login, refresh, and password-reset orchestration.
//!
//! Refresh-token lifecycle: `ISSUED -> (rotate) -> REVOKED_GRACE -> (ttl) ->
//! FORGOTTEN`. There is no way back from `REVOKED_GRACE`; every presentation
//! of a refresh token goes through `rotate`'s validation.

use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, info};

use super::{
    password,
    sessions::SessionError,
    state::AuthState,
    storage::{self, UserRecord},
    types::TokenEnvelope,
};
use crate::api::notify;

#[derive(Debug, Error)]
pub enum AuthFlowError {
    /// No principal matches the presented login. Deliberately distinct from
    /// a credential mismatch for the login endpoint.
    #[error("principal not found")]
    PrincipalNotFound,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("principal is blocked")]
    PrincipalBlocked,

    /// Refresh token rejected by the session store (revoked or unknown).
    #[error("invalid refresh token")]
    InvalidToken,

    #[error("auth dependency failed: {0}")]
    Dependency(String),
}

impl From<SessionError> for AuthFlowError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Revoked | SessionError::Unknown => Self::InvalidToken,
            SessionError::Backend(message) => Self::Dependency(message),
        }
    }
}

pub struct AuthService<'a> {
    pool: &'a PgPool,
    state: &'a AuthState,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub fn new(pool: &'a PgPool, state: &'a AuthState) -> Self {
        Self { pool, state }
    }

    /// Verify credentials and mint a token pair.
    ///
    /// # Errors
    /// [`AuthFlowError::PrincipalNotFound`] when no user matches the login,
    /// [`AuthFlowError::InvalidCredentials`] on a password mismatch,
    /// [`AuthFlowError::PrincipalBlocked`] for blocked users, and
    /// [`AuthFlowError::Dependency`] when a store call fails.
    pub async fn authenticate(
        &self,
        login: &str,
        password_plain: &str,
    ) -> Result<TokenEnvelope, AuthFlowError> {
        let user = storage::find_by_login(self.pool, login)
            .await
            .map_err(|err| AuthFlowError::Dependency(err.to_string()))?
            .ok_or(AuthFlowError::PrincipalNotFound)?;

        if !password::verify(password_plain, &user.password_hash) {
            return Err(AuthFlowError::InvalidCredentials);
        }

        if user.is_blocked {
            return Err(AuthFlowError::PrincipalBlocked);
        }

        let envelope = self.mint_session(&user).await?;
        info!(username = %user.username, "login succeeded");
        Ok(envelope)
    }

    /// Rotate a refresh token and mint a fresh pair.
    ///
    /// Claims are re-read from the principal, so role or group changes take
    /// effect on the next refresh.
    ///
    /// # Errors
    /// [`AuthFlowError::InvalidToken`] for revoked/unknown tokens,
    /// [`AuthFlowError::PrincipalNotFound`] if the identity was deleted after
    /// issuance, [`AuthFlowError::PrincipalBlocked`] if it was blocked since.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenEnvelope, AuthFlowError> {
        let user_id = self.state.sessions().rotate(refresh_token).await?;

        let user = storage::find_by_id(self.pool, user_id)
            .await
            .map_err(|err| AuthFlowError::Dependency(err.to_string()))?
            .ok_or(AuthFlowError::PrincipalNotFound)?;

        if user.is_blocked {
            return Err(AuthFlowError::PrincipalBlocked);
        }

        let envelope = self.mint_session(&user).await?;
        debug!(username = %user.username, "refresh token rotated");
        Ok(envelope)
    }

    /// Enqueue a password-reset notification if the email is registered.
    ///
    /// The caller's observable outcome is identical whether or not the email
    /// exists; only dependency failures surface.
    ///
    /// # Errors
    /// [`AuthFlowError::Dependency`] when the lookup or the outbox enqueue
    /// fails. Dispatch failures are fatal by design, never dropped.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthFlowError> {
        let user = storage::find_by_email(self.pool, email)
            .await
            .map_err(|err| AuthFlowError::Dependency(err.to_string()))?;

        let Some(user) = user else {
            debug!("password reset requested for unregistered email");
            return Ok(());
        };

        let message =
            notify::build_reset_message(&user, self.state.config().frontend_base_url());
        notify::enqueue_reset(self.pool, &message)
            .await
            .map_err(|err| AuthFlowError::Dependency(err.to_string()))?;

        info!(user_id = %user.id, "password reset queued");
        Ok(())
    }

    /// Issue a pair and persist the refresh side. The pair only counts as
    /// committed once the session-store write succeeds.
    async fn mint_session(&self, user: &UserRecord) -> Result<TokenEnvelope, AuthFlowError> {
        let pair = self
            .state
            .tokens()
            .issue(&user.username, user.role, user.group_id)
            .map_err(|err| AuthFlowError::Dependency(err.to_string()))?;

        self.state
            .sessions()
            .register(&pair.refresh, user.id)
            .await
            .map_err(|err| match err {
                SessionError::Backend(message) => AuthFlowError::Dependency(message),
                other => AuthFlowError::Dependency(other.to_string()),
            })?;

        Ok(TokenEnvelope::new(pair.access, pair.refresh))
    }
}
