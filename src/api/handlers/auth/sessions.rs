//! Refresh-token session store over Redis.
//!
//! Two key families track a refresh token's lifecycle:
//! `refresh_token:<token> -> user_id` while the token is live, and
//! `blacklist:<token> -> "blacklisted"` for a grace window after rotation.
//! The two are mutually exclusive in validity: rotation deletes the forward
//! mapping before writing the blacklist marker, and a token that is neither
//! mapped nor blacklisted is rejected. That rule also covers a crash between
//! the two writes.
//!
//! Every operation has a bounded timeout and fails closed: a slow or
//! unreachable store never validates a token.

use redis::{aio::ConnectionManager, AsyncCommands};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use super::state::AuthConfig;

const REFRESH_PREFIX: &str = "refresh_token:";
const BLACKLIST_PREFIX: &str = "blacklist:";
const BLACKLIST_SENTINEL: &str = "blacklisted";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Token was rotated recently and sits in the blacklist grace window.
    #[error("refresh token has been revoked")]
    Revoked,

    /// No live mapping for the token (expired, never issued, or lost to a
    /// crash mid-rotation).
    #[error("refresh token is unknown")]
    Unknown,

    #[error("session store failure: {0}")]
    Backend(String),
}

#[derive(Clone)]
pub struct SessionStore {
    manager: ConnectionManager,
    refresh_ttl: Duration,
    blacklist_ttl: Duration,
    op_timeout: Duration,
}

fn refresh_key(token: &str) -> String {
    format!("{REFRESH_PREFIX}{token}")
}

fn blacklist_key(token: &str) -> String {
    format!("{BLACKLIST_PREFIX}{token}")
}

impl SessionStore {
    #[must_use]
    pub fn new(manager: ConnectionManager, config: &AuthConfig) -> Self {
        Self {
            manager,
            refresh_ttl: config.refresh_token_ttl(),
            blacklist_ttl: config.blacklist_ttl(),
            op_timeout: config.store_timeout(),
        }
    }

    async fn bounded<T, F>(&self, operation: F) -> Result<T, SessionError>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.op_timeout, operation).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(SessionError::Backend(err.to_string())),
            Err(_) => Err(SessionError::Backend(
                "session store operation timed out".to_string(),
            )),
        }
    }

    /// Map a freshly issued refresh token to its owner.
    ///
    /// Collisions are not handled; 64 bytes of entropy make them practically
    /// impossible.
    ///
    /// # Errors
    /// Returns [`SessionError::Backend`] if the write fails or times out.
    pub async fn register(&self, refresh_token: &str, user_id: Uuid) -> Result<(), SessionError> {
        let mut conn = self.manager.clone();
        let key = refresh_key(refresh_token);
        let ttl = self.refresh_ttl.as_secs();
        self.bounded(async move { conn.set_ex::<_, _, ()>(key, user_id.to_string(), ttl).await })
            .await
    }

    /// # Errors
    /// Returns [`SessionError::Backend`] if the lookup fails or times out.
    pub async fn is_blacklisted(&self, refresh_token: &str) -> Result<bool, SessionError> {
        let mut conn = self.manager.clone();
        let key = blacklist_key(refresh_token);
        self.bounded(async move { conn.exists::<_, bool>(key).await })
            .await
    }

    /// Consume a refresh token: delete the forward mapping, blacklist the
    /// token for the grace window, and return the owning user id.
    ///
    /// # Errors
    /// [`SessionError::Revoked`] if the token is blacklisted,
    /// [`SessionError::Unknown`] if no forward mapping exists, and
    /// [`SessionError::Backend`] on store failure or timeout.
    pub async fn rotate(&self, refresh_token: &str) -> Result<Uuid, SessionError> {
        if self.is_blacklisted(refresh_token).await? {
            return Err(SessionError::Revoked);
        }

        let forward = refresh_key(refresh_token);
        let mut conn = self.manager.clone();
        let key = forward.clone();
        let user_id: Option<String> = self
            .bounded(async move { conn.get::<_, Option<String>>(key).await })
            .await?;

        let Some(user_id) = user_id else {
            return Err(SessionError::Unknown);
        };
        // A mapping that does not hold a user id is useless; reject it.
        let user_id = Uuid::parse_str(&user_id).map_err(|_| SessionError::Unknown)?;

        let mut conn = self.manager.clone();
        self.bounded(async move { conn.del::<_, ()>(forward).await })
            .await?;

        let mut conn = self.manager.clone();
        let key = blacklist_key(refresh_token);
        let ttl = self.blacklist_ttl.as_secs();
        self.bounded(async move { conn.set_ex::<_, _, ()>(key, BLACKLIST_SENTINEL, ttl).await })
            .await?;

        Ok(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_families_are_disjoint() {
        let token = "deadbeef";
        assert_eq!(refresh_key(token), "refresh_token:deadbeef");
        assert_eq!(blacklist_key(token), "blacklist:deadbeef");
        assert_ne!(refresh_key(token), blacklist_key(token));
    }
}
