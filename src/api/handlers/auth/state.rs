//! Auth configuration and shared state.

use secrecy::SecretString;
use std::time::Duration;

use super::{sessions::SessionStore, tokens::TokenIssuer};

const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: i64 = 15;
const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 7;
const DEFAULT_BLACKLIST_TTL_SECONDS: u64 = 3600;
const DEFAULT_STORE_TIMEOUT_SECONDS: u64 = 5;
/// Raw entropy of an opaque refresh token; hex-encoded it doubles in length.
const DEFAULT_REFRESH_TOKEN_BYTES: usize = 64;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    jwt_secret: SecretString,
    frontend_base_url: String,
    access_token_ttl_minutes: i64,
    refresh_token_ttl_days: i64,
    blacklist_ttl_seconds: u64,
    store_timeout_seconds: u64,
    refresh_token_bytes: usize,
}

impl AuthConfig {
    #[must_use]
    pub fn new(jwt_secret: SecretString, frontend_base_url: String) -> Self {
        Self {
            jwt_secret,
            frontend_base_url,
            access_token_ttl_minutes: DEFAULT_ACCESS_TOKEN_TTL_MINUTES,
            refresh_token_ttl_days: DEFAULT_REFRESH_TOKEN_TTL_DAYS,
            blacklist_ttl_seconds: DEFAULT_BLACKLIST_TTL_SECONDS,
            store_timeout_seconds: DEFAULT_STORE_TIMEOUT_SECONDS,
            refresh_token_bytes: DEFAULT_REFRESH_TOKEN_BYTES,
        }
    }

    #[must_use]
    pub fn with_access_token_ttl_minutes(mut self, minutes: i64) -> Self {
        self.access_token_ttl_minutes = minutes.max(1);
        self
    }

    #[must_use]
    pub fn with_refresh_token_ttl_days(mut self, days: i64) -> Self {
        self.refresh_token_ttl_days = days.max(1);
        self
    }

    #[must_use]
    pub fn with_blacklist_ttl_seconds(mut self, seconds: u64) -> Self {
        self.blacklist_ttl_seconds = seconds.max(1);
        self
    }

    #[must_use]
    pub fn with_store_timeout_seconds(mut self, seconds: u64) -> Self {
        self.store_timeout_seconds = seconds.max(1);
        self
    }

    #[must_use]
    pub fn with_refresh_token_bytes(mut self, bytes: usize) -> Self {
        self.refresh_token_bytes = bytes.max(32);
        self
    }

    #[must_use]
    pub fn jwt_secret(&self) -> &SecretString {
        &self.jwt_secret
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub const fn access_token_ttl_minutes(&self) -> i64 {
        self.access_token_ttl_minutes
    }

    #[must_use]
    pub const fn refresh_token_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_ttl_days as u64 * 86_400)
    }

    #[must_use]
    pub const fn blacklist_ttl(&self) -> Duration {
        Duration::from_secs(self.blacklist_ttl_seconds)
    }

    #[must_use]
    pub const fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_seconds)
    }

    #[must_use]
    pub const fn refresh_token_bytes(&self) -> usize {
        self.refresh_token_bytes
    }
}

/// Shared auth state attached to the router as an extension.
#[derive(Clone)]
pub struct AuthState {
    config: AuthConfig,
    tokens: TokenIssuer,
    sessions: SessionStore,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, sessions: SessionStore) -> Self {
        let tokens = TokenIssuer::from_config(&config);
        Self {
            config,
            tokens,
            sessions,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::new(
            SecretString::from("0123456789abcdef0123456789abcdef"),
            "https://custos.dev".to_string(),
        )
    }

    #[test]
    fn defaults_match_contract() {
        let config = config();
        assert_eq!(config.access_token_ttl_minutes(), 15);
        assert_eq!(config.refresh_token_ttl(), Duration::from_secs(7 * 86_400));
        assert_eq!(config.blacklist_ttl(), Duration::from_secs(3600));
        assert_eq!(config.store_timeout(), Duration::from_secs(5));
        assert_eq!(config.refresh_token_bytes(), 64);
    }

    #[test]
    fn builders_clamp_to_sane_minimums() {
        let config = config()
            .with_access_token_ttl_minutes(0)
            .with_refresh_token_ttl_days(-1)
            .with_blacklist_ttl_seconds(0)
            .with_store_timeout_seconds(0)
            .with_refresh_token_bytes(1);
        assert_eq!(config.access_token_ttl_minutes(), 1);
        assert_eq!(config.refresh_token_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.blacklist_ttl(), Duration::from_secs(1));
        assert_eq!(config.store_timeout(), Duration::from_secs(1));
        assert_eq!(config.refresh_token_bytes(), 32);
    }
}
