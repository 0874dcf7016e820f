//! Access token issuance/verification and opaque refresh token generation.
//!
//! Access tokens are HS256 JWTs carrying the subject's username, role, and
//! group. Refresh tokens are random opaque strings; unguessability is their
//! only security property, so they carry no claims at all.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use rand::{rngs::OsRng, RngCore};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{state::AuthConfig, types::Role};

/// Marker separating access tokens from any other signed token class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: the username.
    pub sub: String,
    pub role: Role,
    pub group_id: Option<i64>,
    /// Absolute expiry, seconds since the epoch.
    pub exp: i64,
    pub kind: TokenKind,
}

#[derive(Debug)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    /// The token structure could not be parsed at all.
    #[error("token is malformed")]
    Malformed,

    /// Parsed but not trustworthy: bad signature, wrong algorithm, or
    /// missing/mismatched claims.
    #[error("token is invalid")]
    Invalid,

    #[error("token creation failed")]
    Creation,
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_token_bytes: usize,
    validation: Validation,
}

impl TokenIssuer {
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret().expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact; a token is either valid or it is not.
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl: Duration::minutes(config.access_token_ttl_minutes()),
            refresh_token_bytes: config.refresh_token_bytes(),
            validation,
        }
    }

    /// Mint an access/refresh pair for a principal.
    ///
    /// # Errors
    /// Returns [`TokenError::Creation`] if signing fails.
    pub fn issue(
        &self,
        username: &str,
        role: Role,
        group_id: Option<i64>,
    ) -> Result<TokenPair, TokenError> {
        let exp = (Utc::now() + self.access_ttl).timestamp();
        let claims = AccessClaims {
            sub: username.to_string(),
            role,
            group_id,
            exp,
            kind: TokenKind::Access,
        };

        let access = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| TokenError::Creation)?;

        Ok(TokenPair {
            access,
            refresh: self.generate_refresh_token(),
        })
    }

    /// Verify and decode an access token.
    ///
    /// # Errors
    /// [`TokenError::Expired`] when `exp` is in the past,
    /// [`TokenError::Malformed`] when the structure cannot be parsed, and
    /// [`TokenError::Invalid`] when the signature does not verify, required
    /// claims are absent, or the token is of another class.
    pub fn decode(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let data = decode::<AccessClaims>(token, &self.decoding, &self.validation).map_err(
            |err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Utf8(_) => {
                    TokenError::Malformed
                }
                _ => TokenError::Invalid,
            },
        )?;

        if data.claims.kind != TokenKind::Access {
            return Err(TokenError::Invalid);
        }

        Ok(data.claims)
    }

    /// Generate an opaque refresh token: hex-encoded random bytes.
    #[must_use]
    pub fn generate_refresh_token(&self) -> String {
        let mut bytes = vec![0u8; self.refresh_token_bytes];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn issuer() -> TokenIssuer {
        let config = AuthConfig::new(
            SecretString::from("0123456789abcdef0123456789abcdef"),
            "https://custos.dev".to_string(),
        );
        TokenIssuer::from_config(&config)
    }

    #[test]
    fn issue_decode_round_trip() {
        let issuer = issuer();
        let pair = issuer
            .issue("alice", Role::Moderator, Some(7))
            .expect("issue");

        let claims = issuer.decode(&pair.access).expect("decode");
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Role::Moderator);
        assert_eq!(claims.group_id, Some(7));
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn expired_token_is_distinct() {
        let issuer = issuer();
        let claims = AccessClaims {
            sub: "alice".to_string(),
            role: Role::User,
            group_id: None,
            exp: Utc::now().timestamp() - 120,
            kind: TokenKind::Access,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"0123456789abcdef0123456789abcdef"),
        )
        .expect("encode");

        assert_eq!(issuer.decode(&token), Err(TokenError::Expired));
    }

    #[test]
    fn garbage_is_malformed() {
        let issuer = issuer();
        assert_eq!(issuer.decode("not-a-token"), Err(TokenError::Malformed));
    }

    #[test]
    fn wrong_signature_is_invalid() {
        let issuer = issuer();
        let other_config = AuthConfig::new(
            SecretString::from("ffffffffffffffffffffffffffffffff"),
            "https://custos.dev".to_string(),
        );
        let other = TokenIssuer::from_config(&other_config);
        let pair = other.issue("alice", Role::User, None).expect("issue");

        assert_eq!(issuer.decode(&pair.access), Err(TokenError::Invalid));
    }

    #[test]
    fn non_access_kind_is_invalid() {
        let issuer = issuer();
        let claims = AccessClaims {
            sub: "alice".to_string(),
            role: Role::User,
            group_id: None,
            exp: Utc::now().timestamp() + 600,
            kind: TokenKind::Refresh,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"0123456789abcdef0123456789abcdef"),
        )
        .expect("encode");

        assert_eq!(issuer.decode(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn refresh_tokens_are_long_and_unique() {
        let issuer = issuer();
        let first = issuer.generate_refresh_token();
        let second = issuer.generate_refresh_token();
        // 64 raw bytes hex-encode to 128 characters.
        assert_eq!(first.len(), 128);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }
}
