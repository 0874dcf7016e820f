//! Crate-wide error taxonomy and response mapping.
//!
//! Every handler funnels failures through [`ApiError`] so clients always see
//! the same `{"message": ...}` body shape. Authentication failures carry a
//! `WWW-Authenticate: Bearer` header so clients know to re-authenticate.

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use super::handlers::auth::{
    service::AuthFlowError, sessions::SessionError, tokens::TokenError,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("User not found")]
    PrincipalNotFound,

    #[error("Incorrect login or password")]
    InvalidCredentials,

    #[error("User is blocked")]
    PrincipalBlocked,

    #[error("User with this email, username or phone number already exists")]
    PrincipalAlreadyExists,

    #[error("Group does not exist")]
    GroupNotFound,

    #[error("Not enough permissions")]
    NotAuthorized,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Failed to decode token")]
    TokenMalformed,

    #[error("Invalid token")]
    TokenInvalid,

    /// A refresh token the session store rejected (revoked, unknown, or
    /// already rotated).
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    UploadRejected(&'static str),

    #[error("Service dependency unavailable")]
    DependencyUnavailable,
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::PrincipalNotFound => StatusCode::NOT_FOUND,
            Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenMalformed
            | Self::TokenInvalid
            | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::PrincipalBlocked | Self::NotAuthorized => StatusCode::FORBIDDEN,
            Self::PrincipalAlreadyExists => StatusCode::CONFLICT,
            Self::GroupNotFound | Self::Validation(_) | Self::UploadRejected(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::DependencyUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Whether the response should hint at bearer re-authentication.
    #[must_use]
    pub fn hints_bearer(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::PrincipalBlocked
                | Self::TokenExpired
                | Self::TokenMalformed
                | Self::TokenInvalid
                | Self::InvalidToken
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "message": self.to_string() }));
        let mut response = (status, body).into_response();
        if self.hints_bearer() {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        error!("Database error: {err}");
        Self::DependencyUnavailable
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::TokenExpired,
            TokenError::Malformed => Self::TokenMalformed,
            TokenError::Invalid | TokenError::Creation => Self::TokenInvalid,
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            // Revoked and unknown tokens collapse to one caller-visible kind.
            SessionError::Revoked | SessionError::Unknown => Self::InvalidToken,
            SessionError::Backend(message) => {
                error!("Session store error: {message}");
                Self::DependencyUnavailable
            }
        }
    }
}

impl From<AuthFlowError> for ApiError {
    fn from(err: AuthFlowError) -> Self {
        match err {
            AuthFlowError::PrincipalNotFound => Self::PrincipalNotFound,
            AuthFlowError::InvalidCredentials => Self::InvalidCredentials,
            AuthFlowError::PrincipalBlocked => Self::PrincipalBlocked,
            AuthFlowError::InvalidToken => Self::InvalidToken,
            AuthFlowError::Dependency(message) => {
                error!("Auth dependency error: {message}");
                Self::DependencyUnavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(ApiError::PrincipalNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::PrincipalBlocked.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::PrincipalAlreadyExists.status(),
            StatusCode::CONFLICT
        );
        assert_eq!(ApiError::GroupNotFound.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotAuthorized.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::TokenExpired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::DependencyUnavailable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn bearer_hint_only_on_auth_failures() {
        assert!(ApiError::InvalidCredentials.hints_bearer());
        assert!(ApiError::TokenExpired.hints_bearer());
        assert!(ApiError::InvalidToken.hints_bearer());
        assert!(ApiError::PrincipalBlocked.hints_bearer());
        assert!(!ApiError::PrincipalNotFound.hints_bearer());
        assert!(!ApiError::NotAuthorized.hints_bearer());
        assert!(!ApiError::DependencyUnavailable.hints_bearer());
    }

    #[test]
    fn responses_carry_www_authenticate() {
        let response = ApiError::InvalidToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response
                .headers()
                .get(WWW_AUTHENTICATE)
                .and_then(|v| v.to_str().ok()),
            Some("Bearer")
        );

        let response = ApiError::PrincipalNotFound.into_response();
        assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn session_rejections_collapse_to_invalid_token() {
        assert!(matches!(
            ApiError::from(SessionError::Revoked),
            ApiError::InvalidToken
        ));
        assert!(matches!(
            ApiError::from(SessionError::Unknown),
            ApiError::InvalidToken
        ));
        assert!(matches!(
            ApiError::from(SessionError::Backend("timeout".to_string())),
            ApiError::DependencyUnavailable
        ));
    }

    #[test]
    fn decode_failures_stay_distinct() {
        assert!(matches!(
            ApiError::from(TokenError::Expired),
            ApiError::TokenExpired
        ));
        assert!(matches!(
            ApiError::from(TokenError::Malformed),
            ApiError::TokenMalformed
        ));
        assert!(matches!(
            ApiError::from(TokenError::Invalid),
            ApiError::TokenInvalid
        ));
    }
}
