//! Bearer authentication: resolve `Authorization: Bearer <access_token>`
//! into the current user record.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use sqlx::PgPool;

use super::{state::AuthState, storage, storage::UserRecord};
use crate::api::error::ApiError;

/// Authenticate the request or fail with the matching taxonomy error.
///
/// # Errors
/// [`ApiError::TokenInvalid`]/[`ApiError::TokenExpired`]/
/// [`ApiError::TokenMalformed`] for header or token problems,
/// [`ApiError::PrincipalNotFound`] when the subject no longer exists, and
/// [`ApiError::PrincipalBlocked`] for blocked users.
pub async fn require_auth(
    headers: &HeaderMap,
    pool: &PgPool,
    state: &AuthState,
) -> Result<UserRecord, ApiError> {
    let token = extract_bearer_token(headers).ok_or(ApiError::TokenInvalid)?;
    let claims = state.tokens().decode(&token)?;

    let user = storage::find_by_username(pool, &claims.sub)
        .await
        .map_err(ApiError::from)?
        .ok_or(ApiError::PrincipalNotFound)?;

    if user.is_blocked {
        return Err(ApiError::PrincipalBlocked);
    }

    Ok(user)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(
            extract_bearer_token(&headers),
            Some("abc.def.ghi".to_string())
        );
    }

    #[test]
    fn accepts_lower_case_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer token "));
        assert_eq!(extract_bearer_token(&headers), Some("token".to_string()));
    }

    #[test]
    fn rejects_missing_or_foreign_schemes() {
        let headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(extract_bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);
    }
}
