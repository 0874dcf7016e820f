//! Authenticated self-service endpoints.
//!
//! Flow Overview:
//! 1) Authenticate via bearer token.
//! 2) Resolve the current user from the database.
//! 3) Apply allow-listed updates; role and blocked flag are not reachable
//!    from here.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use sqlx::PgPool;
use std::sync::Arc;

use super::auth::{
    principal::require_auth,
    storage,
    types::{SelfUpdateRequest, UserResponse},
    AuthState,
};
use super::{valid_email, valid_name, valid_phone, valid_username};
use crate::api::error::ApiError;

#[utoipa::path(
    get,
    path = "/user/me",
    responses(
        (status = 200, description = "The authenticated user", body = UserResponse),
        (status = 401, description = "Missing or invalid bearer token"),
    ),
    tag = "user"
)]
pub async fn get_me(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &pool, &auth_state).await?;
    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    patch,
    path = "/user/me",
    request_body = SelfUpdateRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid update payload"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 409, description = "Email, username, or phone number already taken"),
    ),
    tag = "user"
)]
pub async fn patch_me(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<SelfUpdateRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &pool, &auth_state).await?;

    let Some(Json(payload)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    let name = normalize_optional(payload.name);
    let surname = normalize_optional(payload.surname);
    let username = normalize_optional(payload.username);
    let email = normalize_optional(payload.email).map(|email| email.to_lowercase());
    let phone_number = normalize_optional(payload.phone_number);

    if name.is_none()
        && surname.is_none()
        && username.is_none()
        && email.is_none()
        && phone_number.is_none()
    {
        return Err(ApiError::Validation("No updates provided".to_string()));
    }

    validate_identity_fields(
        name.as_deref(),
        surname.as_deref(),
        username.as_deref(),
        email.as_deref(),
        phone_number.as_deref(),
    )?;

    let updated = storage::update_self(&pool, user.id, name, surname, username, email, phone_number)
        .await?
        .ok_or(ApiError::PrincipalNotFound)?;

    Ok(Json(UserResponse::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/user/me",
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Missing or invalid bearer token"),
    ),
    tag = "user"
)]
pub async fn delete_me(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &pool, &auth_state).await?;

    if storage::delete_user(&pool, user.id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::PrincipalNotFound)
    }
}

pub(super) fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub(super) fn validate_identity_fields(
    name: Option<&str>,
    surname: Option<&str>,
    username: Option<&str>,
    email: Option<&str>,
    phone_number: Option<&str>,
) -> Result<(), ApiError> {
    if let Some(name) = name {
        if !valid_name(name) {
            return Err(ApiError::Validation(
                "Name must be 1-100 characters".to_string(),
            ));
        }
    }
    if let Some(surname) = surname {
        if !valid_name(surname) {
            return Err(ApiError::Validation(
                "Surname must be 1-100 characters".to_string(),
            ));
        }
    }
    if let Some(username) = username {
        if !valid_username(username) {
            return Err(ApiError::Validation(
                "Username must be 3-100 characters".to_string(),
            ));
        }
    }
    if let Some(email) = email {
        if !valid_email(email) {
            return Err(ApiError::Validation("Invalid email".to_string()));
        }
    }
    if let Some(phone) = phone_number {
        if !valid_phone(phone) {
            return Err(ApiError::Validation(
                "Phone number must match +48XXXXXXXXX".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_optional_trims_and_drops_empty() {
        assert_eq!(
            normalize_optional(Some("  alice  ".to_string())),
            Some("alice".to_string())
        );
        assert_eq!(normalize_optional(Some("   ".to_string())), None);
        assert_eq!(normalize_optional(None), None);
    }

    #[test]
    fn identity_validation_checks_each_field() {
        assert!(validate_identity_fields(None, None, None, None, None).is_ok());
        assert!(
            validate_identity_fields(Some("A"), Some("B"), Some("abc"), Some("a@x.com"), None)
                .is_ok()
        );
        assert!(validate_identity_fields(Some(""), None, None, None, None).is_err());
        assert!(validate_identity_fields(None, None, Some("ab"), None, None).is_err());
        assert!(validate_identity_fields(None, None, None, Some("nope"), None).is_err());
        assert!(validate_identity_fields(None, None, None, None, Some("123")).is_err());
    }
}
