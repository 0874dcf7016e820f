//! Authentication handlers and supporting modules.
//!
//! Signup, login, token refresh, and password-reset requests. Login accepts
//! email, username, or phone number. Refresh tokens are opaque and
//! single-use; rotation blacklists the old token for a grace window so a
//! replayed token is rejected rather than silently honored.

pub mod password;
pub mod policy;
pub mod principal;
pub mod service;
pub mod sessions;
mod state;
pub mod storage;
pub mod tokens;
pub mod types;

pub use state::{AuthConfig, AuthState};

use axum::{
    extract::Extension,
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use self::service::AuthService;
use self::storage::NewUser;
use self::types::{
    GenericMessage, LoginRequest, RefreshRequest, ResetPasswordRequest, SignupRequest,
    UserResponse,
};
use super::{valid_email, valid_name, valid_password, valid_phone, valid_username};
use crate::api::error::ApiError;

/// Fixed reset-password reply: identical whether or not the email exists.
const RESET_RESPONSE: &str =
    "If your email is registered, you will receive a password reset link";

#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid payload or unknown group"),
        (status = 409, description = "Email, username, or phone number already taken"),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, payload))]
pub async fn signup(
    pool: Extension<PgPool>,
    payload: Option<Json<SignupRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(payload)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    let email = payload.email.trim().to_lowercase();
    let username = payload.username.trim().to_string();

    if !valid_name(payload.name.trim()) || !valid_name(payload.surname.trim()) {
        return Err(ApiError::Validation(
            "Name and surname must be 1-100 characters".to_string(),
        ));
    }
    if !valid_username(&username) {
        return Err(ApiError::Validation(
            "Username must be 3-100 characters".to_string(),
        ));
    }
    if !valid_email(&email) {
        return Err(ApiError::Validation("Invalid email".to_string()));
    }
    if let Some(phone) = payload.phone_number.as_deref() {
        if !valid_phone(phone) {
            return Err(ApiError::Validation(
                "Phone number must match +48XXXXXXXXX".to_string(),
            ));
        }
    }
    if !valid_password(&payload.password) {
        return Err(ApiError::Validation(
            "Password must be 8-128 characters".to_string(),
        ));
    }

    let password_hash = password::hash(&payload.password).map_err(|err| {
        tracing::error!("Password hashing failed: {err}");
        ApiError::DependencyUnavailable
    })?;

    let record = storage::insert_user(
        &pool,
        NewUser {
            id: Uuid::new_v4(),
            name: payload.name.trim().to_string(),
            surname: payload.surname.trim().to_string(),
            username,
            email,
            phone_number: payload.phone_number,
            password_hash,
            group_id: payload.group_id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(record))))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = types::TokenEnvelope),
        (status = 401, description = "Incorrect login or password"),
        (status = 403, description = "User is blocked"),
        (status = 404, description = "No user matches the login"),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, auth_state, payload))]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(payload)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    if payload.login.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Login and password are required".to_string(),
        ));
    }

    let service = AuthService::new(&pool, &auth_state);
    let envelope = service
        .authenticate(payload.login.trim(), &payload.password)
        .await?;

    Ok(Json(envelope))
}

#[utoipa::path(
    post,
    path = "/auth/refresh-token",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair", body = types::TokenEnvelope),
        (status = 401, description = "Invalid or expired refresh token"),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, auth_state, payload))]
pub async fn refresh_token(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RefreshRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return with_bearer_hint(
            ApiError::Validation("Missing payload".to_string()).into_response(),
        );
    };

    let service = AuthService::new(&pool, &auth_state);
    match service.refresh(payload.refresh_token.trim()).await {
        Ok(envelope) => Json(envelope).into_response(),
        // Every refresh failure hints at bearer re-authentication.
        Err(err) => with_bearer_hint(ApiError::from(err).into_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Generic acknowledgement", body = GenericMessage),
        (status = 400, description = "Invalid email format"),
        (status = 503, description = "Notification dispatch failed"),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, auth_state, payload))]
pub async fn reset_password(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(payload)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    let email = payload.email.trim().to_lowercase();
    if !valid_email(&email) {
        return Err(ApiError::Validation("Invalid email".to_string()));
    }

    let service = AuthService::new(&pool, &auth_state);
    service.request_password_reset(&email).await?;

    Ok(Json(GenericMessage {
        message: RESET_RESPONSE.to_string(),
    }))
}

fn with_bearer_hint(mut response: Response) -> Response {
    response
        .headers_mut()
        .entry(WWW_AUTHENTICATE)
        .or_insert(HeaderValue::from_static("Bearer"));
    response
}

#[cfg(test)]
mod tests;
