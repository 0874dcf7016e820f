//! Role-based user management endpoints.
//!
//! Flow Overview:
//! 1) Authenticate the request via bearer token.
//! 2) Enforce the role policy for the requested operation.
//! 3) Perform the read, allow-listed update, or scoped listing.

use axum::{
    extract::{Extension, Path, Query},
    http::HeaderMap,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

use super::auth::{
    policy::{self, SortKey, SortOrder},
    principal::require_auth,
    storage::{self, ListParams},
    types::{AdminUpdateRequest, Role, UserResponse},
    AuthState,
};
use super::me::{normalize_optional, validate_identity_fields};
use crate::api::error::ApiError;

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIMIT: u32 = 30;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListQuery {
    /// Page number, starting at 1.
    pub page: Option<u32>,
    /// Items per page, 1..=100.
    pub limit: Option<u32>,
    /// Case-insensitive substring match on name or surname.
    pub filter_by_name: Option<String>,
    /// Sort field; unknown fields silently fall back to `created_at`.
    pub sort_by: Option<String>,
    /// `asc` (default) or `desc`.
    pub order_by: Option<String>,
}

#[utoipa::path(
    get,
    path = "/user/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User record", body = UserResponse),
        (status = 400, description = "Invalid user id"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Actor may not view this user"),
        (status = 404, description = "User not found"),
    ),
    tag = "user"
)]
pub async fn get_user(
    Path(id): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = require_auth(&headers, &pool, &auth_state).await?;

    let user_id = Uuid::parse_str(id.trim())
        .map_err(|_| ApiError::Validation("Invalid user id".to_string()))?;

    let target = storage::find_by_id(&pool, user_id)
        .await?
        .ok_or(ApiError::PrincipalNotFound)?;

    if !policy::can_view_user(&actor, target.id, target.group_id) {
        return Err(ApiError::NotAuthorized);
    }

    Ok(Json(UserResponse::from(target)))
}

#[utoipa::path(
    patch,
    path = "/user/{id}",
    params(("id" = String, Path, description = "User id")),
    request_body = AdminUpdateRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid payload or unknown group"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email, username, or phone number already taken"),
    ),
    tag = "user"
)]
pub async fn patch_user(
    Path(id): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<AdminUpdateRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = require_auth(&headers, &pool, &auth_state).await?;

    if !policy::can_edit_user(&actor) {
        return Err(ApiError::NotAuthorized);
    }

    let user_id = Uuid::parse_str(id.trim())
        .map_err(|_| ApiError::Validation("Invalid user id".to_string()))?;

    let Some(Json(payload)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };
    if payload.is_empty() {
        return Err(ApiError::Validation("No updates provided".to_string()));
    }

    let update = AdminUpdateRequest {
        name: normalize_optional(payload.name),
        surname: normalize_optional(payload.surname),
        username: normalize_optional(payload.username),
        email: normalize_optional(payload.email).map(|email| email.to_lowercase()),
        phone_number: normalize_optional(payload.phone_number),
        role: payload.role,
        is_blocked: payload.is_blocked,
        group_id: payload.group_id,
    };

    validate_identity_fields(
        update.name.as_deref(),
        update.surname.as_deref(),
        update.username.as_deref(),
        update.email.as_deref(),
        update.phone_number.as_deref(),
    )?;

    let updated = storage::update_user_admin(&pool, user_id, update)
        .await?
        .ok_or(ApiError::PrincipalNotFound)?;

    Ok(Json(UserResponse::from(updated)))
}

#[utoipa::path(
    get,
    path = "/users",
    params(ListQuery),
    responses(
        (status = 200, description = "Users visible to the actor", body = [UserResponse]),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Admin or moderator role required"),
    ),
    tag = "users"
)]
pub async fn list_users(
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = require_auth(&headers, &pool, &auth_state).await?;

    if !policy::can_list_users(&actor) {
        return Err(ApiError::NotAuthorized);
    }

    let group_scope = match actor.role {
        Role::Admin => None,
        Role::Moderator => match actor.group_id {
            Some(group_id) => Some(group_id),
            // A moderator without a group has nothing to moderate.
            None => return Ok(Json(Vec::<UserResponse>::new())),
        },
        Role::User => return Err(ApiError::NotAuthorized),
    };

    let records = storage::list_users(
        &pool,
        ListParams {
            group_scope,
            filter_by_name: query.filter_by_name,
            sort: SortKey::parse(query.sort_by.as_deref()),
            order: SortOrder::parse(query.order_by.as_deref()),
            page: query.page.unwrap_or(DEFAULT_PAGE),
            limit: query.limit.unwrap_or(DEFAULT_LIMIT),
        },
    )
    .await?;

    let users: Vec<UserResponse> = records.into_iter().map(UserResponse::from).collect();
    Ok(Json(users))
}
