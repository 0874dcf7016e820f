//! User directory: SQL over the shared pool.
//!
//! Uniqueness of email, username, and phone number is enforced by database
//! constraints; violations surface as [`StorageError::Conflict`] regardless
//! of which request won the race.

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use thiserror::Error;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use super::policy::{SortKey, SortOrder};
use super::types::{AdminUpdateRequest, Role};
use crate::api::error::ApiError;

const USER_COLUMNS: &str = "id, name, surname, username, email, phone_number, password, role, \
     group_id, is_blocked, image_path, created_at, modified_at";

#[derive(Clone, Debug)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub group_id: Option<i64>,
    pub is_blocked: bool,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Fields for a new user row; the id is generated by the caller so the
/// record can be referenced before the insert commits.
#[derive(Debug)]
pub struct NewUser {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password_hash: String,
    pub group_id: Option<i64>,
}

#[derive(Debug, Error)]
pub enum StorageError {
    /// Unique constraint violation on email, username, or phone number.
    #[error("user already exists")]
    Conflict,

    #[error("referenced group does not exist")]
    GroupMissing,

    #[error("corrupt user record: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict => Self::PrincipalAlreadyExists,
            StorageError::GroupMissing => Self::GroupNotFound,
            StorageError::Corrupt(message) => {
                tracing::error!("Storage corruption: {message}");
                Self::DependencyUnavailable
            }
            StorageError::Db(db) => Self::from(db),
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn map_user_row(row: &PgRow) -> Result<UserRecord, StorageError> {
    let role: String = row.try_get("role").map_err(StorageError::Db)?;
    let role = role
        .parse::<Role>()
        .map_err(|err| StorageError::Corrupt(err.to_string()))?;

    Ok(UserRecord {
        id: row.try_get("id").map_err(StorageError::Db)?,
        name: row.try_get("name").map_err(StorageError::Db)?,
        surname: row.try_get("surname").map_err(StorageError::Db)?,
        username: row.try_get("username").map_err(StorageError::Db)?,
        email: row.try_get("email").map_err(StorageError::Db)?,
        phone_number: row.try_get("phone_number").map_err(StorageError::Db)?,
        password_hash: row.try_get("password").map_err(StorageError::Db)?,
        role,
        group_id: row.try_get("group_id").map_err(StorageError::Db)?,
        is_blocked: row.try_get("is_blocked").map_err(StorageError::Db)?,
        image_path: row.try_get("image_path").map_err(StorageError::Db)?,
        created_at: row.try_get("created_at").map_err(StorageError::Db)?,
        modified_at: row.try_get("modified_at").map_err(StorageError::Db)?,
    })
}

/// # Errors
/// [`StorageError::GroupMissing`] if `group_id` points nowhere,
/// [`StorageError::Conflict`] on a uniqueness collision.
pub async fn insert_user(pool: &PgPool, new_user: NewUser) -> Result<UserRecord, StorageError> {
    if let Some(group_id) = new_user.group_id {
        if !group_exists(pool, group_id).await? {
            return Err(StorageError::GroupMissing);
        }
    }

    let query = format!(
        "INSERT INTO users (id, name, surname, username, email, phone_number, password, group_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING {USER_COLUMNS}"
    );
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(new_user.id)
        .bind(&new_user.name)
        .bind(&new_user.surname)
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.phone_number)
        .bind(&new_user.password_hash)
        .bind(new_user.group_id)
        .fetch_one(pool)
        .instrument(span)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                StorageError::Conflict
            } else {
                StorageError::Db(err)
            }
        })?;

    map_user_row(&row)
}

/// Look up a user by email, username, or phone number in one query.
///
/// # Errors
/// Returns [`StorageError::Db`] on database failure.
pub async fn find_by_login(pool: &PgPool, login: &str) -> Result<Option<UserRecord>, StorageError> {
    let query = format!(
        "SELECT {USER_COLUMNS} FROM users \
         WHERE email = $1 OR username = $1 OR phone_number = $1"
    );
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(login)
        .fetch_optional(pool)
        .instrument(span)
        .await?;
    row.as_ref().map(map_user_row).transpose()
}

/// # Errors
/// Returns [`StorageError::Db`] on database failure.
pub async fn find_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<UserRecord>, StorageError> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let row = sqlx::query(&query).bind(user_id).fetch_optional(pool).await?;
    row.as_ref().map(map_user_row).transpose()
}

/// # Errors
/// Returns [`StorageError::Db`] on database failure.
pub async fn find_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<UserRecord>, StorageError> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
    let row = sqlx::query(&query)
        .bind(username)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(map_user_row).transpose()
}

/// # Errors
/// Returns [`StorageError::Db`] on database failure.
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRecord>, StorageError> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    let row = sqlx::query(&query).bind(email).fetch_optional(pool).await?;
    row.as_ref().map(map_user_row).transpose()
}

/// # Errors
/// Returns [`StorageError::Db`] on database failure.
pub async fn group_exists(pool: &PgPool, group_id: i64) -> Result<bool, StorageError> {
    let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM groups WHERE id = $1) AS present")
        .bind(group_id)
        .fetch_one(pool)
        .await?;
    Ok(row.try_get("present")?)
}

/// Allow-listed self-service update; identity fields only.
///
/// # Errors
/// [`StorageError::Conflict`] on a uniqueness collision.
pub async fn update_self(
    pool: &PgPool,
    user_id: Uuid,
    name: Option<String>,
    surname: Option<String>,
    username: Option<String>,
    email: Option<String>,
    phone_number: Option<String>,
) -> Result<Option<UserRecord>, StorageError> {
    let query = format!(
        "UPDATE users SET \
             name = COALESCE($1, name), \
             surname = COALESCE($2, surname), \
             username = COALESCE($3, username), \
             email = COALESCE($4, email), \
             phone_number = COALESCE($5, phone_number), \
             modified_at = now() \
         WHERE id = $6 \
         RETURNING {USER_COLUMNS}"
    );
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(name)
        .bind(surname)
        .bind(username)
        .bind(email)
        .bind(phone_number)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                StorageError::Conflict
            } else {
                StorageError::Db(err)
            }
        })?;
    row.as_ref().map(map_user_row).transpose()
}

/// Admin-initiated update; may also change role, blocked flag, and group.
///
/// # Errors
/// [`StorageError::GroupMissing`] if a new group does not exist,
/// [`StorageError::Conflict`] on a uniqueness collision.
pub async fn update_user_admin(
    pool: &PgPool,
    user_id: Uuid,
    update: AdminUpdateRequest,
) -> Result<Option<UserRecord>, StorageError> {
    if let Some(group_id) = update.group_id {
        if !group_exists(pool, group_id).await? {
            return Err(StorageError::GroupMissing);
        }
    }

    let query = format!(
        "UPDATE users SET \
             name = COALESCE($1, name), \
             surname = COALESCE($2, surname), \
             username = COALESCE($3, username), \
             email = COALESCE($4, email), \
             phone_number = COALESCE($5, phone_number), \
             role = COALESCE($6, role), \
             is_blocked = COALESCE($7, is_blocked), \
             group_id = COALESCE($8, group_id), \
             modified_at = now() \
         WHERE id = $9 \
         RETURNING {USER_COLUMNS}"
    );
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(update.name)
        .bind(update.surname)
        .bind(update.username)
        .bind(update.email)
        .bind(update.phone_number)
        .bind(update.role.map(|role| role.as_str().to_string()))
        .bind(update.is_blocked)
        .bind(update.group_id)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                StorageError::Conflict
            } else {
                StorageError::Db(err)
            }
        })?;
    row.as_ref().map(map_user_row).transpose()
}

/// # Errors
/// Returns [`StorageError::Db`] on database failure.
pub async fn delete_user(pool: &PgPool, user_id: Uuid) -> Result<bool, StorageError> {
    let query = "DELETE FROM users WHERE id = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(user_id)
        .execute(pool)
        .instrument(span)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[derive(Debug)]
pub struct ListParams {
    /// `Some(group_id)` scopes results to one group (moderator listing).
    pub group_scope: Option<i64>,
    /// Case-insensitive substring match on name or surname.
    pub filter_by_name: Option<String>,
    pub sort: SortKey,
    pub order: SortOrder,
    pub page: u32,
    pub limit: u32,
}

/// Compose the listing statement. The ORDER BY column comes from the closed
/// [`SortKey`] enum, never from user input.
fn list_sql(sort: SortKey, order: SortOrder) -> String {
    format!(
        "SELECT {USER_COLUMNS} FROM users \
         WHERE ($1::bigint IS NULL OR group_id = $1) \
           AND ($2::text IS NULL OR name ILIKE $2 OR surname ILIKE $2) \
         ORDER BY {} {} \
         LIMIT $3 OFFSET $4",
        sort.column(),
        order.sql()
    )
}

/// Filtered, sorted, paginated listing.
///
/// # Errors
/// Returns [`StorageError::Db`] on database failure.
pub async fn list_users(pool: &PgPool, params: ListParams) -> Result<Vec<UserRecord>, StorageError> {
    let page = params.page.max(1);
    let limit = i64::from(params.limit.clamp(1, 100));
    let offset = i64::from(page - 1) * limit;
    let pattern = params.filter_by_name.map(|name| format!("%{name}%"));

    let query = list_sql(params.sort, params.order);
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = %query
    );
    let rows = sqlx::query(&query)
        .bind(params.group_scope)
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .instrument(span)
        .await?;

    rows.iter().map(map_user_row).collect()
}
