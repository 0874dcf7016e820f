//! Shared auth and user DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use super::storage::UserRecord;

/// Role hierarchy; `USER` is the default on signup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Moderator => "MODERATOR",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct RoleParseError(String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "USER" => Ok(Self::User),
            "MODERATOR" => Ok(Self::Moderator),
            "ADMIN" => Ok(Self::Admin),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

/// Bearer token envelope returned by login and refresh.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenEnvelope {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

impl TokenEnvelope {
    #[must_use]
    pub fn new(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password: String,
    pub group_id: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Email, username, or phone number.
    pub login: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GenericMessage {
    pub message: String,
}

/// Self-service update. Deliberately narrower than the admin update: there is
/// no way to express `role`, `is_blocked`, or `group_id` here, and unknown
/// fields are rejected.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SelfUpdateRequest {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

/// Admin-initiated update of an arbitrary user.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AdminUpdateRequest {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub role: Option<Role>,
    pub is_blocked: Option<bool>,
    pub group_id: Option<i64>,
}

impl AdminUpdateRequest {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.surname.is_none()
            && self.username.is_none()
            && self.email.is_none()
            && self.phone_number.is_none()
            && self.role.is_none()
            && self.is_blocked.is_none()
            && self.group_id.is_none()
    }
}

/// Public view of a user; the password hash never leaves the service.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub role: Role,
    pub is_blocked: bool,
    pub group_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl From<UserRecord> for UserResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            surname: record.surname,
            username: record.username,
            email: record.email,
            phone_number: record.phone_number,
            role: record.role,
            is_blocked: record.is_blocked,
            group_id: record.group_id,
            created_at: record.created_at,
            modified_at: record.modified_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::User, Role::Moderator, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().ok(), Some(role));
        }
        assert!("owner".parse::<Role>().is_err());
        assert!("user".parse::<Role>().is_err(), "roles are upper-case only");
    }

    #[test]
    fn role_serde_uses_upper_case() {
        let json = serde_json::to_string(&Role::Moderator).expect("serialize");
        assert_eq!(json, "\"MODERATOR\"");
        let parsed: Role = serde_json::from_str("\"ADMIN\"").expect("deserialize");
        assert_eq!(parsed, Role::Admin);
    }

    #[test]
    fn token_envelope_is_bearer() {
        let envelope = TokenEnvelope::new("a".to_string(), "r".to_string());
        assert_eq!(envelope.token_type, "bearer");
    }

    #[test]
    fn self_update_rejects_role_field() {
        let result =
            serde_json::from_str::<SelfUpdateRequest>(r#"{"name":"A","role":"ADMIN"}"#);
        assert!(result.is_err());

        let result = serde_json::from_str::<SelfUpdateRequest>(r#"{"is_blocked":false}"#);
        assert!(result.is_err());
    }

    #[test]
    fn admin_update_accepts_role_and_block() {
        let update: AdminUpdateRequest =
            serde_json::from_str(r#"{"role":"MODERATOR","is_blocked":true}"#).expect("parse");
        assert_eq!(update.role, Some(Role::Moderator));
        assert_eq!(update.is_blocked, Some(true));
        assert!(!update.is_empty());
        assert!(AdminUpdateRequest::default().is_empty());
    }
}
