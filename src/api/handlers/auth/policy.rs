//! Role-scoped authorization decisions.
//!
//! Pure functions over principal data; handlers fetch the records, policy
//! only answers "may this actor act on that resource".

use uuid::Uuid;

use super::{storage::UserRecord, types::Role};

/// May `actor` read `target`'s record?
///
/// ADMIN: always. MODERATOR: same group only. USER: self only.
#[must_use]
pub fn can_view_user(actor: &UserRecord, target_id: Uuid, target_group: Option<i64>) -> bool {
    match actor.role {
        Role::Admin => true,
        // Two groupless users are not "the same group".
        Role::Moderator => actor.group_id.is_some() && actor.group_id == target_group,
        Role::User => actor.id == target_id,
    }
}

/// May `actor` edit an arbitrary target? Only admins; self-service updates go
/// through the narrower update-self operation instead.
#[must_use]
pub fn can_edit_user(actor: &UserRecord) -> bool {
    actor.role == Role::Admin
}

/// May `actor` list users? Listing additionally scopes moderators to their
/// own group.
#[must_use]
pub fn can_list_users(actor: &UserRecord) -> bool {
    matches!(actor.role, Role::Admin | Role::Moderator)
}

/// Closed set of sortable columns. Anything else silently falls back to the
/// default instead of reflecting over field names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    Id,
    Name,
    Surname,
    Username,
    Email,
    CreatedAt,
}

impl SortKey {
    /// Resolve a requested sort field; unknown or missing fields fall back
    /// to creation time without raising.
    #[must_use]
    pub fn parse(field: Option<&str>) -> Self {
        match field {
            Some("id") => Self::Id,
            Some("name") => Self::Name,
            Some("surname") => Self::Surname,
            Some("username") => Self::Username,
            Some("email") => Self::Email,
            _ => Self::CreatedAt,
        }
    }

    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Surname => "surname",
            Self::Username => "username",
            Self::Email => "email",
            Self::CreatedAt => "created_at",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn parse(order: Option<&str>) -> Self {
        match order {
            Some("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }

    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: Role, group_id: Option<i64>) -> UserRecord {
        let now = Utc::now();
        UserRecord {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            surname: "User".to_string(),
            username: "test".to_string(),
            email: "test@example.com".to_string(),
            phone_number: None,
            password_hash: "hash".to_string(),
            role,
            group_id,
            is_blocked: false,
            image_path: None,
            created_at: now,
            modified_at: now,
        }
    }

    #[test]
    fn admin_views_anyone() {
        let admin = user(Role::Admin, None);
        assert!(can_view_user(&admin, Uuid::new_v4(), Some(1)));
        assert!(can_view_user(&admin, Uuid::new_v4(), None));
    }

    #[test]
    fn moderator_views_own_group_only() {
        let moderator = user(Role::Moderator, Some(1));
        assert!(can_view_user(&moderator, Uuid::new_v4(), Some(1)));
        assert!(!can_view_user(&moderator, Uuid::new_v4(), Some(2)));
        assert!(!can_view_user(&moderator, Uuid::new_v4(), None));
    }

    #[test]
    fn groupless_moderator_matches_nobody() {
        let moderator = user(Role::Moderator, None);
        assert!(!can_view_user(&moderator, Uuid::new_v4(), None));
        assert!(!can_view_user(&moderator, Uuid::new_v4(), Some(1)));
    }

    #[test]
    fn plain_user_views_only_self() {
        let actor = user(Role::User, Some(1));
        assert!(can_view_user(&actor, actor.id, Some(1)));
        assert!(!can_view_user(&actor, Uuid::new_v4(), Some(1)));
    }

    #[test]
    fn only_admin_edits_arbitrary_targets() {
        assert!(can_edit_user(&user(Role::Admin, None)));
        assert!(!can_edit_user(&user(Role::Moderator, Some(1))));
        assert!(!can_edit_user(&user(Role::User, None)));
    }

    #[test]
    fn listing_is_admin_and_moderator_only() {
        assert!(can_list_users(&user(Role::Admin, None)));
        assert!(can_list_users(&user(Role::Moderator, Some(1))));
        assert!(!can_list_users(&user(Role::User, None)));
    }

    #[test]
    fn unknown_sort_fields_fall_back_silently() {
        assert_eq!(SortKey::parse(None), SortKey::CreatedAt);
        assert_eq!(SortKey::parse(Some("created_at")), SortKey::CreatedAt);
        assert_eq!(SortKey::parse(Some("password")), SortKey::CreatedAt);
        assert_eq!(SortKey::parse(Some("no_such_field")), SortKey::CreatedAt);
        assert_eq!(SortKey::parse(Some("surname")), SortKey::Surname);
    }

    #[test]
    fn sort_order_defaults_to_ascending() {
        assert_eq!(SortOrder::parse(None), SortOrder::Asc);
        assert_eq!(SortOrder::parse(Some("asc")), SortOrder::Asc);
        assert_eq!(SortOrder::parse(Some("desc")), SortOrder::Desc);
        assert_eq!(SortOrder::parse(Some("sideways")), SortOrder::Asc);
    }
}
