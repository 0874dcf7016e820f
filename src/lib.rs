//! # Custos (User Management & Authentication)
//!
//! `custos` is a user-management service: signup, login, token refresh,
//! profile CRUD, role-based access control, and password-reset notification
//! dispatch.
//!
//! ## Identity & Sessions
//!
//! Durable identity lives in PostgreSQL; ephemeral session state lives in
//! Redis. Login verifies an Argon2id password hash and issues a signed
//! short-lived access token (JWT) plus an opaque single-use refresh token.
//! Refresh rotates the opaque token: the old mapping is deleted and a
//! short-TTL blacklist marker rejects replay within a grace window.
//!
//! - **Fail closed:** a session-store timeout or error never validates a
//!   token.
//! - **Rotation:** a refresh token that is neither mapped nor blacklisted is
//!   rejected, which also covers a crash between the delete and the
//!   blacklist write.
//!
//! ## Authorization
//!
//! Roles are `USER`, `MODERATOR`, `ADMIN`. Admins see and edit everyone;
//! moderators see users in their own group; users see only themselves.
//! Self-service updates are a narrower operation than admin edits and cannot
//! change `role` or `is_blocked`.
//!
//! ## Password Reset
//!
//! `POST /auth/reset-password` answers identically whether or not the email
//! exists. Matching requests enqueue a reset message in a transactional
//! outbox drained by a background worker with bounded, backed-off retries.

pub mod api;
pub mod cli;

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
