//! API handlers and shared validation.
//!
//! This module organizes the service's route handlers and provides the
//! input-validation helpers used before anything touches a store.

pub mod auth;
pub mod health;
pub mod me;
pub mod root;
pub mod users;

use regex::Regex;

/// Lightweight email sanity check used before persisting data.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Phone numbers use the fixed regional format: `+48` and nine digits.
#[must_use]
pub fn valid_phone(phone: &str) -> bool {
    Regex::new(r"^\+48\d{9}$").is_ok_and(|re| re.is_match(phone))
}

/// Plaintext password length bounds; strength beyond length is not policed.
#[must_use]
pub fn valid_password(password: &str) -> bool {
    (8..=128).contains(&password.chars().count())
}

#[must_use]
pub fn valid_username(username: &str) -> bool {
    (3..=100).contains(&username.chars().count())
}

/// Names and surnames are 1..=100 characters.
#[must_use]
pub fn valid_name(name: &str) -> bool {
    (1..=100).contains(&name.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
    }

    #[test]
    fn valid_phone_is_regional() {
        assert!(valid_phone("+48111111111"));
        assert!(!valid_phone("+4811111111"), "too short");
        assert!(!valid_phone("+481111111111"), "too long");
        assert!(!valid_phone("+49111111111"), "wrong prefix");
        assert!(!valid_phone("48111111111"), "missing plus");
        assert!(!valid_phone("+48 111 111 111"), "no separators allowed");
    }

    #[test]
    fn password_bounds() {
        assert!(valid_password("12345678"));
        assert!(!valid_password("1234567"));
        assert!(valid_password(&"x".repeat(128)));
        assert!(!valid_password(&"x".repeat(129)));
    }

    #[test]
    fn username_and_name_bounds() {
        assert!(valid_username("abc"));
        assert!(!valid_username("ab"));
        assert!(!valid_username(&"u".repeat(101)));
        assert!(valid_name("A"));
        assert!(!valid_name(""));
        assert!(!valid_name(&"n".repeat(101)));
    }
}
