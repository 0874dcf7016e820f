//! Auth module tests.

use axum::http::header::WWW_AUTHENTICATE;
use axum::response::IntoResponse;

use super::{with_bearer_hint, RESET_RESPONSE};
use crate::api::error::ApiError;

#[test]
fn refresh_failures_always_hint_bearer() {
    // Even taxonomy errors without an intrinsic hint gain one on the
    // refresh path.
    let response = with_bearer_hint(ApiError::PrincipalNotFound.into_response());
    assert_eq!(
        response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok()),
        Some("Bearer")
    );
}

#[test]
fn bearer_hint_does_not_duplicate() {
    let response = with_bearer_hint(ApiError::InvalidToken.into_response());
    let values: Vec<_> = response.headers().get_all(WWW_AUTHENTICATE).iter().collect();
    assert_eq!(values.len(), 1);
}

#[test]
fn reset_response_never_discloses_existence() {
    // One constant serves both the registered and unregistered branches, so
    // the bodies are byte-identical by construction.
    assert!(RESET_RESPONSE.contains("If your email is registered"));
}
