//! Profile-image object-store boundary.
//!
//! Storage mechanics live behind [`ImageStore`]; this module owns the rules
//! every implementation must respect: the content-type allowlist, the size
//! cap, and the deterministic object key layout.

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::error::ApiError;

/// Accepted profile-image content types.
pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];

/// Profile images are capped at 5 MB.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MediaError {
    #[error("unsupported image content type")]
    UnsupportedType,

    #[error("image exceeds the 5MB size limit")]
    TooLarge,
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::UnsupportedType => Self::UploadRejected("Unsupported image content type"),
            MediaError::TooLarge => Self::UploadRejected("Image exceeds the 5MB size limit"),
        }
    }
}

/// Validate an upload before it crosses the store boundary.
///
/// # Errors
/// [`MediaError::UnsupportedType`] for content types outside the allowlist,
/// [`MediaError::TooLarge`] past the size cap.
pub fn validate_image(content_type: &str, size_bytes: u64) -> Result<(), MediaError> {
    if !ALLOWED_IMAGE_TYPES.contains(&content_type) {
        return Err(MediaError::UnsupportedType);
    }
    if size_bytes > MAX_IMAGE_BYTES {
        return Err(MediaError::TooLarge);
    }
    Ok(())
}

/// Object key for a user's profile image, e.g.
/// `user-images/<user_id>/profile.png`.
#[must_use]
pub fn image_object_key(user_id: Uuid, content_type: &str) -> String {
    let extension = content_type.rsplit('/').next().unwrap_or("bin");
    format!("user-images/{user_id}/profile.{extension}")
}

/// Contract for the profile-image collaborator.
///
/// Implementations are expected to call [`validate_image`] before `upload`
/// and to treat keys from [`image_object_key`] as opaque.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store image bytes under `key` and return the stored path.
    async fn upload(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> Result<String>;

    /// Produce a time-limited download URL for a stored image.
    async fn presigned_url(&self, key: &str, expires_in_seconds: u64) -> Result<String>;

    /// Remove a stored image; removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowlist_is_enforced() {
        assert!(validate_image("image/jpeg", 1024).is_ok());
        assert!(validate_image("image/png", 1024).is_ok());
        assert!(validate_image("image/gif", 1024).is_ok());
        assert_eq!(
            validate_image("image/webp", 1024),
            Err(MediaError::UnsupportedType)
        );
        assert_eq!(
            validate_image("application/pdf", 1024),
            Err(MediaError::UnsupportedType)
        );
    }

    #[test]
    fn size_cap_is_exact() {
        assert!(validate_image("image/png", MAX_IMAGE_BYTES).is_ok());
        assert_eq!(
            validate_image("image/png", MAX_IMAGE_BYTES + 1),
            Err(MediaError::TooLarge)
        );
    }

    #[test]
    fn object_keys_are_deterministic() {
        let user_id = Uuid::nil();
        assert_eq!(
            image_object_key(user_id, "image/png"),
            format!("user-images/{user_id}/profile.png")
        );
        assert_eq!(
            image_object_key(user_id, "image/jpeg"),
            format!("user-images/{user_id}/profile.jpeg")
        );
    }

    #[test]
    fn media_errors_map_to_upload_rejected() {
        assert!(matches!(
            ApiError::from(MediaError::TooLarge),
            ApiError::UploadRejected(_)
        ));
        assert!(matches!(
            ApiError::from(MediaError::UnsupportedType),
            ApiError::UploadRejected(_)
        ));
    }
}
