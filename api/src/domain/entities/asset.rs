//! Uploaded asset keys
//!
//! Objects live under `<prefix>/<owner id>/<uuid>.<ext>`. Ownership of a key
//! is checked by prefix before it can be attached to any entity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

/// What an upload will be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetPurpose {
    Product,
    Avatar,
    Verification,
    Message,
}

impl AssetPurpose {
    pub fn prefix(&self) -> &'static str {
        match self {
            AssetPurpose::Product => "products",
            AssetPurpose::Avatar => "avatars",
            AssetPurpose::Verification => "verification",
            AssetPurpose::Message => "messages",
        }
    }

    /// File extension for an accepted content type
    pub fn extension_for(&self, content_type: &str) -> Option<&'static str> {
        let ext = match content_type.to_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/png" => "png",
            "image/webp" => "webp",
            "application/pdf" if *self == AssetPurpose::Verification => "pdf",
            _ => return None,
        };
        Some(ext)
    }

    /// Build a fresh object key for this purpose and owner
    pub fn new_key(&self, owner: &UserId, ext: &str) -> String {
        format!("{}/{}/{}.{}", self.prefix(), owner, Uuid::new_v4(), ext)
    }

    /// Whether `key` was issued for this purpose to `owner`
    pub fn is_owned_by(&self, key: &str, owner: &UserId) -> bool {
        let expected = format!("{}/{}/", self.prefix(), owner);
        key.starts_with(&expected)
            && key.len() > expected.len()
            && !key.contains("..")
            && !key[expected.len()..].contains('/')
    }
}

impl std::fmt::Display for AssetPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

impl std::str::FromStr for AssetPurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "product" | "products" => Ok(AssetPurpose::Product),
            "avatar" | "avatars" => Ok(AssetPurpose::Avatar),
            "verification" => Ok(AssetPurpose::Verification),
            "message" | "messages" => Ok(AssetPurpose::Message),
            _ => Err(format!("Unknown upload purpose: {}", s)),
        }
    }
}

/// Check that every key belongs to `owner` under `purpose`
pub fn validate_owned_keys(
    purpose: AssetPurpose,
    owner: &UserId,
    keys: &[String],
) -> Result<(), String> {
    match keys.iter().find(|k| !purpose.is_owned_by(k, owner)) {
        Some(bad) => Err(format!("key '{}' is not one of your {} uploads", bad, purpose)),
        None => Ok(()),
    }
}
