//! Address domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

/// Maximum number of saved addresses per user
pub const MAX_ADDRESSES_PER_USER: u64 = 10;

/// Unique identifier for an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressId(pub Uuid);

impl From<Uuid> for AddressId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AddressId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A saved pickup or delivery address
#[derive(Debug, Clone, Serialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub label: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Address fields supplied by the user
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressInput {
    pub label: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "IN".to_string()
}

impl AddressInput {
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("label", &self.label),
            ("line1", &self.line1),
            ("city", &self.city),
            ("region", &self.region),
            ("postal_code", &self.postal_code),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{} is required", field));
            }
        }
        if self.postal_code.len() > 12 {
            return Err("postal_code is too long".to_string());
        }
        Ok(())
    }
}

/// Data needed to insert an address
#[derive(Debug, Clone)]
pub struct NewAddress {
    pub user_id: UserId,
    pub input: AddressInput,
    pub is_default: bool,
}
