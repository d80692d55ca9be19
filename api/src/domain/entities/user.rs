//! User domain entity
//!
//! Represents a marketplace account: a farmer who lists produce, a buyer who
//! makes offers, or an admin who moderates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Farmer,
    Buyer,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Farmer, Role::Buyer, Role::Admin];

    /// Roles a user may pick for themselves at registration
    pub fn is_self_assignable(&self) -> bool {
        matches!(self, Role::Farmer | Role::Buyer)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Farmer => write!(f, "farmer"),
            Role::Buyer => write!(f, "buyer"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "farmer" => Ok(Role::Farmer),
            "buyer" => Ok(Role::Buyer),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// A marketplace account
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub phone: Option<String>,
    pub full_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_verified: bool,
    pub is_banned: bool,
    /// S3 key of the avatar image
    pub avatar_key: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    /// Device token for push notifications
    #[serde(skip_serializing)]
    pub push_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Farmers and admins may create listings
    pub fn can_sell(&self) -> bool {
        matches!(self.role, Role::Farmer | Role::Admin)
    }
}

/// Data needed to create a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub phone: Option<String>,
    pub full_name: String,
    pub password_hash: String,
    pub role: Role,
}

/// Partial profile update; `None` leaves the field untouched
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub avatar_key: Option<String>,
}

/// Filters for the admin user listing
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub banned: Option<bool>,
    /// Case-insensitive match on name or email
    pub search: Option<String>,
    pub limit: u64,
    pub offset: u64,
}

/// Lowercased, trimmed email if it looks deliverable
pub fn normalize_email(email: &str) -> Result<String, String> {
    let email = email.trim().to_lowercase();
    let valid = regex::Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
        .map(|re| re.is_match(&email))
        .unwrap_or(false);
    if !valid || email.len() > 254 {
        return Err("email address is invalid".to_string());
    }
    Ok(email)
}

/// Phone numbers are stored as `+` and 10 to 15 digits
pub fn validate_phone(phone: &str) -> Result<(), String> {
    let valid = regex::Regex::new(r"^\+?[0-9]{10,15}$")
        .map(|re| re.is_match(phone))
        .unwrap_or(false);
    if valid {
        Ok(())
    } else {
        Err("phone number must be 10 to 15 digits".to_string())
    }
}

/// Pending password reset stored against a user
#[derive(Debug, Clone)]
pub struct PasswordReset {
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
}
