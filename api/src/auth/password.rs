//! Password hashing and one-time reset codes

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

use crate::error::DomainError;

type HmacSha256 = Hmac<Sha256>;

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn validate_password(password: &str) -> Result<(), DomainError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Argon2id PHC string
pub fn hash_password(password: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DomainError::Internal(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Random 6-digit code, zero padded
pub fn generate_reset_code() -> String {
    let code: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", code)
}

fn reset_mac(secret: &str, code: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(code.as_bytes());
    Some(mac)
}

/// Keyed hash of a reset code for storage
pub fn hash_reset_code(secret: &str, code: &str) -> Result<String, DomainError> {
    reset_mac(secret, code)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .ok_or_else(|| DomainError::Internal("Invalid reset code secret".to_string()))
}

/// Constant-time check of a submitted code against its stored hash
pub fn verify_reset_code(secret: &str, code: &str, stored_hash: &str) -> bool {
    let Some(mac) = reset_mac(secret, code) else {
        return false;
    };
    let Ok(expected) = hex::decode(stored_hash) else {
        return false;
    };
    mac.verify_slice(&expected).is_ok()
}
