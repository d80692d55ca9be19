//! Auth service
//!
//! Registration, login, token refresh, and password management.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::auth::password::{
    generate_reset_code, hash_password, hash_reset_code, validate_password, verify_password,
    verify_reset_code,
};
use crate::auth::JwtKeys;
use crate::domain::entities::{
    normalize_email, validate_phone, NewUser, NotificationKind, OutgoingNotification,
    PasswordReset, Role, User,
};
use crate::domain::ports::{Notify, UserRepository};
use crate::error::{AppError, DomainError};

/// Reset codes expire this long after they are issued
const RESET_CODE_TTL_MINUTES: i64 = 15;

/// Wrong guesses allowed before a reset code is discarded
const MAX_RESET_ATTEMPTS: u32 = 5;

/// Self-service registration input
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
}

/// A freshly signed access token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
}

pub struct AuthService<UR, N>
where
    UR: UserRepository,
    N: Notify,
{
    users: Arc<UR>,
    notifier: Arc<N>,
    keys: JwtKeys,
    reset_secret: String,
}

impl<UR, N> AuthService<UR, N>
where
    UR: UserRepository,
    N: Notify,
{
    pub fn new(users: Arc<UR>, notifier: Arc<N>, keys: JwtKeys, reset_secret: String) -> Self {
        Self {
            users,
            notifier,
            keys,
            reset_secret,
        }
    }

    fn issue(&self, user: &User) -> Result<IssuedToken, AppError> {
        Ok(IssuedToken {
            token: self.keys.issue(user)?,
            expires_in: self.keys.ttl_secs(),
        })
    }

    /// Create a farmer or buyer account and sign them in
    pub async fn register(
        &self,
        registration: Registration,
    ) -> Result<(User, IssuedToken), AppError> {
        if !registration.role.is_self_assignable() {
            return Err(AppError::BadRequest(
                "Role must be farmer or buyer".to_string(),
            ));
        }

        let email = normalize_email(&registration.email).map_err(AppError::BadRequest)?;
        let full_name = registration.full_name.trim().to_string();
        if full_name.is_empty() || full_name.chars().count() > 100 {
            return Err(AppError::BadRequest(
                "Name must be between 1 and 100 characters".to_string(),
            ));
        }
        if let Some(phone) = &registration.phone {
            validate_phone(phone).map_err(AppError::BadRequest)?;
        }
        validate_password(&registration.password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Domain(DomainError::AlreadyExists(
                "An account with this email already exists".to_string(),
            )));
        }

        let user = self
            .users
            .create(&NewUser {
                email,
                phone: registration.phone,
                full_name,
                password_hash: hash_password(&registration.password)?,
                role: registration.role,
            })
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");

        let token = self.issue(&user)?;
        Ok((user, token))
    }

    /// Check credentials. Unknown email and wrong password look the same.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, IssuedToken), AppError> {
        let email = email.trim().to_lowercase();
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .filter(|u| verify_password(password, &u.password_hash))
            .ok_or_else(|| {
                AppError::Domain(DomainError::Unauthorized(
                    "Invalid email or password".to_string(),
                ))
            })?;

        if user.is_banned {
            return Err(AppError::Forbidden("Account is suspended".to_string()));
        }

        self.users.record_login(&user.id).await?;
        let token = self.issue(&user)?;
        Ok((user, token))
    }

    /// New token for an already authenticated user
    pub fn refresh(&self, user: &User) -> Result<IssuedToken, AppError> {
        self.issue(user)
    }

    /// Resolve a bearer token to a live, unbanned user
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let claims = self.keys.verify(token)?;

        let user = self
            .users
            .find_by_id(&claims.user_id())
            .await?
            .ok_or(AppError::Unauthorized)?;

        if user.is_banned {
            return Err(AppError::Forbidden("Account is suspended".to_string()));
        }

        Ok(user)
    }

    pub async fn change_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        if !verify_password(current_password, &user.password_hash) {
            return Err(AppError::Domain(DomainError::Unauthorized(
                "Current password is incorrect".to_string(),
            )));
        }
        validate_password(new_password)?;

        self.users
            .update_password(&user.id, &hash_password(new_password)?)
            .await?;
        Ok(())
    }

    /// Send a one-time code. Unknown emails succeed silently.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        let email = email.trim().to_lowercase();
        let Some(user) = self.users.find_by_email(&email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };
        if user.is_banned {
            return Ok(());
        }

        let code = generate_reset_code();
        let reset = PasswordReset {
            code_hash: hash_reset_code(&self.reset_secret, &code)?,
            expires_at: Utc::now() + Duration::minutes(RESET_CODE_TTL_MINUTES),
        };
        self.users.set_password_reset(&user.id, Some(&reset)).await?;

        let notification = OutgoingNotification::new(
            NotificationKind::PasswordReset,
            "AgriLink password reset",
            format!(
                "Your AgriLink reset code is {}. It expires in {} minutes.",
                code, RESET_CODE_TTL_MINUTES
            ),
        );
        self.notifier.notify_best_effort(&user.id, notification).await;

        Ok(())
    }

    /// Swap the password if the code matches and has not expired
    pub async fn confirm_password_reset(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let invalid = || AppError::BadRequest("Invalid or expired reset code".to_string());

        let email = email.trim().to_lowercase();
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(invalid)?;
        let reset = self
            .users
            .get_password_reset(&user.id)
            .await?
            .ok_or_else(invalid)?;

        if reset.expires_at < Utc::now() {
            return Err(invalid());
        }
        if !verify_reset_code(&self.reset_secret, code.trim(), &reset.code_hash) {
            let failures = self.users.record_reset_failure(&user.id).await?;
            if failures >= MAX_RESET_ATTEMPTS {
                self.users.set_password_reset(&user.id, None).await?;
                tracing::warn!(
                    user_id = %user.id,
                    failures,
                    "Reset code discarded after repeated failures"
                );
            }
            return Err(invalid());
        }
        validate_password(new_password)?;

        self.users
            .update_password(&user.id, &hash_password(new_password)?)
            .await?;
        self.users.set_password_reset(&user.id, None).await?;

        tracing::info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }
}
