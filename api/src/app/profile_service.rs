//! Profile service
//!
//! Own-profile edits, public profiles, device tokens, and saved addresses.

use std::sync::Arc;

use crate::domain::entities::{
    validate_phone, Address, AddressId, AddressInput, AssetPurpose, NewAddress, ProfileUpdate,
    User, UserId, MAX_ADDRESSES_PER_USER,
};
use crate::domain::ports::{AddressRepository, UserRepository};
use crate::error::AppError;

const MAX_BIO_LEN: usize = 500;

pub struct ProfileService<UR, AR>
where
    UR: UserRepository,
    AR: AddressRepository,
{
    users: Arc<UR>,
    addresses: Arc<AR>,
}

impl<UR, AR> ProfileService<UR, AR>
where
    UR: UserRepository,
    AR: AddressRepository,
{
    pub fn new(users: Arc<UR>, addresses: Arc<AR>) -> Self {
        Self { users, addresses }
    }

    /// Any user visible to the public. Banned accounts are hidden.
    pub async fn public_profile(&self, user_id: &UserId) -> Result<User, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .filter(|u| !u.is_banned)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    pub async fn update_profile(
        &self,
        user: &User,
        mut update: ProfileUpdate,
    ) -> Result<User, AppError> {
        if let Some(name) = update.full_name.as_mut() {
            *name = name.trim().to_string();
            if name.is_empty() || name.chars().count() > 100 {
                return Err(AppError::BadRequest(
                    "Name must be between 1 and 100 characters".to_string(),
                ));
            }
        }
        if let Some(phone) = &update.phone {
            validate_phone(phone).map_err(AppError::BadRequest)?;
        }
        if let Some(bio) = &update.bio {
            if bio.chars().count() > MAX_BIO_LEN {
                return Err(AppError::BadRequest(format!(
                    "Bio must be at most {} characters",
                    MAX_BIO_LEN
                )));
            }
        }
        if let Some(key) = &update.avatar_key {
            if !AssetPurpose::Avatar.is_owned_by(key, &user.id) {
                return Err(AppError::BadRequest(
                    "avatar_key must be one of your avatar uploads".to_string(),
                ));
            }
        }

        Ok(self.users.update_profile(&user.id, &update).await?)
    }

    /// Register or clear the device token used for push delivery
    pub async fn set_push_token(
        &self,
        user_id: &UserId,
        token: Option<String>,
    ) -> Result<(), AppError> {
        let token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        if token.as_ref().is_some_and(|t| t.len() > 512) {
            return Err(AppError::BadRequest("Push token is too long".to_string()));
        }
        self.users.set_push_token(user_id, token.as_deref()).await?;
        Ok(())
    }

    pub async fn list_addresses(&self, user_id: &UserId) -> Result<Vec<Address>, AppError> {
        Ok(self.addresses.list_by_user(user_id).await?)
    }

    /// Save an address. The user's first address becomes the default.
    pub async fn add_address(
        &self,
        user_id: &UserId,
        input: AddressInput,
    ) -> Result<Address, AppError> {
        input.validate().map_err(AppError::BadRequest)?;

        let count = self.addresses.count_by_user(user_id).await?;
        if count >= MAX_ADDRESSES_PER_USER {
            return Err(AppError::BadRequest(format!(
                "You can save at most {} addresses",
                MAX_ADDRESSES_PER_USER
            )));
        }

        Ok(self
            .addresses
            .create(&NewAddress {
                user_id: *user_id,
                input,
                is_default: count == 0,
            })
            .await?)
    }

    async fn owned_address(&self, user_id: &UserId, id: &AddressId) -> Result<Address, AppError> {
        self.addresses
            .find_by_id(id)
            .await?
            .filter(|a| a.user_id == *user_id)
            .ok_or_else(|| AppError::NotFound(format!("Address {} not found", id)))
    }

    pub async fn update_address(
        &self,
        user_id: &UserId,
        id: &AddressId,
        input: AddressInput,
    ) -> Result<Address, AppError> {
        self.owned_address(user_id, id).await?;
        input.validate().map_err(AppError::BadRequest)?;
        Ok(self.addresses.update(id, &input).await?)
    }

    /// Delete an address; if it was the default, the oldest remaining one
    /// takes over
    pub async fn delete_address(&self, user_id: &UserId, id: &AddressId) -> Result<(), AppError> {
        let address = self.owned_address(user_id, id).await?;
        self.addresses.delete(id).await?;

        if address.is_default {
            let remaining = self.addresses.list_by_user(user_id).await?;
            if let Some(next) = remaining.iter().min_by_key(|a| a.created_at) {
                self.addresses.set_default(user_id, &next.id).await?;
            }
        }
        Ok(())
    }

    pub async fn set_default_address(
        &self,
        user_id: &UserId,
        id: &AddressId,
    ) -> Result<(), AppError> {
        self.owned_address(user_id, id).await?;
        self.addresses.set_default(user_id, id).await?;
        Ok(())
    }
}
