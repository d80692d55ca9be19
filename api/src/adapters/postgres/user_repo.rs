//! PostgreSQL adapter for UserRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::domain::entities::{
    NewUser, PasswordReset, ProfileUpdate, Role, User, UserFilter, UserId,
};
use crate::domain::ports::UserRepository;
use crate::entity::users;
use crate::error::DomainError;

/// PostgreSQL implementation of UserRepository
pub struct PostgresUserRepository {
    db: DatabaseConnection,
}

impl PostgresUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let result = users::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        result.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let result = users::Entity::find()
            .filter(users::Column::Email.eq(email.to_lowercase()))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        result.map(User::try_from).transpose()
    }

    async fn create(&self, user: &NewUser) -> Result<User, DomainError> {
        let id = Uuid::new_v4();
        let now = Utc::now().fixed_offset();

        let model = users::ActiveModel {
            id: Set(id),
            email: Set(user.email.to_lowercase()),
            phone: Set(user.phone.clone()),
            full_name: Set(user.full_name.clone()),
            password_hash: Set(user.password_hash.clone()),
            role: Set(user.role.to_string()),
            is_verified: Set(false),
            is_banned: Set(false),
            avatar_key: Set(None),
            bio: Set(None),
            location: Set(None),
            push_token: Set(None),
            reset_code_hash: Set(None),
            reset_code_expires_at: Set(None),
            reset_failed_attempts: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            last_login_at: Set(None),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        User::try_from(result)
    }

    async fn update_profile(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<User, DomainError> {
        let mut model = users::ActiveModel {
            id: Set(id.0),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        };
        if let Some(full_name) = &update.full_name {
            model.full_name = Set(full_name.clone());
        }
        if let Some(phone) = &update.phone {
            model.phone = Set(Some(phone.clone()));
        }
        if let Some(bio) = &update.bio {
            model.bio = Set(Some(bio.clone()));
        }
        if let Some(location) = &update.location {
            model.location = Set(Some(location.clone()));
        }
        if let Some(avatar_key) = &update.avatar_key {
            model.avatar_key = Set(Some(avatar_key.clone()));
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        User::try_from(result)
    }

    async fn update_password(&self, id: &UserId, password_hash: &str) -> Result<(), DomainError> {
        users::ActiveModel {
            id: Set(id.0),
            password_hash: Set(password_hash.to_string()),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(())
    }

    async fn set_push_token(&self, id: &UserId, token: Option<&str>) -> Result<(), DomainError> {
        users::ActiveModel {
            id: Set(id.0),
            push_token: Set(token.map(str::to_string)),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(())
    }

    async fn record_login(&self, id: &UserId) -> Result<(), DomainError> {
        users::ActiveModel {
            id: Set(id.0),
            last_login_at: Set(Some(Utc::now().fixed_offset())),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(())
    }

    async fn set_password_reset(
        &self,
        id: &UserId,
        reset: Option<&PasswordReset>,
    ) -> Result<(), DomainError> {
        users::ActiveModel {
            id: Set(id.0),
            reset_code_hash: Set(reset.map(|r| r.code_hash.clone())),
            reset_code_expires_at: Set(reset.map(|r| r.expires_at.fixed_offset())),
            reset_failed_attempts: Set(0),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(())
    }

    async fn get_password_reset(&self, id: &UserId) -> Result<Option<PasswordReset>, DomainError> {
        let result = users::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.and_then(|m| match (m.reset_code_hash, m.reset_code_expires_at) {
            (Some(code_hash), Some(expires_at)) => Some(PasswordReset {
                code_hash,
                expires_at: expires_at.with_timezone(&Utc),
            }),
            _ => None,
        }))
    }

    async fn record_reset_failure(&self, id: &UserId) -> Result<u32, DomainError> {
        let updated = users::Entity::update_many()
            .col_expr(
                users::Column::ResetFailedAttempts,
                Expr::col(users::Column::ResetFailedAttempts).add(1),
            )
            .filter(users::Column::Id.eq(id.0))
            .exec_with_returning(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        updated
            .first()
            .map(|m| m.reset_failed_attempts.max(0) as u32)
            .ok_or_else(|| DomainError::NotFound(format!("User {}", id)))
    }

    async fn set_verified(&self, id: &UserId, verified: bool) -> Result<(), DomainError> {
        users::ActiveModel {
            id: Set(id.0),
            is_verified: Set(verified),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(())
    }

    async fn set_banned(&self, id: &UserId, banned: bool) -> Result<(), DomainError> {
        users::ActiveModel {
            id: Set(id.0),
            is_banned: Set(banned),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(())
    }

    async fn set_role(&self, id: &UserId, role: Role) -> Result<(), DomainError> {
        users::ActiveModel {
            id: Set(id.0),
            role: Set(role.to_string()),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(())
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, DomainError> {
        let mut cond = Condition::all();
        if let Some(role) = filter.role {
            cond = cond.add(users::Column::Role.eq(role.to_string()));
        }
        if let Some(banned) = filter.banned {
            cond = cond.add(users::Column::IsBanned.eq(banned));
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{}%", search.to_lowercase());
            cond = cond.add(
                Condition::any()
                    .add(Expr::expr(Func::lower(Expr::col(users::Column::FullName))).like(&pattern))
                    .add(users::Column::Email.like(&pattern)),
            );
        }

        let results = users::Entity::find()
            .filter(cond)
            .order_by_desc(users::Column::CreatedAt)
            .offset(filter.offset)
            .limit(filter.limit)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        results.into_iter().map(User::try_from).collect()
    }

    async fn find_by_role(&self, role: Role) -> Result<Vec<User>, DomainError> {
        let results = users::Entity::find()
            .filter(users::Column::Role.eq(role.to_string()))
            .order_by_asc(users::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        results.into_iter().map(User::try_from).collect()
    }

    async fn find_active_ids(&self, role: Option<Role>) -> Result<Vec<UserId>, DomainError> {
        let mut query = users::Entity::find().filter(users::Column::IsBanned.eq(false));
        if let Some(role) = role {
            query = query.filter(users::Column::Role.eq(role.to_string()));
        }

        let ids: Vec<Uuid> = query
            .select_only()
            .column(users::Column::Id)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(ids.into_iter().map(UserId).collect())
    }

    async fn count_by_role(&self) -> Result<Vec<(Role, u64)>, DomainError> {
        let rows: Vec<(String, i64)> = users::Entity::find()
            .select_only()
            .column(users::Column::Role)
            .column_as(Expr::col(users::Column::Id).count(), "count")
            .group_by(users::Column::Role)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|(role, count)| {
                let role: Role = role.parse().map_err(DomainError::Internal)?;
                Ok((role, count as u64))
            })
            .collect()
    }
}

/// Convert SeaORM model to domain entity
impl TryFrom<users::Model> for User {
    type Error = DomainError;

    fn try_from(model: users::Model) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId(model.id),
            email: model.email,
            phone: model.phone,
            full_name: model.full_name,
            password_hash: model.password_hash,
            role: model.role.parse().map_err(DomainError::Internal)?,
            is_verified: model.is_verified,
            is_banned: model.is_banned,
            avatar_key: model.avatar_key,
            bio: model.bio,
            location: model.location,
            push_token: model.push_token,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
            last_login_at: model.last_login_at.map(|dt| dt.with_timezone(&Utc)),
        })
    }
}
