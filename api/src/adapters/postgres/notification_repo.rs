//! PostgreSQL adapters for NotificationRepository and PreferenceRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::domain::entities::{
    ChannelCost, NewNotification, Notification, NotificationId, NotificationPreferences,
    UserId,
};
use crate::domain::ports::{NotificationRepository, PreferenceRepository};
use crate::entity::{notification_preferences, notifications};
use crate::error::DomainError;

/// PostgreSQL implementation of NotificationRepository
pub struct PostgresNotificationRepository {
    db: DatabaseConnection,
}

impl PostgresNotificationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn create(&self, notification: &NewNotification) -> Result<Notification, DomainError> {
        let model = notifications::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(notification.user_id.0),
            kind: Set(notification.kind.to_string()),
            urgency: Set(notification.urgency.to_string()),
            channel: Set(notification.channel.to_string()),
            title: Set(notification.title.clone()),
            body: Set(notification.body.clone()),
            data: Set(notification.data.clone()),
            estimated_cost: Set(notification.estimated_cost),
            downgraded: Set(notification.downgraded),
            read_at: Set(None),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Notification::try_from(result)
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        unread_only: bool,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Notification>, DomainError> {
        let mut query =
            notifications::Entity::find().filter(notifications::Column::UserId.eq(user_id.0));
        if unread_only {
            query = query.filter(notifications::Column::ReadAt.is_null());
        }

        let results = query
            .order_by_desc(notifications::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        results.into_iter().map(Notification::try_from).collect()
    }

    async fn unread_count(&self, user_id: &UserId) -> Result<u64, DomainError> {
        notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id.0))
            .filter(notifications::Column::ReadAt.is_null())
            .count(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))
    }

    async fn mark_read(
        &self,
        id: &NotificationId,
        user_id: &UserId,
    ) -> Result<bool, DomainError> {
        let result = notifications::Entity::update_many()
            .col_expr(
                notifications::Column::ReadAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(notifications::Column::Id.eq(id.0))
            .filter(notifications::Column::UserId.eq(user_id.0))
            .filter(notifications::Column::ReadAt.is_null())
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if result.rows_affected > 0 {
            return Ok(true);
        }

        // Already read still counts as success for the owner
        let owned = notifications::Entity::find()
            .filter(notifications::Column::Id.eq(id.0))
            .filter(notifications::Column::UserId.eq(user_id.0))
            .count(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(owned > 0)
    }

    async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, DomainError> {
        let result = notifications::Entity::update_many()
            .col_expr(
                notifications::Column::ReadAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(notifications::Column::UserId.eq(user_id.0))
            .filter(notifications::Column::ReadAt.is_null())
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    async fn cost_summary(&self, since: DateTime<Utc>) -> Result<Vec<ChannelCost>, DomainError> {
        let rows: Vec<(String, Option<f64>, i64)> = notifications::Entity::find()
            .select_only()
            .column(notifications::Column::Channel)
            .column_as(
                Expr::col(notifications::Column::EstimatedCost).sum(),
                "total_cost",
            )
            .column_as(Expr::col(notifications::Column::Id).count(), "sent")
            .filter(notifications::Column::CreatedAt.gte(since.fixed_offset()))
            .group_by(notifications::Column::Channel)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let mut costs = rows
            .into_iter()
            .map(|(channel, total, sent)| {
                Ok(ChannelCost {
                    channel: channel.parse().map_err(DomainError::Internal)?,
                    sent: sent as u64,
                    total_cost: total.unwrap_or(0.0),
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;
        costs.sort_by_key(|c| c.channel);

        Ok(costs)
    }
}

/// Convert SeaORM model to domain entity
impl TryFrom<notifications::Model> for Notification {
    type Error = DomainError;

    fn try_from(model: notifications::Model) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: NotificationId(model.id),
            user_id: UserId(model.user_id),
            kind: model.kind.parse().map_err(DomainError::Internal)?,
            urgency: model.urgency.parse().map_err(DomainError::Internal)?,
            channel: model.channel.parse().map_err(DomainError::Internal)?,
            title: model.title,
            body: model.body,
            data: model.data,
            estimated_cost: model.estimated_cost,
            downgraded: model.downgraded,
            read_at: model.read_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
        })
    }
}

/// PostgreSQL implementation of PreferenceRepository
pub struct PostgresPreferenceRepository {
    db: DatabaseConnection,
}

impl PostgresPreferenceRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PreferenceRepository for PostgresPreferenceRepository {
    async fn get(&self, user_id: &UserId) -> Result<Option<NotificationPreferences>, DomainError> {
        let result = notification_preferences::Entity::find_by_id(user_id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| NotificationPreferences {
            channels: serde_json::from_value(m.channels).unwrap_or_default(),
        }))
    }

    async fn upsert(
        &self,
        user_id: &UserId,
        preferences: &NotificationPreferences,
    ) -> Result<(), DomainError> {
        let channels = serde_json::to_value(&preferences.channels)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let model = notification_preferences::ActiveModel {
            user_id: Set(user_id.0),
            channels: Set(channels),
            updated_at: Set(Utc::now().fixed_offset()),
        };

        notification_preferences::Entity::insert(model)
            .on_conflict(
                OnConflict::column(notification_preferences::Column::UserId)
                    .update_columns([
                        notification_preferences::Column::Channels,
                        notification_preferences::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(())
    }
}
