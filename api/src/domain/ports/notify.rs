//! Notification port
//!
//! Services that need to tell a user something depend on this trait rather
//! than on the notification service itself.

use async_trait::async_trait;

use crate::domain::entities::{Notification, OutgoingNotification, UserId};
use crate::error::DomainError;

#[async_trait]
pub trait Notify: Send + Sync {
    /// Pick a channel, attempt delivery, and persist the result
    async fn notify(
        &self,
        user_id: &UserId,
        notification: OutgoingNotification,
    ) -> Result<Notification, DomainError>;

    /// Like `notify`, but a failure is logged instead of returned
    async fn notify_best_effort(&self, user_id: &UserId, notification: OutgoingNotification) {
        let kind = notification.kind;
        if let Err(e) = self.notify(user_id, notification).await {
            tracing::warn!(error = %e, user_id = %user_id, kind = %kind, "Failed to notify user");
        }
    }
}
