//! Notification delivery port traits
//!
//! One trait per outbound channel. In-app delivery is just the persisted
//! notification row and has no port.

use async_trait::async_trait;

use crate::error::DeliveryError;

/// Sends text messages to a phone number
#[async_trait]
pub trait SmsGateway: Send + Sync {
    /// Short provider name for logs
    fn provider(&self) -> &'static str;

    async fn send_sms(&self, phone: &str, message: &str) -> Result<(), DeliveryError>;
}

/// Sends transactional email
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError>;
}

/// Sends mobile push notifications
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send_push(
        &self,
        device_token: &str,
        title: &str,
        body: &str,
        data: &serde_json::Value,
    ) -> Result<(), DeliveryError>;
}
