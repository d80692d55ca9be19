//! Notification delivery adapters
//!
//! HTTP clients for the SMS gateways, email provider, and push service.
//! A provider built without credentials fails every send with
//! `DeliveryError::NotConfigured`, which the notification service treats
//! like any other delivery failure.

pub mod email;
pub mod push;
pub mod sms;

pub use email::HttpEmailSender;
pub use push::HttpPushSender;
pub use sms::{CloudSmsGateway, FallbackSmsGateway, HttpSmsGateway};

use crate::error::DeliveryError;

/// Map a provider response to success or a `Rejected` error
async fn check_response(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<(), DeliveryError> {
    let status = response.status();

    if status.is_success() {
        Ok(())
    } else {
        let message = response.text().await.unwrap_or_default();
        Err(DeliveryError::Rejected {
            provider,
            status: status.as_u16(),
            message,
        })
    }
}
