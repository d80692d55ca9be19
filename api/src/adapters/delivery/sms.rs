//! SMS gateway clients

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::check_response;
use crate::config::ProviderConfig;
use crate::domain::ports::SmsGateway;
use crate::error::DeliveryError;

/// Primary SMS gateway (bearer-authenticated JSON API)
pub struct HttpSmsGateway {
    http: Client,
    config: Option<ProviderConfig>,
    sender_id: String,
}

impl HttpSmsGateway {
    pub fn new(config: Option<ProviderConfig>, sender_id: String) -> Self {
        Self {
            http: Client::new(),
            config,
            sender_id,
        }
    }
}

#[derive(Serialize)]
struct GatewayMessage<'a> {
    sender: &'a str,
    to: &'a str,
    message: &'a str,
}

#[async_trait]
impl SmsGateway for HttpSmsGateway {
    fn provider(&self) -> &'static str {
        "sms_gateway"
    }

    async fn send_sms(&self, phone: &str, message: &str) -> Result<(), DeliveryError> {
        let config = self
            .config
            .as_ref()
            .ok_or(DeliveryError::NotConfigured(self.provider()))?;

        let response = self
            .http
            .post(&config.api_url)
            .bearer_auth(&config.api_key)
            .json(&GatewayMessage {
                sender: &self.sender_id,
                to: phone,
                message,
            })
            .send()
            .await?;

        check_response(self.provider(), response).await
    }
}

/// Secondary cloud SMS provider (API-key header, transactional route)
pub struct CloudSmsGateway {
    http: Client,
    config: Option<ProviderConfig>,
}

impl CloudSmsGateway {
    pub fn new(config: Option<ProviderConfig>) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CloudMessage<'a> {
    phone_number: &'a str,
    message: &'a str,
    message_type: &'a str,
}

#[async_trait]
impl SmsGateway for CloudSmsGateway {
    fn provider(&self) -> &'static str {
        "cloud_sms"
    }

    async fn send_sms(&self, phone: &str, message: &str) -> Result<(), DeliveryError> {
        let config = self
            .config
            .as_ref()
            .ok_or(DeliveryError::NotConfigured(self.provider()))?;

        let response = self
            .http
            .post(format!("{}/messages", config.api_url.trim_end_matches('/')))
            .header("x-api-key", &config.api_key)
            .json(&CloudMessage {
                phone_number: phone,
                message,
                message_type: "Transactional",
            })
            .send()
            .await?;

        check_response(self.provider(), response).await
    }
}

/// Tries the primary gateway, then the secondary. Only the secondary's
/// error is returned when both fail.
pub struct FallbackSmsGateway<P: SmsGateway, S: SmsGateway> {
    primary: P,
    secondary: S,
}

impl<P: SmsGateway, S: SmsGateway> FallbackSmsGateway<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl<P: SmsGateway, S: SmsGateway> SmsGateway for FallbackSmsGateway<P, S> {
    fn provider(&self) -> &'static str {
        "sms_fallback"
    }

    async fn send_sms(&self, phone: &str, message: &str) -> Result<(), DeliveryError> {
        match self.primary.send_sms(phone, message).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(
                    provider = self.primary.provider(),
                    error = %e,
                    "Primary SMS gateway failed, trying {}",
                    self.secondary.provider()
                );
                self.secondary.send_sms(phone, message).await
            }
        }
    }
}
