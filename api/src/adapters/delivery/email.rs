//! Transactional email client

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::check_response;
use crate::config::ProviderConfig;
use crate::domain::ports::EmailSender;
use crate::error::DeliveryError;

const PROVIDER: &str = "email";

pub struct HttpEmailSender {
    http: Client,
    config: Option<ProviderConfig>,
    from: String,
}

impl HttpEmailSender {
    pub fn new(config: Option<ProviderConfig>, from: String) -> Self {
        Self {
            http: Client::new(),
            config,
            from,
        }
    }
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), DeliveryError> {
        let config = self
            .config
            .as_ref()
            .ok_or(DeliveryError::NotConfigured(PROVIDER))?;

        let response = self
            .http
            .post(&config.api_url)
            .bearer_auth(&config.api_key)
            .json(&SendEmailRequest {
                from: &self.from,
                to: [to],
                subject,
                text: body,
            })
            .send()
            .await?;

        check_response(PROVIDER, response).await
    }
}
