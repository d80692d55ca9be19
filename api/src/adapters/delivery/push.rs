//! Mobile push client

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::check_response;
use crate::config::ProviderConfig;
use crate::domain::ports::PushSender;
use crate::error::DeliveryError;

const PROVIDER: &str = "push";

pub struct HttpPushSender {
    http: Client,
    config: Option<ProviderConfig>,
}

impl HttpPushSender {
    pub fn new(config: Option<ProviderConfig>) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }
}

#[derive(Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    notification: PushPayload<'a>,
    data: &'a serde_json::Value,
}

#[derive(Serialize)]
struct PushPayload<'a> {
    title: &'a str,
    body: &'a str,
}

#[async_trait]
impl PushSender for HttpPushSender {
    async fn send_push(
        &self,
        device_token: &str,
        title: &str,
        body: &str,
        data: &serde_json::Value,
    ) -> Result<(), DeliveryError> {
        let config = self
            .config
            .as_ref()
            .ok_or(DeliveryError::NotConfigured(PROVIDER))?;

        let response = self
            .http
            .post(&config.api_url)
            .header("Authorization", format!("key={}", config.api_key))
            .json(&PushRequest {
                to: device_token,
                notification: PushPayload { title, body },
                data,
            })
            .send()
            .await?;

        check_response(PROVIDER, response).await
    }
}
