//! S3-compatible object store over plain HTTP
//!
//! Objects are written with `PUT {endpoint}/{bucket}/{key}` and a bearer
//! token; reads go through the CDN and never touch this client.

use async_trait::async_trait;
use reqwest::Client;
use urlencoding::encode;

use crate::domain::ports::ObjectStore;
use crate::error::StorageError;

pub struct HttpObjectStore {
    http: Client,
    endpoint: Option<String>,
    bucket: String,
    token: Option<String>,
}

impl HttpObjectStore {
    pub fn new(endpoint: Option<String>, bucket: String, token: Option<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.map(|e| e.trim_end_matches('/').to_string()),
            bucket,
            token,
        }
    }

    fn object_url(&self, key: &str) -> Result<(String, &str), StorageError> {
        match (&self.endpoint, &self.token) {
            (Some(endpoint), Some(token)) => Ok((
                format!("{}/{}/{}", endpoint, self.bucket, encode_key(key)),
                token.as_str(),
            )),
            _ => Err(StorageError::NotConfigured),
        }
    }

    async fn handle_response(&self, response: reqwest::Response) -> Result<(), StorageError> {
        let status = response.status();

        if status.is_success() {
            Ok(())
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(StorageError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Percent-encode each path segment, keeping the separators
fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StorageError> {
        let (url, token) = self.object_url(key)?;

        let response = self
            .http
            .put(url)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        self.handle_response(response).await
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        let (url, token) = self.object_url(key)?;

        let response = self.http.delete(url).bearer_auth(token).send().await?;

        // Already gone is fine
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        self.handle_response(response).await
    }
}
