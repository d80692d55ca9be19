//! Asset service
//!
//! Validates uploads, stores them under a per-user key, and resolves keys to
//! CDN URLs.

use std::sync::Arc;

use crate::domain::entities::{AssetPurpose, UserId};
use crate::domain::ports::ObjectStore;
use crate::error::AppError;

/// A stored upload
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StoredAsset {
    pub key: String,
    pub url: String,
}

/// Builds public URLs for stored keys
#[derive(Debug, Clone)]
pub struct CdnUrls {
    domain: String,
}

impl CdnUrls {
    pub fn new(domain: &str) -> Self {
        let domain = domain
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        Self {
            domain: domain.to_string(),
        }
    }

    pub fn url(&self, key: &str) -> String {
        format!("https://{}/{}", self.domain, key)
    }

    pub fn urls(&self, keys: &[String]) -> Vec<String> {
        keys.iter().map(|k| self.url(k)).collect()
    }
}

pub struct AssetService<OS>
where
    OS: ObjectStore,
{
    store: Arc<OS>,
    urls: CdnUrls,
    max_bytes: usize,
}

impl<OS> AssetService<OS>
where
    OS: ObjectStore,
{
    pub fn new(store: Arc<OS>, urls: CdnUrls, max_bytes: usize) -> Self {
        Self {
            store,
            urls,
            max_bytes,
        }
    }

    pub fn urls(&self) -> &CdnUrls {
        &self.urls
    }

    pub async fn upload(
        &self,
        owner: &UserId,
        purpose: AssetPurpose,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredAsset, AppError> {
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Upload is empty".to_string()));
        }
        if bytes.len() > self.max_bytes {
            return Err(AppError::BadRequest(format!(
                "Upload exceeds the {} byte limit",
                self.max_bytes
            )));
        }

        // Ignore parameters such as "; charset=binary"
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        let ext = purpose.extension_for(&mime).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Content type '{}' is not allowed for {} uploads",
                mime, purpose
            ))
        })?;

        let key = purpose.new_key(owner, ext);
        self.store.put_object(&key, &mime, bytes).await?;

        tracing::debug!(owner = %owner, key = %key, "Stored upload");

        Ok(StoredAsset {
            url: self.urls.url(&key),
            key,
        })
    }

    /// Remove objects, logging rather than failing on errors
    pub async fn delete_best_effort(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.store.delete_object(key).await {
                tracing::warn!(error = %e, key = %key, "Failed to delete stored object");
            }
        }
    }
}
