//! HTTP handlers
//!
//! Axum request handlers for the API endpoints.

pub mod admin;
pub mod auth;
pub mod chat;
pub mod notifications;
pub mod offers;
pub mod products;
pub mod profile;
pub mod reviews;
pub mod uploads;
pub mod verification;

use serde::Deserialize;

/// `?limit=&offset=` shared by every list endpoint
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

pub(crate) fn default_limit() -> u64 {
    20
}

/// Shape of a count-only response
#[derive(Debug, serde::Serialize)]
pub struct CountResponse {
    pub count: u64,
}
