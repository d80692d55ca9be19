//! Domain layer
//!
//! Contains pure business logic with no external dependencies.
//! - `entities`: Domain models representing core business concepts
//! - `ports`: Trait definitions for external dependencies
//! - `channel_selector`: Notification channel policy

pub mod channel_selector;
pub mod entities;
pub mod ports;
