//! Application layer
//!
//! Contains use cases and service orchestration.
//! Services coordinate between domain entities, ports, and external systems.

pub mod admin_directory;
pub mod admin_service;
pub mod asset_service;
pub mod auth_service;
pub mod chat_service;
pub mod notification_service;
pub mod offer_service;
pub mod product_service;
pub mod profile_service;
pub mod review_service;
pub mod verification_service;

pub use admin_directory::AdminDirectory;
pub use admin_service::{AdminService, DashboardStats};
pub use asset_service::{AssetService, CdnUrls, StoredAsset};
pub use auth_service::{AuthService, IssuedToken, Registration};
pub use chat_service::ChatService;
pub use notification_service::NotificationService;
pub use offer_service::{OfferInput, OfferService, OfferSide};
pub use product_service::{ProductInput, ProductService, Removal};
pub use profile_service::ProfileService;
pub use review_service::ReviewService;
pub use verification_service::VerificationService;
