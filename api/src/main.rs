//! AgriLink API Server
//!
//! Marketplace connecting farmers and buyers: listings, offers, chat,
//! reviews, verification, and cost-aware notifications.
//! Uses hexagonal (ports & adapters) architecture for clean separation of concerns.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post, put},
    Json, Router,
};
use sea_orm::Database;
use serde::Serialize;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod auth;
mod cache;
mod config;
mod domain;
mod entity;
mod error;
mod handlers;

#[cfg(test)]
mod test_utils;

#[cfg(test)]
mod integration_tests;

use adapters::{
    CloudSmsGateway, FallbackSmsGateway, HttpEmailSender, HttpObjectStore, HttpPushSender,
    HttpSmsGateway, PostgresAddressRepository, PostgresChatRepository,
    PostgresNotificationRepository, PostgresOfferRepository, PostgresPreferenceRepository,
    PostgresProductRepository, PostgresReviewRepository, PostgresUserRepository,
    PostgresVerificationRepository,
};
use app::{
    AdminDirectory, AdminService, AssetService, AuthService, CdnUrls, ChatService,
    NotificationService, OfferService, ProductService, ProfileService, ReviewService,
    VerificationService,
};
use auth::JwtKeys;
use config::Config;
use domain::channel_selector::ChannelLimits;

type SmsProvider = FallbackSmsGateway<HttpSmsGateway, CloudSmsGateway>;

/// The notification pipeline every service sends through
pub type Notifier = NotificationService<
    PostgresUserRepository,
    PostgresNotificationRepository,
    PostgresPreferenceRepository,
    SmsProvider,
    HttpEmailSender,
    HttpPushSender,
>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService<PostgresUserRepository, Notifier>>,
    pub profile_service: Arc<ProfileService<PostgresUserRepository, PostgresAddressRepository>>,
    pub asset_service: Arc<AssetService<HttpObjectStore>>,
    pub product_service: Arc<
        ProductService<PostgresProductRepository, PostgresOfferRepository, Notifier, HttpObjectStore>,
    >,
    pub offer_service:
        Arc<OfferService<PostgresOfferRepository, PostgresProductRepository, Notifier>>,
    pub chat_service: Arc<
        ChatService<
            PostgresChatRepository,
            PostgresUserRepository,
            PostgresProductRepository,
            Notifier,
        >,
    >,
    pub review_service:
        Arc<ReviewService<PostgresReviewRepository, PostgresOfferRepository, Notifier>>,
    pub verification_service: Arc<
        VerificationService<PostgresVerificationRepository, PostgresUserRepository, Notifier>,
    >,
    pub notification_service: Arc<Notifier>,
    pub admin_service: Arc<
        AdminService<
            PostgresUserRepository,
            PostgresProductRepository,
            PostgresOfferRepository,
            PostgresVerificationRepository,
            Notifier,
        >,
    >,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,agrilink_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting AgriLink API...");

    let config = Config::from_env()?;

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Repositories
    let user_repo = Arc::new(PostgresUserRepository::new(db.clone()));
    let address_repo = Arc::new(PostgresAddressRepository::new(db.clone()));
    let product_repo = Arc::new(PostgresProductRepository::new(db.clone()));
    let offer_repo = Arc::new(PostgresOfferRepository::new(db.clone()));
    let chat_repo = Arc::new(PostgresChatRepository::new(db.clone()));
    let review_repo = Arc::new(PostgresReviewRepository::new(db.clone()));
    let verification_repo = Arc::new(PostgresVerificationRepository::new(db.clone()));
    let notification_repo = Arc::new(PostgresNotificationRepository::new(db.clone()));
    let preference_repo = Arc::new(PostgresPreferenceRepository::new(db.clone()));

    // Providers
    let sms = Arc::new(FallbackSmsGateway::new(
        HttpSmsGateway::new(config.sms.clone(), config.sms_sender_id.clone()),
        CloudSmsGateway::new(config.cloud_sms.clone()),
    ));
    let email = Arc::new(HttpEmailSender::new(
        config.email.clone(),
        config.email_from.clone(),
    ));
    let push = Arc::new(HttpPushSender::new(config.push.clone()));

    if !config.storage_enabled() {
        tracing::warn!("Object storage is not configured; uploads will fail");
    }
    let object_store = Arc::new(HttpObjectStore::new(
        config.storage_endpoint.clone(),
        config.storage_bucket.clone(),
        config.storage_token.clone(),
    ));

    // Services
    let notifier = Arc::new(NotificationService::new(
        user_repo.clone(),
        notification_repo,
        preference_repo,
        sms,
        email,
        push,
        ChannelLimits {
            sms: config.sms_limit_per_window as usize,
            push: config.push_limit_per_window as usize,
            email: config.email_limit_per_window as usize,
            window: chrono::Duration::seconds(config.rate_limit_window_secs),
        },
    ));

    let admin_directory = Arc::new(AdminDirectory::new(
        user_repo.clone(),
        Duration::from_secs(config.admin_cache_ttl_secs),
    ));

    let asset_service = Arc::new(AssetService::new(
        object_store,
        CdnUrls::new(&config.cdn_domain),
        config.max_upload_bytes,
    ));

    let auth_service = Arc::new(AuthService::new(
        user_repo.clone(),
        notifier.clone(),
        JwtKeys::new(&config.jwt_secret, config.jwt_ttl_hours),
        config.jwt_secret.clone(),
    ));

    let profile_service = Arc::new(ProfileService::new(user_repo.clone(), address_repo));

    let product_service = Arc::new(ProductService::new(
        product_repo.clone(),
        offer_repo.clone(),
        notifier.clone(),
        asset_service.clone(),
    ));

    let offer_service = Arc::new(OfferService::new(
        offer_repo.clone(),
        product_repo.clone(),
        notifier.clone(),
    ));

    let chat_service = Arc::new(ChatService::new(
        chat_repo,
        user_repo.clone(),
        product_repo.clone(),
        notifier.clone(),
    ));

    let review_service = Arc::new(ReviewService::new(
        review_repo,
        offer_repo.clone(),
        notifier.clone(),
    ));

    let verification_service = Arc::new(VerificationService::new(
        verification_repo.clone(),
        user_repo.clone(),
        admin_directory.clone(),
        notifier.clone(),
    ));

    let admin_service = Arc::new(AdminService::new(
        user_repo,
        product_repo,
        offer_repo,
        verification_repo,
        admin_directory,
        notifier.clone(),
    ));

    let state = AppState {
        auth_service,
        profile_service,
        asset_service,
        product_service,
        offer_service,
        chat_service,
        review_service,
        verification_service,
        notification_service: notifier,
        admin_service,
    };

    let app = router(state, config.max_upload_bytes)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn router(state: AppState, max_upload_bytes: usize) -> anyhow::Result<Router> {
    use handlers::{
        admin, auth as auth_handlers, chat, notifications, offers, products, profile, reviews,
        uploads, verification,
    };

    // Rate limiting config: 2 req/sec sustained, burst of 5
    // Uses PeerIpKeyExtractor to get client IP from socket connection
    // (SmartIpKeyExtractor requires X-Forwarded-For headers from reverse proxy)
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(PeerIpKeyExtractor)
            .per_second(2)
            .burst_size(5)
            .finish()
            .context("Failed to build governor config")?,
    );

    // Rate-limited routes (credentials and reset codes)
    let rate_limited_routes = Router::new()
        .route("/auth/register", post(auth_handlers::register))
        .route("/auth/login", post(auth_handlers::login))
        .route(
            "/auth/password-reset/request",
            post(auth_handlers::request_password_reset),
        )
        .route(
            "/auth/password-reset/confirm",
            post(auth_handlers::confirm_password_reset),
        )
        .layer(GovernorLayer {
            config: governor_config,
        });

    // Admin routes, gated by role inside the auth layer
    let admin_routes = Router::new()
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/:id/ban", post(admin::ban_user))
        .route("/admin/users/:id/unban", post(admin::unban_user))
        .route("/admin/users/:id/role", put(admin::set_role))
        .route("/admin/products", get(products::list_for_moderation))
        .route(
            "/admin/products/:id/approve",
            post(products::approve_product),
        )
        .route("/admin/products/:id/reject", post(products::reject_product))
        .route("/admin/verifications", get(verification::list_queue))
        .route(
            "/admin/verifications/:id/approve",
            post(verification::approve),
        )
        .route(
            "/admin/verifications/:id/reject",
            post(verification::reject),
        )
        .route(
            "/admin/reviews/:id",
            axum::routing::delete(reviews::delete_review),
        )
        .route("/admin/stats", get(admin::stats))
        .route("/admin/notifications/costs", get(notifications::cost_report))
        .route("/admin/broadcast", post(notifications::broadcast))
        .layer(middleware::from_fn(auth::admin_middleware));

    let protected_routes = Router::new()
        .route("/auth/refresh", post(auth_handlers::refresh))
        // Own account
        .route("/me", get(profile::get_me).patch(profile::update_me))
        .route("/me/password", put(auth_handlers::change_password))
        .route("/me/push-token", put(profile::set_push_token))
        .route(
            "/me/addresses",
            get(profile::list_addresses).post(profile::add_address),
        )
        .route(
            "/me/addresses/:id",
            patch(profile::update_address).delete(profile::delete_address),
        )
        .route(
            "/me/addresses/:id/default",
            post(profile::set_default_address),
        )
        .route(
            "/me/notification-preferences",
            get(notifications::get_preferences).put(notifications::set_preferences),
        )
        // Uploads carry their own size limit
        .route(
            "/uploads/:purpose",
            post(uploads::upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        // Listings
        .route("/products", post(products::create_product))
        .route("/products/mine", get(products::list_my_products))
        .route(
            "/products/:id",
            patch(products::update_product).delete(products::delete_product),
        )
        // Offers
        .route("/products/:id/offers", post(offers::create_offer))
        .route("/offers", get(offers::list_offers))
        .route("/offers/:id", get(offers::get_offer))
        .route("/offers/:id/accept", post(offers::accept_offer))
        .route("/offers/:id/reject", post(offers::reject_offer))
        .route("/offers/:id/counter", post(offers::counter_offer))
        .route("/offers/:id/cancel", post(offers::cancel_offer))
        .route("/offers/:id/ship", post(offers::ship_offer))
        .route("/offers/:id/complete", post(offers::complete_offer))
        // Reviews
        .route("/offers/:id/review", post(reviews::create_review))
        .route(
            "/reviews/:id",
            axum::routing::delete(reviews::delete_review),
        )
        // Chat
        .route(
            "/conversations",
            get(chat::list_conversations).post(chat::start_conversation),
        )
        .route("/conversations/unread-count", get(chat::unread_count))
        .route(
            "/conversations/:id/messages",
            get(chat::list_messages).post(chat::send_message),
        )
        .route("/conversations/:id/read", post(chat::mark_read))
        // Verification
        .route("/verification", post(verification::submit))
        .route("/verification/mine", get(verification::list_mine))
        // Inbox
        .route("/notifications", get(notifications::list))
        .route(
            "/notifications/unread-count",
            get(notifications::unread_count),
        )
        .route("/notifications/:id/read", post(notifications::mark_read))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .merge(admin_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    let app = Router::new()
        // Health check (no auth)
        .route("/health", get(health))
        // Public marketplace reads
        .route("/products", get(products::search_products))
        .route("/products/:id", get(products::get_product))
        .route("/users/:id", get(profile::get_public_profile))
        .route("/users/:id/reviews", get(reviews::list_user_reviews))
        .route("/users/:id/rating", get(reviews::get_user_rating))
        // Merge rate-limited routes
        .merge(rate_limited_routes)
        // Protected routes
        .nest("/", protected_routes)
        // Middleware
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}
