//! Cross-service flows
//!
//! Every service is wired the way `main` wires them, with the real
//! notification pipeline, in-memory repositories and recording providers.
//!
//! Run with: cargo test integration_tests

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::app::{
        AdminDirectory, AdminService, AssetService, AuthService, CdnUrls, ChatService,
        NotificationService, OfferInput, OfferService, ProductInput, ProductService,
        ProfileService, Registration, ReviewService, VerificationService,
    };
    use crate::domain::channel_selector::ChannelLimits;
    use crate::domain::entities::{
        AssetPurpose, Channel, DocumentType, Notification, NotificationKind, OfferAction,
        OfferStatus, ProductQuery, ProductStatus, Role, Unit, User, UserId,
    };
    use crate::domain::ports::{ChatRepository, UserRepository};
    use crate::error::AppError;
    use crate::test_utils::{
        test_user, InMemoryAddressRepository, InMemoryChatRepository,
        InMemoryNotificationRepository, InMemoryOfferRepository, InMemoryPreferenceRepository,
        InMemoryProductRepository, InMemoryReviewRepository, InMemoryUserRepository,
        InMemoryVerificationRepository, MockEmailSender, MockObjectStore, MockPushSender,
        MockSmsGateway,
    };

    type Notifier = NotificationService<
        InMemoryUserRepository,
        InMemoryNotificationRepository,
        InMemoryPreferenceRepository,
        MockSmsGateway,
        MockEmailSender,
        MockPushSender,
    >;

    struct World {
        users: Arc<InMemoryUserRepository>,
        chats: Arc<InMemoryChatRepository>,
        notifications: Arc<InMemoryNotificationRepository>,
        sms: Arc<MockSmsGateway>,
        push: Arc<MockPushSender>,
        auth: AuthService<InMemoryUserRepository, Notifier>,
        profiles: ProfileService<InMemoryUserRepository, InMemoryAddressRepository>,
        assets: Arc<AssetService<MockObjectStore>>,
        listings: ProductService<
            InMemoryProductRepository,
            InMemoryOfferRepository,
            Notifier,
            MockObjectStore,
        >,
        offers: OfferService<InMemoryOfferRepository, InMemoryProductRepository, Notifier>,
        chat: ChatService<
            InMemoryChatRepository,
            InMemoryUserRepository,
            InMemoryProductRepository,
            Notifier,
        >,
        reviews: ReviewService<InMemoryReviewRepository, InMemoryOfferRepository, Notifier>,
        verification:
            VerificationService<InMemoryVerificationRepository, InMemoryUserRepository, Notifier>,
        admin: AdminService<
            InMemoryUserRepository,
            InMemoryProductRepository,
            InMemoryOfferRepository,
            InMemoryVerificationRepository,
            Notifier,
        >,
        admin_user: User,
    }

    fn world_with_sms(sms: MockSmsGateway) -> World {
        let admin_user = test_user("Admin", Role::Admin);
        let users = Arc::new(InMemoryUserRepository::new().with_user(admin_user.clone()));
        let products = Arc::new(InMemoryProductRepository::new());
        let offers = Arc::new(InMemoryOfferRepository::new(&products));
        let chats = Arc::new(InMemoryChatRepository::new());
        let reviews = Arc::new(InMemoryReviewRepository::new());
        let verifications = Arc::new(InMemoryVerificationRepository::new());
        let notifications = Arc::new(InMemoryNotificationRepository::new());
        let sms = Arc::new(sms);
        let push = Arc::new(MockPushSender::new());

        let notifier = Arc::new(NotificationService::new(
            users.clone(),
            notifications.clone(),
            Arc::new(InMemoryPreferenceRepository::new()),
            sms.clone(),
            Arc::new(MockEmailSender::new()),
            push.clone(),
            ChannelLimits {
                sms: 5,
                push: 30,
                email: 20,
                window: chrono::Duration::hours(1),
            },
        ));
        let admins = Arc::new(AdminDirectory::new(users.clone(), Duration::from_secs(60)));
        let assets = Arc::new(AssetService::new(
            Arc::new(MockObjectStore::new()),
            CdnUrls::new("cdn.agrilink.in"),
            1024 * 1024,
        ));

        World {
            auth: AuthService::new(
                users.clone(),
                notifier.clone(),
                crate::auth::JwtKeys::new("integration-secret", 1),
                "integration-secret".to_string(),
            ),
            profiles: ProfileService::new(
                users.clone(),
                Arc::new(InMemoryAddressRepository::new()),
            ),
            listings: ProductService::new(
                products.clone(),
                offers.clone(),
                notifier.clone(),
                assets.clone(),
            ),
            offers: OfferService::new(offers.clone(), products.clone(), notifier.clone()),
            chat: ChatService::new(
                chats.clone(),
                users.clone(),
                products.clone(),
                notifier.clone(),
            ),
            reviews: ReviewService::new(reviews, offers.clone(), notifier.clone()),
            verification: VerificationService::new(
                verifications.clone(),
                users.clone(),
                admins.clone(),
                notifier.clone(),
            ),
            admin: AdminService::new(
                users.clone(),
                products.clone(),
                offers,
                verifications,
                admins,
                notifier,
            ),
            users,
            chats,
            notifications,
            sms,
            push,
            assets,
            admin_user,
        }
    }

    fn world() -> World {
        world_with_sms(MockSmsGateway::new())
    }

    impl World {
        async fn register(&self, name: &str, role: Role, phone: &str) -> User {
            let (user, _) = self
                .auth
                .register(Registration {
                    email: format!("{}@example.in", name.to_lowercase()),
                    password: "harvest-2024".to_string(),
                    full_name: name.to_string(),
                    phone: Some(phone.to_string()),
                    role,
                })
                .await
                .unwrap();
            user
        }

        async fn reload(&self, user: &User) -> User {
            self.users.find_by_id(&user.id).await.unwrap().unwrap()
        }

        fn inbox(&self, user_id: &UserId) -> Vec<Notification> {
            self.notifications
                .all()
                .into_iter()
                .filter(|n| n.user_id == *user_id)
                .collect()
        }

        fn kinds(&self, user_id: &UserId) -> Vec<NotificationKind> {
            self.inbox(user_id).into_iter().map(|n| n.kind).collect()
        }
    }

    fn onions() -> ProductInput {
        ProductInput {
            title: "Nashik red onions".to_string(),
            description: Some("Rabi crop, graded".to_string()),
            category: "Vegetables".to_string(),
            unit: Unit::Quintal,
            price_cents: 180_000,
            quantity_available: 40.0,
            location: Some("Lasalgaon".to_string()),
            organic: false,
            harvest_date: None,
            image_keys: Vec::new(),
        }
    }

    #[tokio::test]
    async fn listing_to_review() {
        let w = world();
        let farmer = w.register("Ravi", Role::Farmer, "+919812345601").await;
        let buyer = w.register("Meera", Role::Buyer, "+919812345602").await;

        // Unverified sellers wait for moderation
        let listing = w.listings.create(&farmer, onions()).await.unwrap();
        assert_eq!(listing.status, ProductStatus::PendingReview);
        assert_eq!(listing.category, "vegetables");
        assert!(w
            .listings
            .search(ProductQuery::marketplace())
            .await
            .unwrap()
            .is_empty());

        w.listings.approve(&w.admin_user, &listing.id).await.unwrap();
        let found = w
            .listings
            .search(ProductQuery {
                text: Some("onion".to_string()),
                ..ProductQuery::marketplace()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        // Negotiate
        let offer = w
            .offers
            .create(
                &buyer,
                &listing.id,
                OfferInput {
                    quantity: 10.0,
                    price_cents: 170_000,
                    message: Some("Can collect from Lasalgaon".to_string()),
                },
            )
            .await
            .unwrap();
        w.offers
            .act(&farmer, &offer.id, OfferAction::Counter { price_cents: 175_000 })
            .await
            .unwrap();
        let accepted = w
            .offers
            .act(&buyer, &offer.id, OfferAction::Accept)
            .await
            .unwrap();
        assert_eq!(accepted.status, OfferStatus::Accepted);
        assert_eq!(accepted.agreed_price_cents(), 175_000);

        let stocked = w.listings.get(&listing.id, None).await.unwrap();
        assert_eq!(stocked.quantity_available, 30.0);

        // Fulfil
        w.offers
            .act(&farmer, &offer.id, OfferAction::Ship)
            .await
            .unwrap();
        let completed = w
            .offers
            .act(&buyer, &offer.id, OfferAction::Complete)
            .await
            .unwrap();
        assert_eq!(completed.status, OfferStatus::Completed);

        // Review the farmer
        let review = w
            .reviews
            .create(&buyer, &offer.id, 5, Some("Well graded".to_string()))
            .await
            .unwrap();
        assert_eq!(review.reviewee_id, farmer.id);
        let summary = w.reviews.summary(&farmer.id).await.unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.average, Some(5.0));

        let farmer_kinds = w.kinds(&farmer.id);
        assert!(farmer_kinds.contains(&NotificationKind::ProductModerated));
        assert!(farmer_kinds.contains(&NotificationKind::OfferReceived));
        assert!(farmer_kinds.contains(&NotificationKind::ReviewReceived));
        assert!(w.kinds(&buyer.id).contains(&NotificationKind::OfferUpdated));

        let stats = w.admin.stats().await.unwrap();
        assert_eq!(stats.offers_by_status["completed"], 1);
        assert_eq!(stats.products_by_status["active"], 1);
    }

    #[tokio::test]
    async fn verified_sellers_skip_moderation() {
        let w = world();
        let farmer = w.register("Sunita", Role::Farmer, "+919812345603").await;

        let document = w
            .assets
            .upload(
                &farmer.id,
                AssetPurpose::Verification,
                "application/pdf",
                b"%PDF-1.4 7/12 extract".to_vec(),
            )
            .await
            .unwrap();
        assert!(document.url.starts_with("https://cdn.agrilink.in/verification/"));

        let request = w
            .verification
            .submit(
                &farmer,
                DocumentType::FarmRegistration,
                vec![document.key],
                None,
            )
            .await
            .unwrap();
        assert!(w
            .kinds(&w.admin_user.id)
            .contains(&NotificationKind::VerificationSubmitted));

        w.verification
            .approve(&w.admin_user, &request.id, None)
            .await
            .unwrap();
        let farmer = w.reload(&farmer).await;
        assert!(farmer.is_verified);
        assert!(w
            .kinds(&farmer.id)
            .contains(&NotificationKind::VerificationUpdated));

        let listing = w.listings.create(&farmer, onions()).await.unwrap();
        assert_eq!(listing.status, ProductStatus::Active);
    }

    #[tokio::test]
    async fn password_reset_code_arrives_by_sms() {
        let w = world();
        let farmer = w.register("Ravi", Role::Farmer, "+919812345604").await;

        w.auth
            .request_password_reset("RAVI@example.in")
            .await
            .unwrap();

        let (phone, text) = w.sms.sent().pop().unwrap();
        assert_eq!(phone, "+919812345604");
        let code = text
            .split(|c: char| !c.is_ascii_digit())
            .find(|s| s.len() == 6)
            .unwrap()
            .to_string();

        let stored = w.inbox(&farmer.id);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].channel, Channel::Sms);
        assert!(!stored[0].downgraded);

        w.auth
            .confirm_password_reset("ravi@example.in", &code, "new-monsoon-pass")
            .await
            .unwrap();
        assert!(w
            .auth
            .login("ravi@example.in", "new-monsoon-pass")
            .await
            .is_ok());
        assert!(w.auth.login("ravi@example.in", "harvest-2024").await.is_err());

        // Codes are single use
        assert!(w
            .auth
            .confirm_password_reset("ravi@example.in", &code, "another-pass-1")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn sms_outage_still_leaves_an_inbox_entry() {
        let w = world_with_sms(MockSmsGateway::failing());
        let farmer = w.register("Ravi", Role::Farmer, "+919812345605").await;

        w.auth
            .request_password_reset("ravi@example.in")
            .await
            .unwrap();

        let stored = w.inbox(&farmer.id);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].channel, Channel::InApp);
        assert_eq!(stored[0].estimated_cost, 0.0);
        assert!(stored[0].downgraded);
        assert!(w.sms.sent().is_empty());
    }

    #[tokio::test]
    async fn banned_users_are_locked_out() {
        let w = world();
        let buyer = w.register("Meera", Role::Buyer, "+919812345606").await;
        let (_, token) = w
            .auth
            .login("meera@example.in", "harvest-2024")
            .await
            .unwrap();
        assert_eq!(w.auth.authenticate(&token.token).await.unwrap().id, buyer.id);

        w.admin
            .set_banned(&w.admin_user, &buyer.id, true)
            .await
            .unwrap();

        assert!(matches!(
            w.auth.authenticate(&token.token).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            w.auth.login("meera@example.in", "harvest-2024").await,
            Err(AppError::Forbidden(_))
        ));
        assert!(w.profiles.public_profile(&buyer.id).await.is_err());

        // Suspension notices are critical, so they go out by SMS
        let (phone, _) = w.sms.sent().pop().unwrap();
        assert_eq!(phone, "+919812345606");
    }

    #[tokio::test]
    async fn chat_about_a_listing() {
        let w = world();
        let farmer = w.register("Ravi", Role::Farmer, "+919812345607").await;
        let buyer = w.register("Meera", Role::Buyer, "+919812345608").await;
        let listing = w.listings.create(&farmer, onions()).await.unwrap();
        w.listings.approve(&w.admin_user, &listing.id).await.unwrap();

        let conversation = w
            .chat
            .start(&buyer, &farmer.id, Some(listing.id))
            .await
            .unwrap();
        let again = w
            .chat
            .start(&buyer, &farmer.id, Some(listing.id))
            .await
            .unwrap();
        assert_eq!(conversation.id, again.id);

        w.chat
            .send(&buyer, &conversation.id, "Is the lot still available?", None)
            .await
            .unwrap();
        assert_eq!(w.chat.unread_count(&farmer.id).await.unwrap(), 1);
        assert!(w.kinds(&farmer.id).contains(&NotificationKind::NewMessage));

        assert_eq!(
            w.chat.mark_read(&farmer.id, &conversation.id).await.unwrap(),
            1
        );
        assert_eq!(w.chat.unread_count(&farmer.id).await.unwrap(), 0);

        let stored = w
            .chats
            .find_conversation(&conversation.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.last_message_at.is_some());
    }

    #[tokio::test]
    async fn push_token_routes_important_notifications() {
        let w = world();
        let farmer = w.register("Ravi", Role::Farmer, "+919812345609").await;
        let buyer = w.register("Meera", Role::Buyer, "+919812345610").await;
        w.profiles
            .set_push_token(&farmer.id, Some("device-ravi".to_string()))
            .await
            .unwrap();

        let listing = w.listings.create(&farmer, onions()).await.unwrap();
        w.listings.approve(&w.admin_user, &listing.id).await.unwrap();
        w.offers
            .create(
                &buyer,
                &listing.id,
                OfferInput {
                    quantity: 5.0,
                    price_cents: 180_000,
                    message: None,
                },
            )
            .await
            .unwrap();

        let pushed = w.push.sent();
        assert!(pushed.iter().all(|(token, _, _)| token == "device-ravi"));
        assert_eq!(pushed.len(), 2);

        let received = w
            .inbox(&farmer.id)
            .into_iter()
            .find(|n| n.kind == NotificationKind::OfferReceived)
            .unwrap();
        assert_eq!(received.channel, Channel::Push);
        assert!(!received.downgraded);
    }
}
