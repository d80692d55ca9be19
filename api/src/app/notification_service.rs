//! Notification service
//!
//! Chooses a delivery channel for each notification, attempts delivery, and
//! persists the outcome. Also serves the user's inbox, preferences, and the
//! admin cost and broadcast views.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::domain::channel_selector::{ChannelLimits, ChannelSelector, SelectionReason};
use crate::domain::entities::{
    Channel, ChannelCost, NewNotification, Notification, NotificationId, NotificationKind,
    NotificationPreferences, OutgoingNotification, Role, User, UserId,
};
use crate::domain::ports::{
    EmailSender, NotificationRepository, Notify, PreferenceRepository, PushSender, SmsGateway,
    UserRepository,
};
use crate::error::{AppError, DeliveryError, DomainError};

/// Largest page of inbox items returned at once
const MAX_PAGE: u64 = 100;

pub struct NotificationService<UR, NR, PR, S, E, P>
where
    UR: UserRepository,
    NR: NotificationRepository,
    PR: PreferenceRepository,
    S: SmsGateway,
    E: EmailSender,
    P: PushSender,
{
    users: Arc<UR>,
    notifications: Arc<NR>,
    preferences: Arc<PR>,
    sms: Arc<S>,
    email: Arc<E>,
    push: Arc<P>,
    selector: ChannelSelector,
}

impl<UR, NR, PR, S, E, P> NotificationService<UR, NR, PR, S, E, P>
where
    UR: UserRepository,
    NR: NotificationRepository,
    PR: PreferenceRepository,
    S: SmsGateway,
    E: EmailSender,
    P: PushSender,
{
    pub fn new(
        users: Arc<UR>,
        notifications: Arc<NR>,
        preferences: Arc<PR>,
        sms: Arc<S>,
        email: Arc<E>,
        push: Arc<P>,
        limits: ChannelLimits,
    ) -> Self {
        Self {
            users,
            notifications,
            preferences,
            sms,
            email,
            push,
            selector: ChannelSelector::new(limits),
        }
    }

    /// Hand the message to the provider for `channel`
    async fn deliver(
        &self,
        user: &User,
        channel: Channel,
        notification: &OutgoingNotification,
    ) -> Result<(), DeliveryError> {
        match channel {
            Channel::Sms => {
                let phone = user
                    .phone
                    .as_deref()
                    .ok_or(DeliveryError::MissingRecipient("phone number"))?;
                let text = format!("{}: {}", notification.title, notification.body);
                self.sms.send_sms(phone, &text).await
            }
            Channel::Push => {
                let token = user
                    .push_token
                    .as_deref()
                    .ok_or(DeliveryError::MissingRecipient("push token"))?;
                self.push
                    .send_push(
                        token,
                        &notification.title,
                        &notification.body,
                        &notification.data,
                    )
                    .await
            }
            Channel::Email => {
                self.email
                    .send_email(&user.email, &notification.title, &notification.body)
                    .await
            }
            Channel::InApp => Ok(()),
        }
    }

    /// Stored preferences, or everything enabled when the user never saved any
    pub async fn get_preferences(
        &self,
        user_id: &UserId,
    ) -> Result<NotificationPreferences, AppError> {
        Ok(self
            .preferences
            .get(user_id)
            .await?
            .unwrap_or_else(NotificationPreferences::all_enabled))
    }

    /// Replace the user's preferences wholesale
    pub async fn set_preferences(
        &self,
        user_id: &UserId,
        preferences: NotificationPreferences,
    ) -> Result<NotificationPreferences, AppError> {
        self.preferences.upsert(user_id, &preferences).await?;
        Ok(preferences)
    }

    pub async fn list(
        &self,
        user_id: &UserId,
        unread_only: bool,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Notification>, AppError> {
        Ok(self
            .notifications
            .list_for_user(user_id, unread_only, limit.clamp(1, MAX_PAGE), offset)
            .await?)
    }

    pub async fn unread_count(&self, user_id: &UserId) -> Result<u64, AppError> {
        Ok(self.notifications.unread_count(user_id).await?)
    }

    pub async fn mark_read(&self, id: &NotificationId, user_id: &UserId) -> Result<(), AppError> {
        if !self.notifications.mark_read(id, user_id).await? {
            return Err(AppError::NotFound(format!("Notification {} not found", id)));
        }
        Ok(())
    }

    pub async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, AppError> {
        Ok(self.notifications.mark_all_read(user_id).await?)
    }

    /// Per-channel send counts and estimated spend over the last `hours`
    pub async fn cost_summary(&self, hours: i64) -> Result<Vec<ChannelCost>, AppError> {
        if !(1..=24 * 90).contains(&hours) {
            return Err(AppError::BadRequest(
                "hours must be between 1 and 2160".to_string(),
            ));
        }
        let since = Utc::now() - Duration::hours(hours);
        Ok(self.notifications.cost_summary(since).await?)
    }

    /// Bulk announcement to every non-banned user, optionally one role only.
    /// Returns how many notifications were recorded.
    pub async fn broadcast(
        &self,
        role: Option<Role>,
        title: &str,
        body: &str,
    ) -> Result<u64, AppError> {
        let title = title.trim();
        let body = body.trim();
        if title.is_empty() || body.is_empty() {
            return Err(AppError::BadRequest(
                "title and body are required".to_string(),
            ));
        }

        let recipients = self.users.find_active_ids(role).await?;
        let mut recorded = 0;
        for user_id in &recipients {
            let notification =
                OutgoingNotification::new(NotificationKind::Announcement, title, body);
            match self.notify(user_id, notification).await {
                Ok(_) => recorded += 1,
                Err(e) => {
                    tracing::warn!(error = %e, user_id = %user_id, "Broadcast skipped user")
                }
            }
        }

        tracing::info!(
            role = ?role,
            recipients = recipients.len(),
            recorded,
            "Broadcast sent"
        );
        Ok(recorded)
    }
}

#[async_trait]
impl<UR, NR, PR, S, E, P> Notify for NotificationService<UR, NR, PR, S, E, P>
where
    UR: UserRepository,
    NR: NotificationRepository,
    PR: PreferenceRepository,
    S: SmsGateway,
    E: EmailSender,
    P: PushSender,
{
    async fn notify(
        &self,
        user_id: &UserId,
        notification: OutgoingNotification,
    ) -> Result<Notification, DomainError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("User {} not found", user_id)))?;

        let preferences = self
            .preferences
            .get(user_id)
            .await?
            .unwrap_or_else(NotificationPreferences::all_enabled);

        let now = Utc::now();
        let selection = self.selector.select(
            user_id,
            notification.urgency,
            notification.kind,
            &preferences,
            now,
        );

        let (channel, estimated_cost, downgraded) =
            match self.deliver(&user, selection.channel, &notification).await {
                Ok(()) => (
                    selection.channel,
                    selection.estimated_cost,
                    selection.reason == SelectionReason::RateLimited,
                ),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        user_id = %user_id,
                        channel = %selection.channel,
                        "Delivery failed, downgrading to in-app"
                    );
                    self.selector.release(user_id, &selection, now);
                    (Channel::InApp, Channel::InApp.estimated_cost(), true)
                }
            };

        let stored = self
            .notifications
            .create(&NewNotification {
                user_id: *user_id,
                kind: notification.kind,
                urgency: notification.urgency,
                channel,
                title: notification.title,
                body: notification.body,
                data: notification.data,
                estimated_cost,
                downgraded,
            })
            .await?;

        tracing::info!(
            user_id = %user_id,
            kind = %stored.kind,
            urgency = %stored.urgency,
            channel = %stored.channel,
            estimated_cost = stored.estimated_cost,
            reason = %selection.reason,
            downgraded = stored.downgraded,
            "Notification sent"
        );

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Urgency;
    use crate::test_utils::{
        test_user, InMemoryNotificationRepository, InMemoryPreferenceRepository,
        InMemoryUserRepository, MockEmailSender, MockPushSender, MockSmsGateway,
    };

    type TestService = NotificationService<
        InMemoryUserRepository,
        InMemoryNotificationRepository,
        InMemoryPreferenceRepository,
        MockSmsGateway,
        MockEmailSender,
        MockPushSender,
    >;

    struct Harness {
        service: TestService,
        notifications: Arc<InMemoryNotificationRepository>,
        preferences: Arc<InMemoryPreferenceRepository>,
        sms: MockSmsGateway,
        email: MockEmailSender,
        push: MockPushSender,
    }

    fn harness(users: Vec<User>, sms: MockSmsGateway, limits: ChannelLimits) -> Harness {
        let mut user_repo = InMemoryUserRepository::new();
        for user in users {
            user_repo = user_repo.with_user(user);
        }
        let notifications = Arc::new(InMemoryNotificationRepository::new());
        let preferences = Arc::new(InMemoryPreferenceRepository::new());
        let email = MockEmailSender::new();
        let push = MockPushSender::new();

        let service = NotificationService::new(
            Arc::new(user_repo),
            notifications.clone(),
            preferences.clone(),
            Arc::new(sms.clone()),
            Arc::new(email.clone()),
            Arc::new(push.clone()),
            limits,
        );

        Harness {
            service,
            notifications,
            preferences,
            sms,
            email,
            push,
        }
    }

    fn reset_code() -> OutgoingNotification {
        OutgoingNotification::new(
            NotificationKind::PasswordReset,
            "Password reset",
            "Your code is 123456",
        )
    }

    #[tokio::test]
    async fn critical_goes_by_sms() {
        let user = test_user("Ravi", Role::Farmer);
        let h = harness(vec![user.clone()], MockSmsGateway::new(), ChannelLimits::default());

        let stored = h.service.notify(&user.id, reset_code()).await.unwrap();

        assert_eq!(stored.channel, Channel::Sms);
        assert_eq!(stored.estimated_cost, 0.25);
        assert!(!stored.downgraded);
        let sent = h.sms.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, user.phone.clone().unwrap());
        assert!(sent[0].1.contains("123456"));
    }

    #[tokio::test]
    async fn sms_disabled_falls_back_to_push() {
        let mut user = test_user("Ravi", Role::Farmer);
        user.push_token = Some("device-1".to_string());
        let h = harness(vec![user.clone()], MockSmsGateway::new(), ChannelLimits::default());
        h.preferences
            .upsert(
                &user.id,
                &NotificationPreferences::all_enabled().with_channel(Channel::Sms, false),
            )
            .await
            .unwrap();

        let stored = h.service.notify(&user.id, reset_code()).await.unwrap();

        assert_eq!(stored.channel, Channel::Push);
        assert!(h.sms.sent().is_empty());
        assert_eq!(h.push.sent().len(), 1);
    }

    #[tokio::test]
    async fn gateway_failure_downgrades_to_in_app() {
        let user = test_user("Ravi", Role::Farmer);
        let h = harness(
            vec![user.clone()],
            MockSmsGateway::failing(),
            ChannelLimits::default(),
        );

        let stored = h.service.notify(&user.id, reset_code()).await.unwrap();

        assert_eq!(stored.channel, Channel::InApp);
        assert_eq!(stored.estimated_cost, 0.0);
        assert!(stored.downgraded);
        assert_eq!(h.notifications.all().len(), 1);
    }

    #[tokio::test]
    async fn failed_sends_do_not_use_up_the_window() {
        let user = test_user("Ravi", Role::Farmer);
        let limits = ChannelLimits {
            sms: 1,
            ..ChannelLimits::default()
        };
        let h = harness(vec![user.clone()], MockSmsGateway::failing(), limits);

        for _ in 0..3 {
            let stored = h.service.notify(&user.id, reset_code()).await.unwrap();
            assert_eq!(stored.channel, Channel::InApp);
            assert!(stored.downgraded);
        }
        assert_eq!(h.sms.attempts(), 3);
    }

    #[tokio::test]
    async fn missing_push_token_downgrades() {
        let user = test_user("Meera", Role::Buyer);
        let h = harness(vec![user.clone()], MockSmsGateway::new(), ChannelLimits::default());

        let offer = OutgoingNotification::new(
            NotificationKind::OfferReceived,
            "New offer",
            "Someone wants your onions",
        );
        let stored = h.service.notify(&user.id, offer).await.unwrap();

        assert_eq!(stored.urgency, Urgency::Important);
        assert_eq!(stored.channel, Channel::InApp);
        assert!(stored.downgraded);
        assert!(h.push.sent().is_empty());
    }

    #[tokio::test]
    async fn rate_limit_forces_in_app_at_zero_cost() {
        let user = test_user("Ravi", Role::Farmer);
        let limits = ChannelLimits {
            sms: 2,
            ..ChannelLimits::default()
        };
        let h = harness(vec![user.clone()], MockSmsGateway::new(), limits);

        for _ in 0..2 {
            let stored = h.service.notify(&user.id, reset_code()).await.unwrap();
            assert_eq!(stored.channel, Channel::Sms);
        }
        let third = h.service.notify(&user.id, reset_code()).await.unwrap();

        assert_eq!(third.channel, Channel::InApp);
        assert_eq!(third.estimated_cost, 0.0);
        assert!(third.downgraded);
        assert_eq!(h.sms.sent().len(), 2);
    }

    #[tokio::test]
    async fn bulk_goes_by_email() {
        let user = test_user("Meera", Role::Buyer);
        let h = harness(vec![user.clone()], MockSmsGateway::new(), ChannelLimits::default());

        let count = h
            .service
            .broadcast(None, "Mandi prices", "Wheat is up 3%")
            .await
            .unwrap();

        assert_eq!(count, 1);
        let sent = h.email.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, user.email);
        assert_eq!(sent[0].1, "Mandi prices");
    }

    #[tokio::test]
    async fn broadcast_skips_banned_and_filters_role() {
        let farmer = test_user("Ravi", Role::Farmer);
        let buyer = test_user("Meera", Role::Buyer);
        let mut banned = test_user("Spam", Role::Farmer);
        banned.is_banned = true;
        let h = harness(
            vec![farmer.clone(), buyer, banned],
            MockSmsGateway::new(),
            ChannelLimits::default(),
        );

        let count = h
            .service
            .broadcast(Some(Role::Farmer), "Seed subsidy", "Apply before Friday")
            .await
            .unwrap();

        assert_eq!(count, 1);
        let stored = h.notifications.all();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].user_id, farmer.id);
    }

    #[tokio::test]
    async fn broadcast_requires_text() {
        let h = harness(vec![], MockSmsGateway::new(), ChannelLimits::default());
        let err = h.service.broadcast(None, " ", "body").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let h = harness(vec![], MockSmsGateway::new(), ChannelLimits::default());
        let err = h.service.notify(&UserId::new(), reset_code()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn inbox_read_flow() {
        let user = test_user("Meera", Role::Buyer);
        let other = test_user("Ravi", Role::Farmer);
        let h = harness(
            vec![user.clone(), other.clone()],
            MockSmsGateway::new(),
            ChannelLimits::default(),
        );

        let message = || {
            OutgoingNotification::new(NotificationKind::NewMessage, "New message", "Hello")
        };
        let first = h.service.notify(&user.id, message()).await.unwrap();
        h.service.notify(&user.id, message()).await.unwrap();

        assert_eq!(first.channel, Channel::InApp);
        assert_eq!(h.service.unread_count(&user.id).await.unwrap(), 2);

        // Someone else's id is not found
        let err = h.service.mark_read(&first.id, &other.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        h.service.mark_read(&first.id, &user.id).await.unwrap();
        let unread = h.service.list(&user.id, true, 20, 0).await.unwrap();
        assert_eq!(unread.len(), 1);

        assert_eq!(h.service.mark_all_read(&user.id).await.unwrap(), 1);
        assert_eq!(h.service.unread_count(&user.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn preferences_default_to_all_enabled() {
        let user = test_user("Meera", Role::Buyer);
        let h = harness(vec![user.clone()], MockSmsGateway::new(), ChannelLimits::default());

        let prefs = h.service.get_preferences(&user.id).await.unwrap();
        assert_eq!(prefs, NotificationPreferences::all_enabled());

        let updated = NotificationPreferences::all_enabled().with_channel(Channel::Email, false);
        h.service
            .set_preferences(&user.id, updated.clone())
            .await
            .unwrap();
        assert_eq!(h.service.get_preferences(&user.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn cost_summary_totals_by_channel() {
        let user = test_user("Ravi", Role::Farmer);
        let h = harness(vec![user.clone()], MockSmsGateway::new(), ChannelLimits::default());

        h.service.notify(&user.id, reset_code()).await.unwrap();
        h.service.notify(&user.id, reset_code()).await.unwrap();

        let costs = h.service.cost_summary(24).await.unwrap();
        let sms = costs.iter().find(|c| c.channel == Channel::Sms).unwrap();
        assert_eq!(sms.sent, 2);
        assert!((sms.total_cost - 0.5).abs() < 1e-9);

        assert!(h.service.cost_summary(0).await.is_err());
    }
}
