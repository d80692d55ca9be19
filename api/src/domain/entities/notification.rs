//! Notification domain entities
//!
//! Channels, urgency classes, per-user channel preferences, and the
//! persisted notification record (which doubles as the delivery cost log).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

/// Unique identifier for a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub Uuid);

impl From<Uuid> for NotificationId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Delivery channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Sms,
    Push,
    Email,
    InApp,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::Sms, Channel::Push, Channel::Email, Channel::InApp];

    /// Estimated cost of one send in INR
    pub fn estimated_cost(&self) -> f64 {
        match self {
            Channel::Sms => 0.25,
            Channel::Email => 0.02,
            Channel::Push => 0.01,
            Channel::InApp => 0.0,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Sms => write!(f, "sms"),
            Channel::Push => write!(f, "push"),
            Channel::Email => write!(f, "email"),
            Channel::InApp => write!(f, "in_app"),
        }
    }
}

impl std::str::FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sms" => Ok(Channel::Sms),
            "push" => Ok(Channel::Push),
            "email" => Ok(Channel::Email),
            "in_app" => Ok(Channel::InApp),
            _ => Err(format!("Unknown channel: {}", s)),
        }
    }
}

/// How urgently a notification must reach the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Critical,
    Important,
    Regular,
    Bulk,
}

impl Urgency {
    pub const ALL: [Urgency; 4] = [
        Urgency::Critical,
        Urgency::Important,
        Urgency::Regular,
        Urgency::Bulk,
    ];

    /// Preferred channel and the fallback used when it is disabled
    pub fn channel_order(&self) -> (Channel, Channel) {
        match self {
            Urgency::Critical => (Channel::Sms, Channel::Push),
            Urgency::Important => (Channel::Push, Channel::Email),
            Urgency::Regular => (Channel::InApp, Channel::Email),
            Urgency::Bulk => (Channel::Email, Channel::InApp),
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Urgency::Critical => write!(f, "critical"),
            Urgency::Important => write!(f, "important"),
            Urgency::Regular => write!(f, "regular"),
            Urgency::Bulk => write!(f, "bulk"),
        }
    }
}

impl std::str::FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Urgency::Critical),
            "important" => Ok(Urgency::Important),
            "regular" => Ok(Urgency::Regular),
            "bulk" => Ok(Urgency::Bulk),
            _ => Err(format!("Unknown urgency: {}", s)),
        }
    }
}

/// What the notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OfferReceived,
    OfferUpdated,
    NewMessage,
    ReviewReceived,
    ProductModerated,
    VerificationSubmitted,
    VerificationUpdated,
    PasswordReset,
    AccountStatus,
    Announcement,
}

impl NotificationKind {
    /// Urgency used when the caller does not override it
    pub fn default_urgency(&self) -> Urgency {
        match self {
            NotificationKind::PasswordReset | NotificationKind::AccountStatus => Urgency::Critical,
            NotificationKind::OfferReceived
            | NotificationKind::ProductModerated
            | NotificationKind::VerificationSubmitted
            | NotificationKind::VerificationUpdated => Urgency::Important,
            NotificationKind::OfferUpdated
            | NotificationKind::NewMessage
            | NotificationKind::ReviewReceived => Urgency::Regular,
            NotificationKind::Announcement => Urgency::Bulk,
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationKind::OfferReceived => "offer_received",
            NotificationKind::OfferUpdated => "offer_updated",
            NotificationKind::NewMessage => "new_message",
            NotificationKind::ReviewReceived => "review_received",
            NotificationKind::ProductModerated => "product_moderated",
            NotificationKind::VerificationSubmitted => "verification_submitted",
            NotificationKind::VerificationUpdated => "verification_updated",
            NotificationKind::PasswordReset => "password_reset",
            NotificationKind::AccountStatus => "account_status",
            NotificationKind::Announcement => "announcement",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "offer_received" => Ok(NotificationKind::OfferReceived),
            "offer_updated" => Ok(NotificationKind::OfferUpdated),
            "new_message" => Ok(NotificationKind::NewMessage),
            "review_received" => Ok(NotificationKind::ReviewReceived),
            "product_moderated" => Ok(NotificationKind::ProductModerated),
            "verification_submitted" => Ok(NotificationKind::VerificationSubmitted),
            "verification_updated" => Ok(NotificationKind::VerificationUpdated),
            "password_reset" => Ok(NotificationKind::PasswordReset),
            "account_status" => Ok(NotificationKind::AccountStatus),
            "announcement" => Ok(NotificationKind::Announcement),
            _ => Err(format!("Unknown notification kind: {}", s)),
        }
    }
}

/// A user's settings for one channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelPreference {
    pub enabled: bool,
    /// Kinds this channel may carry; empty means all kinds
    #[serde(default)]
    pub allowed_types: Vec<NotificationKind>,
}

impl Default for ChannelPreference {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_types: Vec::new(),
        }
    }
}

impl ChannelPreference {
    pub fn allows(&self, kind: NotificationKind) -> bool {
        self.enabled && (self.allowed_types.is_empty() || self.allowed_types.contains(&kind))
    }
}

/// Per-user channel preference map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    #[serde(default)]
    pub channels: BTreeMap<Channel, ChannelPreference>,
}

impl NotificationPreferences {
    /// Everything enabled for every kind
    pub fn all_enabled() -> Self {
        Self {
            channels: Channel::ALL
                .iter()
                .map(|c| (*c, ChannelPreference::default()))
                .collect(),
        }
    }

    /// Whether `channel` may carry a notification of `kind`. Channels with
    /// no stored preference are treated as enabled for everything.
    pub fn allows(&self, channel: Channel, kind: NotificationKind) -> bool {
        self.channels
            .get(&channel)
            .map(|p| p.allows(kind))
            .unwrap_or(true)
    }

    pub fn with_channel(mut self, channel: Channel, enabled: bool) -> Self {
        self.channels.insert(
            channel,
            ChannelPreference {
                enabled,
                allowed_types: Vec::new(),
            },
        );
        self
    }
}

/// A persisted notification; also the delivery cost log
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub urgency: Urgency,
    /// Channel the notification was actually delivered on
    pub channel: Channel,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
    pub estimated_cost: f64,
    /// True when the selected channel failed or was rate limited and the
    /// notification fell back to in-app
    pub downgraded: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Data needed to persist a notification
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub urgency: Urgency,
    pub channel: Channel,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
    pub estimated_cost: f64,
    pub downgraded: bool,
}

/// A notification a service wants delivered; the channel is chosen later
#[derive(Debug, Clone)]
pub struct OutgoingNotification {
    pub kind: NotificationKind,
    pub urgency: Urgency,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

impl OutgoingNotification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind,
            urgency: kind.default_urgency(),
            title: title.into(),
            body: body.into(),
            data: serde_json::Value::Null,
        }
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// Per-channel spend over a time window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelCost {
    pub channel: Channel,
    pub sent: u64,
    pub total_cost: f64,
}
