//! Notification channel selection
//!
//! Picks exactly one delivery channel for a notification from its urgency and
//! the recipient's preferences, then applies a per-user, per-channel sliding
//! window limit. Anything over the limit goes in-app, which is free and
//! unlimited.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::cache::TtlCache;
use crate::domain::entities::{Channel, NotificationKind, NotificationPreferences, Urgency, UserId};

/// Why a channel was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    /// The urgency's preferred channel
    Preferred,
    /// Preferred channel disabled by the user
    Fallback,
    /// Chosen channel was over its window limit
    RateLimited,
}

impl std::fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionReason::Preferred => write!(f, "preferred"),
            SelectionReason::Fallback => write!(f, "fallback"),
            SelectionReason::RateLimited => write!(f, "rate_limited"),
        }
    }
}

/// Outcome of channel selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub channel: Channel,
    pub reason: SelectionReason,
    pub estimated_cost: f64,
}

impl Selection {
    fn new(channel: Channel, reason: SelectionReason) -> Self {
        Self {
            channel,
            reason,
            estimated_cost: channel.estimated_cost(),
        }
    }
}

/// Apply the urgency policy to a user's preferences.
///
/// The preferred channel is used when the user allows it for this kind;
/// otherwise the urgency's fallback channel is used unconditionally so the
/// notification always has somewhere to go.
pub fn preferred_channel(
    urgency: Urgency,
    kind: NotificationKind,
    preferences: &NotificationPreferences,
) -> (Channel, SelectionReason) {
    let (preferred, fallback) = urgency.channel_order();
    if preferences.allows(preferred, kind) {
        (preferred, SelectionReason::Preferred)
    } else {
        (fallback, SelectionReason::Fallback)
    }
}

/// Maximum sends per window for each paid channel
#[derive(Debug, Clone, Copy)]
pub struct ChannelLimits {
    pub sms: usize,
    pub push: usize,
    pub email: usize,
    pub window: Duration,
}

impl ChannelLimits {
    /// `None` means unlimited
    pub fn limit_for(&self, channel: Channel) -> Option<usize> {
        match channel {
            Channel::Sms => Some(self.sms),
            Channel::Push => Some(self.push),
            Channel::Email => Some(self.email),
            Channel::InApp => None,
        }
    }
}

impl Default for ChannelLimits {
    fn default() -> Self {
        Self {
            sms: 3,
            push: 30,
            email: 20,
            window: Duration::hours(1),
        }
    }
}

/// Most (recipient, channel) windows tracked at once
const MAX_TRACKED_WINDOWS: u64 = 100_000;

type SendLog = Arc<Mutex<VecDeque<DateTime<Utc>>>>;

/// Sliding-window send log keyed by (recipient, channel)
///
/// A window untouched for a full period holds no live sends and is dropped.
/// Under capacity pressure the least used windows are evicted first, which
/// forgets their sends.
pub struct RateLimiter {
    limits: ChannelLimits,
    windows: TtlCache<(UserId, Channel), SendLog>,
}

impl RateLimiter {
    pub fn new(limits: ChannelLimits) -> Self {
        let idle = limits
            .window
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(3600));
        Self {
            limits,
            windows: TtlCache::idle(MAX_TRACKED_WINDOWS, idle),
        }
    }

    /// Record a send at `now` if the window has room. Returns false, and
    /// records nothing, when the limit is already reached.
    pub fn try_acquire(&self, user_id: &UserId, channel: Channel, now: DateTime<Utc>) -> bool {
        let Some(limit) = self.limits.limit_for(channel) else {
            return true;
        };

        let log = self.windows.get_with((*user_id, channel), SendLog::default);
        let mut log = log.lock().unwrap_or_else(PoisonError::into_inner);
        let cutoff = now - self.limits.window;
        while log.front().is_some_and(|t| *t <= cutoff) {
            log.pop_front();
        }

        if log.len() >= limit {
            return false;
        }
        log.push_back(now);
        true
    }

    /// Give back a send recorded at `at` that never went out
    pub fn release(&self, user_id: &UserId, channel: Channel, at: DateTime<Utc>) {
        if self.limits.limit_for(channel).is_none() {
            return;
        }
        let Some(log) = self.windows.get(&(*user_id, channel)) else {
            return;
        };
        let mut log = log.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pos) = log.iter().rposition(|t| *t == at) {
            log.remove(pos);
        }
    }
}

/// Urgency policy plus rate limiting
pub struct ChannelSelector {
    limiter: RateLimiter,
}

impl ChannelSelector {
    pub fn new(limits: ChannelLimits) -> Self {
        Self {
            limiter: RateLimiter::new(limits),
        }
    }

    /// Choose the channel for one notification to `user_id`
    pub fn select(
        &self,
        user_id: &UserId,
        urgency: Urgency,
        kind: NotificationKind,
        preferences: &NotificationPreferences,
        now: DateTime<Utc>,
    ) -> Selection {
        let (channel, reason) = preferred_channel(urgency, kind, preferences);
        if self.limiter.try_acquire(user_id, channel, now) {
            Selection::new(channel, reason)
        } else {
            Selection::new(Channel::InApp, SelectionReason::RateLimited)
        }
    }

    /// Undo the rate-limit charge of a selection made at `at` whose delivery
    /// failed, so only sends that went out count against the window.
    pub fn release(&self, user_id: &UserId, selection: &Selection, at: DateTime<Utc>) {
        if selection.reason != SelectionReason::RateLimited {
            self.limiter.release(user_id, selection.channel, at);
        }
    }
}
