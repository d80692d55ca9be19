//! Offer domain entity
//!
//! A buyer's proposed terms against a listing. The status machine lives here
//! so every handler enforces the same transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::product::ProductId;
use super::user::UserId;

/// Unique identifier for an offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OfferId(pub Uuid);

impl OfferId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OfferId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for OfferId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for OfferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Offer lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Pending,
    Countered,
    Accepted,
    Rejected,
    Cancelled,
    Shipped,
    Completed,
}

impl OfferStatus {
    pub const ALL: [OfferStatus; 7] = [
        OfferStatus::Pending,
        OfferStatus::Countered,
        OfferStatus::Accepted,
        OfferStatus::Rejected,
        OfferStatus::Cancelled,
        OfferStatus::Shipped,
        OfferStatus::Completed,
    ];

    /// No further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OfferStatus::Rejected | OfferStatus::Cancelled | OfferStatus::Completed
        )
    }

    /// Offer still awaiting a decision
    pub fn is_open(&self) -> bool {
        matches!(self, OfferStatus::Pending | OfferStatus::Countered)
    }

    /// Apply an action by one party, returning the next status
    pub fn transition(self, action: &OfferAction, party: Party) -> Result<OfferStatus, String> {
        use OfferAction as A;
        use OfferStatus as S;

        let next = match (self, action, party) {
            (S::Pending, A::Accept, Party::Seller) => S::Accepted,
            (S::Pending, A::Reject, Party::Seller) => S::Rejected,
            (S::Pending, A::Counter { .. }, Party::Seller) => S::Countered,
            (S::Countered, A::Accept, Party::Buyer) => S::Accepted,
            (S::Countered, A::Reject, Party::Buyer) => S::Rejected,
            (S::Pending | S::Countered, A::Cancel, Party::Buyer) => S::Cancelled,
            (S::Accepted, A::Ship, Party::Seller) => S::Shipped,
            (S::Shipped, A::Complete, Party::Buyer) => S::Completed,
            _ => {
                return Err(format!(
                    "{} cannot {} an offer that is {}",
                    party,
                    action.name(),
                    self
                ))
            }
        };
        Ok(next)
    }
}

impl std::fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OfferStatus::Pending => write!(f, "pending"),
            OfferStatus::Countered => write!(f, "countered"),
            OfferStatus::Accepted => write!(f, "accepted"),
            OfferStatus::Rejected => write!(f, "rejected"),
            OfferStatus::Cancelled => write!(f, "cancelled"),
            OfferStatus::Shipped => write!(f, "shipped"),
            OfferStatus::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for OfferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(OfferStatus::Pending),
            "countered" => Ok(OfferStatus::Countered),
            "accepted" => Ok(OfferStatus::Accepted),
            "rejected" => Ok(OfferStatus::Rejected),
            "cancelled" => Ok(OfferStatus::Cancelled),
            "shipped" => Ok(OfferStatus::Shipped),
            "completed" => Ok(OfferStatus::Completed),
            _ => Err(format!("Unknown offer status: {}", s)),
        }
    }
}

/// Which side of the offer is acting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Buyer,
    Seller,
}

impl std::fmt::Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Party::Buyer => write!(f, "buyer"),
            Party::Seller => write!(f, "seller"),
        }
    }
}

/// A status-changing action on an offer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfferAction {
    Accept,
    Reject,
    Counter { price_cents: i64 },
    Cancel,
    Ship,
    Complete,
}

impl OfferAction {
    pub fn name(&self) -> &'static str {
        match self {
            OfferAction::Accept => "accept",
            OfferAction::Reject => "reject",
            OfferAction::Counter { .. } => "counter",
            OfferAction::Cancel => "cancel",
            OfferAction::Ship => "ship",
            OfferAction::Complete => "complete",
        }
    }
}

/// A buyer's offer on a listing
#[derive(Debug, Clone, Serialize)]
pub struct Offer {
    pub id: OfferId,
    pub product_id: ProductId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub quantity: f64,
    /// Offered price per unit in paise
    pub price_cents: i64,
    /// Seller's counter price per unit, when countered
    pub counter_price_cents: Option<i64>,
    pub message: Option<String>,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Offer {
    /// Which party the given user is, if any
    pub fn party_of(&self, user_id: &UserId) -> Option<Party> {
        if *user_id == self.buyer_id {
            Some(Party::Buyer)
        } else if *user_id == self.seller_id {
            Some(Party::Seller)
        } else {
            None
        }
    }

    /// The other side of the offer
    pub fn counterparty(&self, party: Party) -> UserId {
        match party {
            Party::Buyer => self.seller_id,
            Party::Seller => self.buyer_id,
        }
    }

    /// Per-unit price the deal settles at
    pub fn agreed_price_cents(&self) -> i64 {
        self.counter_price_cents.unwrap_or(self.price_cents)
    }

    /// Total value at the agreed price, in paise
    pub fn total_cents(&self) -> i64 {
        (self.agreed_price_cents() as f64 * self.quantity).round() as i64
    }
}

/// Data needed to create a new offer
#[derive(Debug, Clone)]
pub struct NewOffer {
    pub product_id: ProductId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub quantity: f64,
    pub price_cents: i64,
    pub message: Option<String>,
}

/// Filters for listing a user's offers
#[derive(Debug, Clone, Default)]
pub struct OfferFilter {
    pub buyer_id: Option<UserId>,
    pub seller_id: Option<UserId>,
    pub product_id: Option<ProductId>,
    pub status: Option<OfferStatus>,
    pub limit: u64,
    pub offset: u64,
}
