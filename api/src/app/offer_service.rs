//! Offer service
//!
//! Buyers make offers on listings; both sides then move the offer through its
//! status machine. Acceptance reserves stock atomically in the repository.

use std::sync::Arc;

use serde::Deserialize;

use crate::domain::entities::{
    NewOffer, NotificationKind, Offer, OfferAction, OfferFilter, OfferId, OfferStatus,
    OutgoingNotification, Party, ProductId, Urgency, User,
};
use crate::domain::ports::{Notify, OfferRepository, ProductRepository};
use crate::error::{AppError, DomainError};

const MAX_OFFER_MESSAGE_LEN: usize = 1000;
const MAX_PAGE: u64 = 100;

/// A buyer's proposed terms
#[derive(Debug, Clone, Deserialize)]
pub struct OfferInput {
    pub quantity: f64,
    /// Offered price per unit in paise
    pub price_cents: i64,
    pub message: Option<String>,
}

/// Which side of the user's offers to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferSide {
    Buying,
    Selling,
}

pub struct OfferService<OR, PR, N>
where
    OR: OfferRepository,
    PR: ProductRepository,
    N: Notify,
{
    offers: Arc<OR>,
    products: Arc<PR>,
    notifier: Arc<N>,
}

impl<OR, PR, N> OfferService<OR, PR, N>
where
    OR: OfferRepository,
    PR: ProductRepository,
    N: Notify,
{
    pub fn new(offers: Arc<OR>, products: Arc<PR>, notifier: Arc<N>) -> Self {
        Self {
            offers,
            products,
            notifier,
        }
    }

    pub async fn create(
        &self,
        buyer: &User,
        product_id: &ProductId,
        input: OfferInput,
    ) -> Result<Offer, AppError> {
        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))?;

        if product.seller_id == buyer.id {
            return Err(AppError::BadRequest(
                "You cannot make an offer on your own listing".to_string(),
            ));
        }
        if !product.is_purchasable() {
            return Err(AppError::Domain(DomainError::Conflict(
                "This listing is not available".to_string(),
            )));
        }
        if !input.quantity.is_finite() || input.quantity <= 0.0 {
            return Err(AppError::BadRequest(
                "Quantity must be positive".to_string(),
            ));
        }
        if input.quantity > product.quantity_available {
            return Err(AppError::BadRequest(format!(
                "Only {} {} available",
                product.quantity_available, product.unit
            )));
        }
        if input.price_cents <= 0 {
            return Err(AppError::BadRequest("Price must be positive".to_string()));
        }
        let message = input
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        if message
            .as_ref()
            .is_some_and(|m| m.chars().count() > MAX_OFFER_MESSAGE_LEN)
        {
            return Err(AppError::BadRequest(format!(
                "Message must be at most {} characters",
                MAX_OFFER_MESSAGE_LEN
            )));
        }

        let offer = self
            .offers
            .create(&NewOffer {
                product_id: product.id,
                buyer_id: buyer.id,
                seller_id: product.seller_id,
                quantity: input.quantity,
                price_cents: input.price_cents,
                message,
            })
            .await?;

        tracing::info!(offer_id = %offer.id, product_id = %product.id, buyer_id = %buyer.id, "Offer created");

        self.notifier
            .notify_best_effort(
                &offer.seller_id,
                OutgoingNotification::new(
                    NotificationKind::OfferReceived,
                    "New offer",
                    format!(
                        "{} offered for {} {} of \"{}\"",
                        buyer.full_name, offer.quantity, product.unit, product.title
                    ),
                )
                .with_data(serde_json::json!({ "offer_id": offer.id, "product_id": product.id })),
            )
            .await;

        Ok(offer)
    }

    /// Offers the user is part of, newest activity first
    pub async fn list(
        &self,
        user: &User,
        side: Option<OfferSide>,
        status: Option<OfferStatus>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Offer>, AppError> {
        let (buyer_id, seller_id) = match side {
            Some(OfferSide::Buying) => (Some(user.id), None),
            Some(OfferSide::Selling) => (None, Some(user.id)),
            None => (Some(user.id), Some(user.id)),
        };
        let filter = OfferFilter {
            buyer_id,
            seller_id,
            product_id: None,
            status,
            limit: limit.clamp(1, MAX_PAGE),
            offset,
        };
        Ok(self.offers.list(&filter).await?)
    }

    /// One offer, visible to its parties and admins
    pub async fn get(&self, user: &User, id: &OfferId) -> Result<Offer, AppError> {
        let offer = self.find(id).await?;
        if offer.party_of(&user.id).is_none() && !user.is_admin() {
            return Err(AppError::NotFound(format!("Offer {} not found", id)));
        }
        Ok(offer)
    }

    async fn find(&self, id: &OfferId) -> Result<Offer, AppError> {
        self.offers
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Offer {} not found", id)))
    }

    /// Apply a status action on behalf of one of the offer's parties
    pub async fn act(
        &self,
        user: &User,
        id: &OfferId,
        action: OfferAction,
    ) -> Result<Offer, AppError> {
        let offer = self.find(id).await?;
        let party = offer
            .party_of(&user.id)
            .ok_or_else(|| AppError::NotFound(format!("Offer {} not found", id)))?;

        let next = offer
            .status
            .transition(&action, party)
            .map_err(|e| AppError::Domain(DomainError::Conflict(e)))?;

        let updated = match action {
            OfferAction::Accept => self.offers.accept(id, offer.status).await?,
            OfferAction::Counter { price_cents } => {
                if price_cents <= 0 {
                    return Err(AppError::BadRequest(
                        "Counter price must be positive".to_string(),
                    ));
                }
                self.offers
                    .update_status(id, offer.status, next, Some(price_cents))
                    .await?
            }
            _ => {
                self.offers
                    .update_status(id, offer.status, next, None)
                    .await?
            }
        };

        tracing::info!(
            offer_id = %id,
            from = %offer.status,
            to = %updated.status,
            party = %party,
            "Offer status changed"
        );

        self.notify_counterparty(&updated, party, &action).await;
        Ok(updated)
    }

    async fn notify_counterparty(&self, offer: &Offer, actor: Party, action: &OfferAction) {
        let urgency = match action {
            OfferAction::Accept | OfferAction::Reject | OfferAction::Counter { .. } => {
                Urgency::Important
            }
            _ => Urgency::Regular,
        };
        let body = match action {
            OfferAction::Counter { price_cents } => format!(
                "The seller countered at ₹{:.2} per unit",
                *price_cents as f64 / 100.0
            ),
            _ => format!("Your offer is now {}", offer.status),
        };

        self.notifier
            .notify_best_effort(
                &offer.counterparty(actor),
                OutgoingNotification::new(NotificationKind::OfferUpdated, "Offer update", body)
                    .with_urgency(urgency)
                    .with_data(serde_json::json!({
                        "offer_id": offer.id,
                        "status": offer.status,
                    })),
            )
            .await;
    }
}
