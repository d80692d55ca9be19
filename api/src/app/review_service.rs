//! Review service
//!
//! Each party to a completed offer may rate the other once.

use std::sync::Arc;

use crate::domain::entities::{
    NewReview, NotificationKind, OfferId, OfferStatus, OutgoingNotification, RatingSummary,
    Review, ReviewId, User, UserId,
};
use crate::domain::ports::{Notify, OfferRepository, ReviewRepository};
use crate::error::{AppError, DomainError};

const MAX_PAGE: u64 = 100;

pub struct ReviewService<RR, OR, N>
where
    RR: ReviewRepository,
    OR: OfferRepository,
    N: Notify,
{
    reviews: Arc<RR>,
    offers: Arc<OR>,
    notifier: Arc<N>,
}

impl<RR, OR, N> ReviewService<RR, OR, N>
where
    RR: ReviewRepository,
    OR: OfferRepository,
    N: Notify,
{
    pub fn new(reviews: Arc<RR>, offers: Arc<OR>, notifier: Arc<N>) -> Self {
        Self {
            reviews,
            offers,
            notifier,
        }
    }

    pub async fn create(
        &self,
        reviewer: &User,
        offer_id: &OfferId,
        rating: i16,
        comment: Option<String>,
    ) -> Result<Review, AppError> {
        let offer = self
            .offers
            .find_by_id(offer_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Offer {} not found", offer_id)))?;
        let party = offer
            .party_of(&reviewer.id)
            .ok_or_else(|| AppError::NotFound(format!("Offer {} not found", offer_id)))?;

        if offer.status != OfferStatus::Completed {
            return Err(AppError::Domain(DomainError::Conflict(
                "Only completed offers can be reviewed".to_string(),
            )));
        }
        if self
            .reviews
            .find_by_offer_and_reviewer(offer_id, &reviewer.id)
            .await?
            .is_some()
        {
            return Err(AppError::Domain(DomainError::AlreadyExists(
                "You have already reviewed this offer".to_string(),
            )));
        }

        let new = NewReview {
            offer_id: offer.id,
            reviewer_id: reviewer.id,
            reviewee_id: offer.counterparty(party),
            rating,
            comment: comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
        };
        new.validate().map_err(AppError::BadRequest)?;

        let review = self.reviews.create(&new).await?;
        tracing::info!(review_id = %review.id, reviewee_id = %review.reviewee_id, rating, "Review created");

        self.notifier
            .notify_best_effort(
                &review.reviewee_id,
                OutgoingNotification::new(
                    NotificationKind::ReviewReceived,
                    "New review",
                    format!("{} rated you {}/5", reviewer.full_name, review.rating),
                )
                .with_data(serde_json::json!({ "review_id": review.id, "offer_id": offer.id })),
            )
            .await;

        Ok(review)
    }

    pub async fn list_for_user(
        &self,
        user_id: &UserId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Review>, AppError> {
        Ok(self
            .reviews
            .list_for_user(user_id, limit.clamp(1, MAX_PAGE), offset)
            .await?)
    }

    pub async fn summary(&self, user_id: &UserId) -> Result<RatingSummary, AppError> {
        let ratings = self.reviews.ratings_for_user(user_id).await?;
        Ok(RatingSummary::from_ratings(ratings))
    }

    /// Reviewers may remove their own reviews; admins may remove any
    pub async fn delete(&self, user: &User, id: &ReviewId) -> Result<(), AppError> {
        let review = self
            .reviews
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Review {} not found", id)))?;

        if review.reviewer_id != user.id && !user.is_admin() {
            return Err(AppError::Forbidden(
                "You can only delete your own reviews".to_string(),
            ));
        }

        self.reviews.delete(id).await?;
        tracing::info!(review_id = %id, deleted_by = %user.id, "Review deleted");
        Ok(())
    }
}
