//! Review domain entity
//!
//! Reviews are left by either party of a completed offer about the other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::offer::OfferId;
use super::user::UserId;

pub const MAX_REVIEW_COMMENT_LEN: usize = 1000;

/// Unique identifier for a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewId(pub Uuid);

impl From<Uuid> for ReviewId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ReviewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub offer_id: OfferId,
    pub reviewer_id: UserId,
    pub reviewee_id: UserId,
    /// 1 to 5 stars
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Data needed to create a new review
#[derive(Debug, Clone)]
pub struct NewReview {
    pub offer_id: OfferId,
    pub reviewer_id: UserId,
    pub reviewee_id: UserId,
    pub rating: i16,
    pub comment: Option<String>,
}

impl NewReview {
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=5).contains(&self.rating) {
            return Err("rating must be between 1 and 5".to_string());
        }
        if let Some(comment) = &self.comment {
            if comment.chars().count() > MAX_REVIEW_COMMENT_LEN {
                return Err(format!(
                    "comment must be at most {} characters",
                    MAX_REVIEW_COMMENT_LEN
                ));
            }
        }
        if self.reviewer_id == self.reviewee_id {
            return Err("cannot review yourself".to_string());
        }
        Ok(())
    }
}

/// Aggregate rating for a user
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RatingSummary {
    pub average: Option<f64>,
    pub count: u64,
    /// Counts of 1..=5 star ratings, index 0 is one star
    pub distribution: [u64; 5],
}

impl RatingSummary {
    pub fn from_ratings(ratings: impl IntoIterator<Item = i16>) -> Self {
        let mut distribution = [0u64; 5];
        let mut sum = 0i64;
        let mut count = 0u64;

        for rating in ratings {
            if let Some(slot) = usize::try_from(rating - 1)
                .ok()
                .and_then(|i| distribution.get_mut(i))
            {
                *slot += 1;
                sum += i64::from(rating);
                count += 1;
            }
        }

        let average = if count == 0 {
            None
        } else {
            // Rounded to two decimals for display
            Some(((sum as f64 / count as f64) * 100.0).round() / 100.0)
        };

        Self {
            average,
            count,
            distribution,
        }
    }
}
