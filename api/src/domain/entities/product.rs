//! Product listing domain entity
//!
//! A listing of produce offered by a farmer. Images are stored as S3 keys
//! and resolved to CDN URLs at the edge.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

/// Maximum number of images attached to a listing
pub const MAX_PRODUCT_IMAGES: usize = 8;

/// Unique identifier for a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub Uuid);

impl ProductId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ProductId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Listing lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    /// Awaiting admin moderation
    PendingReview,
    Active,
    SoldOut,
    Rejected,
    Archived,
}

impl ProductStatus {
    pub const ALL: [ProductStatus; 5] = [
        ProductStatus::PendingReview,
        ProductStatus::Active,
        ProductStatus::SoldOut,
        ProductStatus::Rejected,
        ProductStatus::Archived,
    ];
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductStatus::PendingReview => write!(f, "pending_review"),
            ProductStatus::Active => write!(f, "active"),
            ProductStatus::SoldOut => write!(f, "sold_out"),
            ProductStatus::Rejected => write!(f, "rejected"),
            ProductStatus::Archived => write!(f, "archived"),
        }
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending_review" => Ok(ProductStatus::PendingReview),
            "active" => Ok(ProductStatus::Active),
            "sold_out" => Ok(ProductStatus::SoldOut),
            "rejected" => Ok(ProductStatus::Rejected),
            "archived" => Ok(ProductStatus::Archived),
            _ => Err(format!("Unknown product status: {}", s)),
        }
    }
}

/// Selling unit for a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Kg,
    Quintal,
    Tonne,
    Litre,
    Dozen,
    Piece,
    Crate,
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Unit::Kg => "kg",
            Unit::Quintal => "quintal",
            Unit::Tonne => "tonne",
            Unit::Litre => "litre",
            Unit::Dozen => "dozen",
            Unit::Piece => "piece",
            Unit::Crate => "crate",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kg" => Ok(Unit::Kg),
            "quintal" => Ok(Unit::Quintal),
            "tonne" => Ok(Unit::Tonne),
            "litre" => Ok(Unit::Litre),
            "dozen" => Ok(Unit::Dozen),
            "piece" => Ok(Unit::Piece),
            "crate" => Ok(Unit::Crate),
            _ => Err(format!("Unknown unit: {}", s)),
        }
    }
}

/// A produce listing
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub seller_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub unit: Unit,
    /// Price per unit in paise
    pub price_cents: i64,
    pub quantity_available: f64,
    pub location: Option<String>,
    pub organic: bool,
    pub harvest_date: Option<NaiveDate>,
    pub image_keys: Vec<String>,
    pub status: ProductStatus,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether buyers can currently make offers on this listing
    pub fn is_purchasable(&self) -> bool {
        self.status == ProductStatus::Active && self.quantity_available > 0.0
    }
}

/// Data needed to create a new product
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub seller_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub unit: Unit,
    pub price_cents: i64,
    pub quantity_available: f64,
    pub location: Option<String>,
    pub organic: bool,
    pub harvest_date: Option<NaiveDate>,
    pub image_keys: Vec<String>,
    pub status: ProductStatus,
}

/// Partial listing update; `None` leaves the field untouched
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit: Option<Unit>,
    pub price_cents: Option<i64>,
    pub quantity_available: Option<f64>,
    pub location: Option<String>,
    pub organic: Option<bool>,
    pub harvest_date: Option<NaiveDate>,
    pub image_keys: Option<Vec<String>>,
    pub status: Option<ProductStatus>,
    pub rejection_reason: Option<Option<String>>,
}

/// Sort order for product search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

/// Typed product search; translated to a parameterized ORM condition by the
/// persistence adapter
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub text: Option<String>,
    pub category: Option<String>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub organic: Option<bool>,
    pub seller_id: Option<UserId>,
    pub location: Option<String>,
    pub status: Option<ProductStatus>,
    pub sort: ProductSort,
    pub limit: u64,
    pub offset: u64,
}

impl ProductQuery {
    /// Public marketplace search: only active listings
    pub fn marketplace() -> Self {
        Self {
            status: Some(ProductStatus::Active),
            limit: 20,
            ..Default::default()
        }
    }

    /// Check an in-memory product against this query
    pub fn matches(&self, p: &Product) -> bool {
        if let Some(status) = self.status {
            if p.status != status {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            let in_title = p.title.to_lowercase().contains(&needle);
            let in_desc = p
                .description
                .as_deref()
                .map(|d| d.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !in_title && !in_desc {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !p.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(min) = self.min_price_cents {
            if p.price_cents < min {
                return false;
            }
        }
        if let Some(max) = self.max_price_cents {
            if p.price_cents > max {
                return false;
            }
        }
        if let Some(organic) = self.organic {
            if p.organic != organic {
                return false;
            }
        }
        if let Some(seller) = self.seller_id {
            if p.seller_id != seller {
                return false;
            }
        }
        if let Some(location) = &self.location {
            let needle = location.to_lowercase();
            if !p
                .location
                .as_deref()
                .map(|l| l.to_lowercase().contains(&needle))
                .unwrap_or(false)
            {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(title: &str, price_cents: i64) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(),
            seller_id: UserId::new(),
            title: title.to_string(),
            description: Some("Fresh from the farm".to_string()),
            category: "vegetables".to_string(),
            unit: Unit::Kg,
            price_cents,
            quantity_available: 100.0,
            location: Some("Nashik, Maharashtra".to_string()),
            organic: true,
            harvest_date: None,
            image_keys: vec![],
            status: ProductStatus::Active,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in ProductStatus::ALL {
            assert_eq!(status.to_string().parse::<ProductStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unit_parse_is_case_insensitive() {
        assert_eq!("KG".parse::<Unit>().unwrap(), Unit::Kg);
        assert_eq!("Quintal".parse::<Unit>().unwrap(), Unit::Quintal);
        assert!("bushel".parse::<Unit>().is_err());
    }

    #[test]
    fn purchasable_requires_active_and_stock() {
        let mut p = product("Onions", 2500);
        assert!(p.is_purchasable());

        p.quantity_available = 0.0;
        assert!(!p.is_purchasable());

        p.quantity_available = 5.0;
        p.status = ProductStatus::PendingReview;
        assert!(!p.is_purchasable());
    }

    #[test]
    fn query_matches_text_in_title_or_description() {
        let p = product("Red Onions", 2500);
        let q = ProductQuery {
            text: Some("onion".to_string()),
            ..ProductQuery::marketplace()
        };
        assert!(q.matches(&p));

        let q = ProductQuery {
            text: Some("farm".to_string()),
            ..ProductQuery::marketplace()
        };
        assert!(q.matches(&p));

        let q = ProductQuery {
            text: Some("tomato".to_string()),
            ..ProductQuery::marketplace()
        };
        assert!(!q.matches(&p));
    }

    #[test]
    fn query_price_bounds_are_inclusive() {
        let p = product("Wheat", 2000);
        let q = ProductQuery {
            min_price_cents: Some(2000),
            max_price_cents: Some(2000),
            ..ProductQuery::marketplace()
        };
        assert!(q.matches(&p));

        let q = ProductQuery {
            min_price_cents: Some(2001),
            ..ProductQuery::marketplace()
        };
        assert!(!q.matches(&p));
    }

    #[test]
    fn marketplace_query_excludes_pending() {
        let mut p = product("Rice", 4000);
        p.status = ProductStatus::PendingReview;
        assert!(!ProductQuery::marketplace().matches(&p));
    }
}
