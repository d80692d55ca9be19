//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.
//! Each fixture function creates a valid entity that can be customized.

use chrono::Utc;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::domain::entities::{
    AddressInput, Offer, OfferId, OfferStatus, Product, ProductId, ProductStatus, Role, Unit,
    User, UserId,
};

/// Create a test user. Email is unique per call; phone is set, push token is not.
pub fn test_user(name: &str, role: Role) -> User {
    let slug = name.to_lowercase().replace(' ', ".");
    let suffix = Uuid::new_v4().simple().to_string();
    let now = Utc::now();
    User {
        id: UserId::new(),
        email: format!("{}.{}@example.in", slug, &suffix[..8]),
        phone: Some("+919800000001".to_string()),
        full_name: name.to_string(),
        password_hash: "not-a-real-hash".to_string(),
        role,
        is_verified: false,
        is_banned: false,
        avatar_key: None,
        bio: None,
        location: Some("Nashik".to_string()),
        push_token: None,
        created_at: now,
        updated_at: now,
        last_login_at: None,
    }
}

/// Create a test user whose password hash matches `password`
pub fn test_user_with_password(name: &str, role: Role, password: &str) -> User {
    User {
        password_hash: hash_password(password).unwrap(),
        ..test_user(name, role)
    }
}

/// Create an active listing with 100 kg in stock at ₹20/kg
pub fn test_product(seller: &User) -> Product {
    let now = Utc::now();
    Product {
        id: ProductId::new(),
        seller_id: seller.id,
        title: "Alphonso mangoes".to_string(),
        description: Some("Ratnagiri, hand picked".to_string()),
        category: "fruits".to_string(),
        unit: Unit::Kg,
        price_cents: 2_000,
        quantity_available: 100.0,
        location: Some("Ratnagiri".to_string()),
        organic: true,
        harvest_date: None,
        image_keys: Vec::new(),
        status: ProductStatus::Active,
        rejection_reason: None,
        created_at: now,
        updated_at: now,
    }
}

/// Create an offer for 10 units of `product` in the given status
pub fn test_offer(product: &Product, buyer: &User, status: OfferStatus) -> Offer {
    let now = Utc::now();
    Offer {
        id: OfferId::new(),
        product_id: product.id,
        buyer_id: buyer.id,
        seller_id: product.seller_id,
        quantity: 10.0,
        price_cents: product.price_cents,
        counter_price_cents: None,
        message: None,
        status,
        created_at: now,
        updated_at: now,
    }
}

/// Create a valid address with the given label
pub fn test_address_input(label: &str) -> AddressInput {
    AddressInput {
        label: label.to_string(),
        line1: "Gat No. 112, Pimpalgaon Road".to_string(),
        line2: None,
        city: "Niphad".to_string(),
        region: "Maharashtra".to_string(),
        postal_code: "422303".to_string(),
        country: "IN".to_string(),
    }
}
