//! Shared test utilities for `DealScout`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test coupons with sensible defaults.

use crate::{
    core::coupon::{self, NewCoupon},
    entities::{Category, CouponStatus, coupon as coupon_entity},
    errors::Result,
};
use chrono::{Duration, Utc};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Builds a coupon submission with sensible defaults.
///
/// # Defaults
/// * `store_name`: "Test Store"
/// * `category`: food
/// * `expiry_date`: 30 days from now
/// * unlimited inventory, no coordinates, no prices, BRL
pub fn new_test_coupon(title: &str) -> NewCoupon {
    NewCoupon {
        store_name: "Test Store".to_string(),
        title: title.to_string(),
        description: String::new(),
        discount: "10% OFF".to_string(),
        category: Category::Food,
        latitude: None,
        longitude: None,
        expiry_date: Utc::now() + Duration::days(30),
        total_available: None,
        max_per_user: None,
        original_price: None,
        discounted_price: None,
        currency: "BRL".to_string(),
    }
}

/// Inserts a coupon with the defaults of [`new_test_coupon`].
pub async fn create_test_coupon(db: &DatabaseConnection, title: &str) -> Result<coupon_entity::Model> {
    coupon::add_coupon(db, new_test_coupon(title)).await
}

/// Inserts a coupon with `total` units of inventory.
pub async fn create_limited_coupon(
    db: &DatabaseConnection,
    title: &str,
    total: i32,
) -> Result<coupon_entity::Model> {
    let mut new = new_test_coupon(title);
    new.total_available = Some(total);
    coupon::add_coupon(db, new).await
}

/// Inserts a coupon located at (`lat`, `lng`).
pub async fn create_located_coupon(
    db: &DatabaseConnection,
    title: &str,
    lat: f64,
    lng: f64,
) -> Result<coupon_entity::Model> {
    let mut new = new_test_coupon(title);
    new.latitude = Some(lat);
    new.longitude = Some(lng);
    coupon::add_coupon(db, new).await
}

/// A coupon model that never touched a database, for pure functions.
pub fn sample_coupon_model(id: i64) -> coupon_entity::Model {
    let now = Utc::now();
    coupon_entity::Model {
        id,
        store_name: "Test Store".to_string(),
        title: format!("Coupon {id}"),
        description: String::new(),
        discount: "10% OFF".to_string(),
        category: Category::Food,
        latitude: None,
        longitude: None,
        expiry_date: now + Duration::days(30),
        total_available: None,
        reserved_count: 0,
        max_per_user: None,
        average_rating: None,
        review_count: 0,
        upvotes: 0,
        downvotes: 0,
        last_verified: None,
        status: CouponStatus::Active,
        original_price: None,
        discounted_price: None,
        currency: "BRL".to_string(),
        created_at: now,
    }
}
