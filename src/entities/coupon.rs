//! Coupon entity - A location-based offer from a store.
//!
//! Coupons carry an optional limited inventory (`total_available` / `reserved_count`),
//! community feedback (votes, reviews) and optional coordinates used by the
//! proximity watcher. Coupons are never hard-deleted; they move to `Expired` or `Paused`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Closed set of coupon categories.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Restaurants, cafés, bakeries
    #[sea_orm(string_value = "food")]
    Food,
    /// Retail
    #[sea_orm(string_value = "shopping")]
    Shopping,
    /// Cinemas, shows, attractions
    #[sea_orm(string_value = "entertainment")]
    Entertainment,
    /// Hotels, tours, transport
    #[sea_orm(string_value = "travel")]
    Travel,
    /// Services
    #[sea_orm(string_value = "services")]
    Services,
    /// Pharmacies, gyms, clinics
    #[sea_orm(string_value = "health")]
    Health,
    /// Salons, spas
    #[sea_orm(string_value = "beauty")]
    Beauty,
    /// Anything else
    #[sea_orm(string_value = "other")]
    Other,
}

impl Category {
    /// Resolves a category from its name. Unknown names map to [`Category::Other`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "food" | "restaurant" | "restaurants" => Self::Food,
            "shopping" | "retail" => Self::Shopping,
            "entertainment" | "leisure" => Self::Entertainment,
            "travel" | "tourism" => Self::Travel,
            "services" | "service" => Self::Services,
            "health" | "wellness" => Self::Health,
            "beauty" => Self::Beauty,
            _ => Self::Other,
        }
    }

    /// Display glyph for this category.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Food => "🍽️",
            Self::Shopping => "🛍️",
            Self::Entertainment => "🎭",
            Self::Travel => "✈️",
            Self::Services => "🛠️",
            Self::Health => "💊",
            Self::Beauty => "💅",
            Self::Other => "🏷️",
        }
    }
}

/// Lifecycle status of a coupon.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum CouponStatus {
    /// Visible and reservable
    #[sea_orm(string_value = "active")]
    Active,
    /// Temporarily hidden by the vendor
    #[sea_orm(string_value = "paused")]
    Paused,
    /// Past its expiry date
    #[sea_orm(string_value = "expired")]
    Expired,
}

/// Coupon database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    /// Unique identifier for the coupon
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the store offering the deal
    pub store_name: String,
    /// Short headline (e.g., "Two coffees for one")
    pub title: String,
    /// Longer description
    pub description: String,
    /// Human-readable discount (e.g., "20% OFF")
    pub discount: String,
    /// Coupon category
    pub category: Category,
    /// Latitude of the store, if known
    pub latitude: Option<f64>,
    /// Longitude of the store, if known
    pub longitude: Option<f64>,
    /// When the coupon stops being valid
    pub expiry_date: DateTimeUtc,
    /// Total units available; `None` means unlimited
    pub total_available: Option<i32>,
    /// Units reserved so far
    pub reserved_count: i32,
    /// Per-user cap advertised by the vendor
    pub max_per_user: Option<i32>,
    /// Mean of all review ratings, `None` until the first review
    pub average_rating: Option<f64>,
    /// Number of reviews
    pub review_count: i32,
    /// Community "still valid" votes
    pub upvotes: i32,
    /// Community "not valid" votes
    pub downvotes: i32,
    /// Last time someone voted on the coupon
    pub last_verified: Option<DateTimeUtc>,
    /// Lifecycle status
    pub status: CouponStatus,
    /// Regular price, when the deal is a fixed-price offer
    pub original_price: Option<f64>,
    /// Price with the coupon applied
    pub discounted_price: Option<f64>,
    /// ISO 4217 currency code for the prices
    pub currency: String,
    /// When the coupon was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Coupon and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One coupon has many reviews
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
    /// One coupon has many menu items
    #[sea_orm(has_many = "super::menu_item::Entity")]
    MenuItems,
    /// One coupon has many reservations
    #[sea_orm(has_many = "super::reservation::Entity")]
    Reservations,
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::menu_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MenuItems.def()
    }
}

impl Related<super::reservation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reservations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
