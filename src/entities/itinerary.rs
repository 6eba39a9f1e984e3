//! Itinerary entity - A user's travel plan made of day buckets of coupon stops.
//!
//! `total_savings` and `duration_days` are computed when the itinerary is saved
//! and are not maintained incrementally.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Itinerary database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "itineraries")]
pub struct Model {
    /// Unique identifier for the itinerary
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner (traveller or agency) user id
    pub user_id: String,
    /// Trip title
    pub title: String,
    /// Whether this is the owner's active trip (watched for proximity alerts)
    pub is_active: bool,
    /// Sum of savings over all priced stops
    pub total_savings: f64,
    /// Number of day buckets
    pub duration_days: i32,
    /// When the itinerary was saved
    pub created_at: DateTimeUtc,
}

/// Itinerary relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One itinerary has many stops
    #[sea_orm(has_many = "super::itinerary_stop::Entity")]
    Stops,
}

impl Related<super::itinerary_stop::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stops.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
