//! Itinerary stop entity - A coupon placed on a given day of an itinerary.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Itinerary stop database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "itinerary_stops")]
pub struct Model {
    /// Row id
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning itinerary
    pub itinerary_id: i64,
    /// Zero-based day bucket
    pub day_index: i32,
    /// Zero-based order within the day
    pub position: i32,
    /// Coupon visited at this stop
    pub coupon_id: i64,
}

/// Itinerary stop relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Itinerary this stop belongs to
    #[sea_orm(
        belongs_to = "super::itinerary::Entity",
        from = "Column::ItineraryId",
        to = "super::itinerary::Column::Id"
    )]
    Itinerary,
    /// Coupon visited at this stop
    #[sea_orm(
        belongs_to = "super::coupon::Entity",
        from = "Column::CouponId",
        to = "super::coupon::Column::Id"
    )]
    Coupon,
}

impl Related<super::itinerary::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Itinerary.def()
    }
}

impl Related<super::coupon::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Coupon.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
