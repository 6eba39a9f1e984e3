//! Reservation entity - One claimed unit of a coupon's inventory.
//!
//! The composite primary key (`user_id`, `coupon_id`) enforces at most one reservation
//! per coupon per user at the database level.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reservation database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reservations")]
pub struct Model {
    /// User holding the reservation
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    /// Reserved coupon
    #[sea_orm(primary_key, auto_increment = false)]
    pub coupon_id: i64,
    /// When the unit was claimed
    pub reserved_at: DateTimeUtc,
}

/// Reservation relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each reservation claims one coupon
    /// Reserved coupon
    #[sea_orm(
        belongs_to = "super::coupon::Entity",
        from = "Column::CouponId",
        to = "super::coupon::Column::Id"
    )]
    Coupon,
}

impl Related<super::coupon::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Coupon.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
