//! Saved coupon entity - A user's bookmark on a coupon.
//!
//! The composite primary key (`user_id`, `coupon_id`) makes saving a set membership.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Saved coupon database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "saved_coupons")]
pub struct Model {
    /// User who saved the coupon
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    /// Saved coupon
    #[sea_orm(primary_key, auto_increment = false)]
    pub coupon_id: i64,
    /// When it was saved
    pub saved_at: DateTimeUtc,
}

/// `SavedCoupon` relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each saved entry points at one coupon
    /// Saved coupon
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
