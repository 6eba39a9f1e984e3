//! User entity - Role-tagged identity with a loyalty points balance.
//!
//! The role only selects which dashboard a user sees; it grants no permissions.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User roles.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform operator
    #[sea_orm(string_value = "super_admin")]
    SuperAdmin,
    /// Regional franchise owner
    #[sea_orm(string_value = "franchisee")]
    Franchisee,
    /// Store owner publishing coupons
    #[sea_orm(string_value = "shopkeeper")]
    Shopkeeper,
    /// Travel agency authoring itineraries
    #[sea_orm(string_value = "agency")]
    Agency,
    /// Regular consumer
    #[sea_orm(string_value = "user")]
    User,
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// External identity (e.g., Discord user id)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Display name
    pub name: String,
    /// Role tag
    pub role: Role,
    /// Loyalty points balance
    pub loyalty_points: i32,
    /// When the user was first seen
    pub created_at: DateTimeUtc,
}

/// `User` has no modelled relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
