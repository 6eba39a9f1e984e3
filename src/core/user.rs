//! User business logic - Identities, roles and loyalty points.
//!
//! Roles only decide which dashboard a user is shown. Nothing here restricts what a
//! user may do.

use crate::{
    entities::{Role, User, user},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*, sea_query::Expr};
use tracing::info;

/// Back-office or consumer view selected by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dashboard {
    /// Platform-wide metrics and company management
    Admin,
    /// Franchise region overview
    Franchise,
    /// Store campaigns and redemptions
    Vendor,
    /// Itinerary authoring for clients
    Agency,
    /// Coupon discovery and trips
    Consumer,
}

impl Role {
    /// Dashboard shown to this role.
    #[must_use]
    pub const fn dashboard(self) -> Dashboard {
        match self {
            Self::SuperAdmin => Dashboard::Admin,
            Self::Franchisee => Dashboard::Franchise,
            Self::Shopkeeper => Dashboard::Vendor,
            Self::Agency => Dashboard::Agency,
            Self::User => Dashboard::Consumer,
        }
    }

    /// Parses a role name; unknown names fall back to [`Role::User`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().replace('-', "_").as_str() {
            "super_admin" | "admin" => Self::SuperAdmin,
            "franchisee" => Self::Franchisee,
            "shopkeeper" | "vendor" => Self::Shopkeeper,
            "agency" => Self::Agency,
            _ => Self::User,
        }
    }
}

/// Look up a user by id.
pub async fn get_user(db: &DatabaseConnection, user_id: &str) -> Result<Option<user::Model>> {
    User::find_by_id(user_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns the user, creating a regular [`Role::User`] record on first sight.
pub async fn get_or_create_user(
    db: &DatabaseConnection,
    user_id: &str,
    name: &str,
) -> Result<user::Model> {
    if let Some(existing) = get_user(db, user_id).await? {
        return Ok(existing);
    }

    let created = user::ActiveModel {
        id: Set(user_id.to_string()),
        name: Set(name.to_string()),
        role: Set(Role::User),
        loyalty_points: Set(0),
        created_at: Set(Utc::now()),
    };
    User::insert(created).exec_without_returning(db).await?;
    info!("Registered user {user_id} ({name})");

    get_user(db, user_id)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            id: user_id.to_string(),
        })
}

/// Change a user's role.
pub async fn set_role(db: &DatabaseConnection, user_id: &str, role: Role) -> Result<user::Model> {
    let existing = get_user(db, user_id)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            id: user_id.to_string(),
        })?;
    let mut model: user::ActiveModel = existing.into();
    model.role = Set(role);
    model.update(db).await.map_err(Into::into)
}

/// Adds loyalty points with a single `UPDATE ... SET loyalty_points = loyalty_points + ?`.
///
/// # Returns
/// The updated user.
pub async fn credit_points<C>(db: &C, user_id: &str, points: i32) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    if points <= 0 {
        return Err(Error::invalid("Points to credit must be positive"));
    }

    let update = User::update_many()
        .col_expr(
            user::Column::LoyaltyPoints,
            Expr::col(user::Column::LoyaltyPoints).add(points),
        )
        .filter(user::Column::Id.eq(user_id))
        .exec(db)
        .await?;
    if update.rows_affected == 0 {
        return Err(Error::UserNotFound {
            id: user_id.to_string(),
        });
    }

    info!("Credited {points} points to {user_id}");
    User::find_by_id(user_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            id: user_id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[test]
    fn test_role_dashboards() {
        assert_eq!(Role::SuperAdmin.dashboard(), Dashboard::Admin);
        assert_eq!(Role::Shopkeeper.dashboard(), Dashboard::Vendor);
        assert_eq!(Role::User.dashboard(), Dashboard::Consumer);
    }

    #[test]
    fn test_role_from_name() {
        assert_eq!(Role::from_name("super-admin"), Role::SuperAdmin);
        assert_eq!(Role::from_name("Agency"), Role::Agency);
        assert_eq!(Role::from_name("wizard"), Role::User);
    }

    #[tokio::test]
    async fn test_get_or_create_user_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let first = get_or_create_user(&db, "42", "Ana").await?;
        let second = get_or_create_user(&db, "42", "Renamed").await?;

        assert_eq!(first, second);
        assert_eq!(first.role, Role::User);
        assert_eq!(first.loyalty_points, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_role_and_credit_points() -> Result<()> {
        let db = setup_test_db().await?;
        get_or_create_user(&db, "7", "Vendor").await?;

        let updated = set_role(&db, "7", Role::Shopkeeper).await?;
        assert_eq!(updated.role.dashboard(), Dashboard::Vendor);

        credit_points(&db, "7", 50).await?;
        let user = credit_points(&db, "7", 25).await?;
        assert_eq!(user.loyalty_points, 75);

        assert!(matches!(
            credit_points(&db, "nobody", 10).await,
            Err(Error::UserNotFound { .. })
        ));
        assert!(matches!(
            credit_points(&db, "7", 0).await,
            Err(Error::InvalidInput { .. })
        ));
        Ok(())
    }
}
