//! Coupon business logic - The coupon catalog and each user's relationship to it.
//!
//! Covers catalog queries, community and vendor submissions, saving, voting, menus and
//! reservations. Reservation is the one operation with an invariant to protect:
//! `reserved_count` never exceeds `total_available`, and a user holds at most one
//! reservation per coupon. Both are enforced inside a single database transaction,
//! with the capacity check folded into the `UPDATE` itself.

use crate::{
    core::proximity::{Coordinates, haversine_distance},
    entities::{
        Category, Coupon, CouponStatus, MenuItem, Reservation, SavedCoupon, coupon, menu_item,
        reservation, saved_coupon,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    Condition, QueryOrder, Set, SqlErr, TransactionTrait, prelude::*, sea_query::Expr,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// A coupon submission, from the seed catalog, a community upload or a vendor campaign.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCoupon {
    /// Store offering the deal
    pub store_name: String,
    /// Headline
    pub title: String,
    /// Longer description
    #[serde(default)]
    pub description: String,
    /// Human-readable discount
    pub discount: String,
    /// Category, `other` when omitted
    #[serde(default = "default_category")]
    pub category: Category,
    /// Store latitude
    pub latitude: Option<f64>,
    /// Store longitude
    pub longitude: Option<f64>,
    /// Expiry instant
    pub expiry_date: DateTime<Utc>,
    /// Limited inventory, unlimited when omitted
    pub total_available: Option<i32>,
    /// Per-user cap advertised by the vendor
    pub max_per_user: Option<i32>,
    /// Regular price
    pub original_price: Option<f64>,
    /// Price with the coupon applied
    pub discounted_price: Option<f64>,
    /// ISO 4217 currency code
    #[serde(default = "default_currency")]
    pub currency: String,
}

const fn default_category() -> Category {
    Category::Other
}

fn default_currency() -> String {
    "BRL".to_string()
}

/// Community vote on whether a coupon still works.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    /// Still valid
    Up,
    /// No longer honoured
    Down,
}

/// Retrieves the whole catalog, newest first.
pub async fn get_all_coupons(db: &DatabaseConnection) -> Result<Vec<coupon::Model>> {
    Coupon::find()
        .order_by_desc(coupon::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves active coupons in one category, newest first.
pub async fn get_coupons_by_category(
    db: &DatabaseConnection,
    category: Category,
) -> Result<Vec<coupon::Model>> {
    Coupon::find()
        .filter(coupon::Column::Category.eq(category))
        .filter(coupon::Column::Status.eq(CouponStatus::Active))
        .order_by_desc(coupon::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a coupon by id.
pub async fn get_coupon_by_id<C>(db: &C, coupon_id: i64) -> Result<Option<coupon::Model>>
where
    C: ConnectionTrait,
{
    Coupon::find_by_id(coupon_id)
        .one(db)
        .await
        .map_err(Into::into)
}

async fn require_coupon<C>(db: &C, coupon_id: i64) -> Result<coupon::Model>
where
    C: ConnectionTrait,
{
    get_coupon_by_id(db, coupon_id)
        .await?
        .ok_or(Error::CouponNotFound { id: coupon_id })
}

/// Adds a coupon to the catalog.
///
/// Used by the seed loader, community uploads and vendor campaigns alike. No
/// de-duplication is attempted; the new coupon simply becomes the newest entry.
#[instrument(skip(db, new_coupon), fields(title = %new_coupon.title))]
pub async fn add_coupon(db: &DatabaseConnection, new_coupon: NewCoupon) -> Result<coupon::Model> {
    if new_coupon.title.trim().is_empty() {
        return Err(Error::invalid("Coupon title cannot be empty"));
    }
    if new_coupon.store_name.trim().is_empty() {
        return Err(Error::invalid("Store name cannot be empty"));
    }
    if new_coupon.total_available.is_some_and(|total| total < 0) {
        return Err(Error::invalid("Total available cannot be negative"));
    }
    for price in [new_coupon.original_price, new_coupon.discounted_price]
        .into_iter()
        .flatten()
    {
        if !price.is_finite() || price < 0.0 {
            return Err(Error::InvalidAmount { amount: price });
        }
    }

    let model = coupon::ActiveModel {
        store_name: Set(new_coupon.store_name.trim().to_string()),
        title: Set(new_coupon.title.trim().to_string()),
        description: Set(new_coupon.description),
        discount: Set(new_coupon.discount),
        category: Set(new_coupon.category),
        latitude: Set(new_coupon.latitude),
        longitude: Set(new_coupon.longitude),
        expiry_date: Set(new_coupon.expiry_date),
        total_available: Set(new_coupon.total_available),
        reserved_count: Set(0),
        max_per_user: Set(new_coupon.max_per_user),
        average_rating: Set(None),
        review_count: Set(0),
        upvotes: Set(0),
        downvotes: Set(0),
        last_verified: Set(None),
        status: Set(CouponStatus::Active),
        original_price: Set(new_coupon.original_price),
        discounted_price: Set(new_coupon.discounted_price),
        currency: Set(new_coupon.currency.to_uppercase()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let created = model.insert(db).await?;
    info!("Added coupon {} '{}'", created.id, created.title);
    Ok(created)
}

/// Flips whether `user_id` has saved `coupon_id`.
///
/// # Returns
/// `true` if the coupon is saved after the call, `false` if it was removed.
pub async fn toggle_save(db: &DatabaseConnection, user_id: &str, coupon_id: i64) -> Result<bool> {
    require_coupon(db, coupon_id).await?;

    let existing = SavedCoupon::find_by_id((user_id.to_string(), coupon_id))
        .one(db)
        .await?;

    if let Some(saved) = existing {
        saved.delete(db).await?;
        info!("User {user_id} unsaved coupon {coupon_id}");
        Ok(false)
    } else {
        let entry = saved_coupon::ActiveModel {
            user_id: Set(user_id.to_string()),
            coupon_id: Set(coupon_id),
            saved_at: Set(Utc::now()),
        };
        SavedCoupon::insert(entry).exec_without_returning(db).await?;
        info!("User {user_id} saved coupon {coupon_id}");
        Ok(true)
    }
}

/// Ids of the coupons `user_id` has saved, oldest save first.
pub async fn get_saved_ids(db: &DatabaseConnection, user_id: &str) -> Result<Vec<i64>> {
    let saved = SavedCoupon::find()
        .filter(saved_coupon::Column::UserId.eq(user_id))
        .order_by_asc(saved_coupon::Column::SavedAt)
        .all(db)
        .await?;
    Ok(saved.into_iter().map(|s| s.coupon_id).collect())
}

/// The coupons `user_id` has saved.
pub async fn get_saved_coupons(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<coupon::Model>> {
    let ids = get_saved_ids(db, user_id).await?;
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    Coupon::find()
        .filter(coupon::Column::Id.is_in(ids))
        .order_by_asc(coupon::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Ids of the coupons `user_id` has reserved.
pub async fn get_reserved_ids(db: &DatabaseConnection, user_id: &str) -> Result<Vec<i64>> {
    let reserved = Reservation::find()
        .filter(reservation::Column::UserId.eq(user_id))
        .order_by_asc(reservation::Column::ReservedAt)
        .all(db)
        .await?;
    Ok(reserved.into_iter().map(|r| r.coupon_id).collect())
}

/// Claims one unit of a coupon's inventory for `user_id`.
///
/// The capacity check and the increment are a single conditional statement:
/// `UPDATE coupons SET reserved_count = reserved_count + 1
///  WHERE id = ? AND (total_available IS NULL OR reserved_count < total_available)`,
/// so two callers racing for the last unit cannot both succeed.
///
/// # Errors
/// * [`Error::CouponNotFound`] - unknown coupon
/// * [`Error::AlreadyReserved`] - this user already holds a reservation
/// * [`Error::SoldOut`] - inventory exhausted
#[instrument(skip(db))]
pub async fn reserve_coupon(
    db: &DatabaseConnection,
    user_id: &str,
    coupon_id: i64,
) -> Result<coupon::Model> {
    let txn = db.begin().await?;

    require_coupon(&txn, coupon_id).await?;

    let already = Reservation::find_by_id((user_id.to_string(), coupon_id))
        .one(&txn)
        .await?;
    if already.is_some() {
        warn!("User {user_id} tried to reserve coupon {coupon_id} twice");
        return Err(Error::AlreadyReserved { coupon_id });
    }

    let update = Coupon::update_many()
        .col_expr(
            coupon::Column::ReservedCount,
            Expr::col(coupon::Column::ReservedCount).add(1),
        )
        .filter(coupon::Column::Id.eq(coupon_id))
        .filter(
            Condition::any()
                .add(coupon::Column::TotalAvailable.is_null())
                .add(
                    Expr::col(coupon::Column::ReservedCount)
                        .lt(Expr::col(coupon::Column::TotalAvailable)),
                ),
        )
        .exec(&txn)
        .await?;

    if update.rows_affected == 0 {
        warn!("Coupon {coupon_id} is sold out");
        return Err(Error::SoldOut { coupon_id });
    }

    let entry = reservation::ActiveModel {
        user_id: Set(user_id.to_string()),
        coupon_id: Set(coupon_id),
        reserved_at: Set(Utc::now()),
    };
    if let Err(e) = Reservation::insert(entry).exec_without_returning(&txn).await {
        return Err(match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Error::AlreadyReserved { coupon_id },
            _ => e.into(),
        });
    }

    let reserved = require_coupon(&txn, coupon_id).await?;
    txn.commit().await?;

    info!(
        "User {user_id} reserved coupon {coupon_id} ({}/{})",
        reserved.reserved_count,
        reserved
            .total_available
            .map_or_else(|| "unlimited".to_string(), |t| t.to_string())
    );
    Ok(reserved)
}

/// Records a community vote and stamps `last_verified`.
///
/// The counter is incremented in the database, not read-modified-written.
pub async fn vote_coupon(db: &DatabaseConnection, coupon_id: i64, vote: Vote) -> Result<coupon::Model> {
    let column = match vote {
        Vote::Up => coupon::Column::Upvotes,
        Vote::Down => coupon::Column::Downvotes,
    };

    let update = Coupon::update_many()
        .col_expr(column, Expr::col(column).add(1))
        .col_expr(coupon::Column::LastVerified, Expr::value(Utc::now()))
        .filter(coupon::Column::Id.eq(coupon_id))
        .exec(db)
        .await?;

    if update.rows_affected == 0 {
        return Err(Error::CouponNotFound { id: coupon_id });
    }
    require_coupon(db, coupon_id).await
}

/// Marks every active coupon whose expiry is before `now` as expired.
///
/// # Returns
/// The number of coupons that changed status.
pub async fn expire_stale_coupons(db: &DatabaseConnection, now: DateTime<Utc>) -> Result<u64> {
    let update = Coupon::update_many()
        .col_expr(coupon::Column::Status, Expr::value(CouponStatus::Expired))
        .filter(coupon::Column::Status.eq(CouponStatus::Active))
        .filter(coupon::Column::ExpiryDate.lt(now))
        .exec(db)
        .await?;
    if update.rows_affected > 0 {
        info!("Expired {} coupons", update.rows_affected);
    }
    Ok(update.rows_affected)
}

/// Adds an entry to a coupon's menu.
pub async fn add_menu_item(
    db: &DatabaseConnection,
    coupon_id: i64,
    name: String,
    price: f64,
) -> Result<menu_item::Model> {
    if name.trim().is_empty() {
        return Err(Error::invalid("Menu item name cannot be empty"));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(Error::InvalidAmount { amount: price });
    }
    require_coupon(db, coupon_id).await?;

    let item = menu_item::ActiveModel {
        coupon_id: Set(coupon_id),
        name: Set(name.trim().to_string()),
        price: Set(price),
        ..Default::default()
    };
    item.insert(db).await.map_err(Into::into)
}

/// A coupon's menu, in insertion order.
pub async fn get_menu_for_coupon(
    db: &DatabaseConnection,
    coupon_id: i64,
) -> Result<Vec<menu_item::Model>> {
    MenuItem::find()
        .filter(menu_item::Column::CouponId.eq(coupon_id))
        .order_by_asc(menu_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Units still available, `None` for unlimited coupons.
#[must_use]
pub fn remaining_inventory(coupon: &coupon::Model) -> Option<i32> {
    coupon
        .total_available
        .map(|total| (total - coupon.reserved_count).max(0))
}

/// Whether the coupon's limited inventory is exhausted.
#[must_use]
pub fn is_sold_out(coupon: &coupon::Model) -> bool {
    remaining_inventory(coupon) == Some(0)
}

/// The coupon's location, when both coordinates are known.
#[must_use]
pub fn coordinates(coupon: &coupon::Model) -> Option<Coordinates> {
    match (coupon.latitude, coupon.longitude) {
        (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
        _ => None,
    }
}

/// Distance in meters from `location` to the coupon's store.
#[must_use]
pub fn distance_to(coupon: &coupon::Model, location: Coordinates) -> Option<f64> {
    coordinates(coupon).map(|store| haversine_distance(location, store))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::errors::ErrorKind;
    use crate::test_utils::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_add_coupon_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let mut blank_title = new_test_coupon("x");
        blank_title.title = "   ".to_string();
        let result = add_coupon(&db, blank_title).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let mut negative = new_test_coupon("Negative stock");
        negative.total_available = Some(-1);
        let result = add_coupon(&db, negative).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let mut bad_price = new_test_coupon("Bad price");
        bad_price.original_price = Some(f64::NAN);
        let result = add_coupon(&db, bad_price).await;
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));

        assert!(get_all_coupons(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_added_coupons_are_listed_newest_first() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_test_coupon(&db, "First").await?;
        let second = create_test_coupon(&db, "Second").await?;

        let all = get_all_coupons(&db).await?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);
        assert_eq!(first.reserved_count, 0);
        assert_eq!(first.status, CouponStatus::Active);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_coupons_by_category() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_coupon(&db, "Coffee").await?;
        let mut shoes = new_test_coupon("Shoes");
        shoes.category = Category::Shopping;
        add_coupon(&db, shoes).await?;

        let food = get_coupons_by_category(&db, Category::Food).await?;
        assert_eq!(food.len(), 1);
        assert_eq!(food[0].title, "Coffee");
        Ok(())
    }

    #[tokio::test]
    async fn test_toggle_save_flips_membership() -> Result<()> {
        let db = setup_test_db().await?;
        let coupon = create_test_coupon(&db, "Saved").await?;

        assert!(toggle_save(&db, "alice", coupon.id).await?);
        assert_eq!(get_saved_ids(&db, "alice").await?, vec![coupon.id]);
        assert!(get_saved_ids(&db, "bob").await?.is_empty());

        assert!(!toggle_save(&db, "alice", coupon.id).await?);
        assert!(get_saved_ids(&db, "alice").await?.is_empty());

        let result = toggle_save(&db, "alice", 999).await;
        assert!(matches!(result, Err(Error::CouponNotFound { id: 999 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_reserve_last_unit_then_sold_out() -> Result<()> {
        let db = setup_test_db().await?;
        let coupon = create_limited_coupon(&db, "One left", 1).await?;

        let reserved = reserve_coupon(&db, "alice", coupon.id).await?;
        assert_eq!(reserved.reserved_count, 1);
        assert!(is_sold_out(&reserved));

        let result = reserve_coupon(&db, "bob", coupon.id).await;
        assert!(matches!(result, Err(Error::SoldOut { .. })));

        let after = get_coupon_by_id(&db, coupon.id).await?.unwrap();
        assert_eq!(after.reserved_count, 1);
        assert!(get_reserved_ids(&db, "bob").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_reserve_twice_by_same_user_fails() -> Result<()> {
        let db = setup_test_db().await?;
        let coupon = create_limited_coupon(&db, "Plenty", 10).await?;

        reserve_coupon(&db, "alice", coupon.id).await?;
        let err = reserve_coupon(&db, "alice", coupon.id).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyReserved { .. }));
        assert_eq!(err.kind(), ErrorKind::Capacity);

        let after = get_coupon_by_id(&db, coupon.id).await?.unwrap();
        assert_eq!(after.reserved_count, 1);
        assert_eq!(get_reserved_ids(&db, "alice").await?, vec![coupon.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_reserve_unknown_coupon() -> Result<()> {
        let db = setup_test_db().await?;
        let err = reserve_coupon(&db, "alice", 42).await.unwrap_err();
        assert!(matches!(err, Error::CouponNotFound { id: 42 }));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        Ok(())
    }

    #[tokio::test]
    async fn test_reserve_unlimited_coupon() -> Result<()> {
        let db = setup_test_db().await?;
        let coupon = create_test_coupon(&db, "Unlimited").await?;

        for user in ["a", "b", "c"] {
            reserve_coupon(&db, user, coupon.id).await?;
        }
        let after = get_coupon_by_id(&db, coupon.id).await?.unwrap();
        assert_eq!(after.reserved_count, 3);
        assert_eq!(remaining_inventory(&after), None);
        assert!(!is_sold_out(&after));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reservations_never_exceed_capacity() -> Result<()> {
        let db = Arc::new(setup_test_db().await?);
        let coupon = create_limited_coupon(&db, "Flash sale", 3).await?;

        let mut handles = Vec::new();
        for i in 0..10 {
            let db = Arc::clone(&db);
            handles.push(tokio::spawn(async move {
                reserve_coupon(&db, &format!("user{i}"), coupon.id).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(e) => assert!(matches!(e, Error::SoldOut { .. })),
            }
        }

        assert_eq!(successes, 3);
        let after = get_coupon_by_id(db.as_ref(), coupon.id).await?.unwrap();
        assert_eq!(after.reserved_count, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_vote_coupon_counts_and_stamps() -> Result<()> {
        let db = setup_test_db().await?;
        let coupon = create_test_coupon(&db, "Votable").await?;
        assert!(coupon.last_verified.is_none());

        vote_coupon(&db, coupon.id, Vote::Up).await?;
        vote_coupon(&db, coupon.id, Vote::Up).await?;
        let voted = vote_coupon(&db, coupon.id, Vote::Down).await?;

        assert_eq!(voted.upvotes, 2);
        assert_eq!(voted.downvotes, 1);
        assert!(voted.last_verified.is_some());

        let result = vote_coupon(&db, 999, Vote::Up).await;
        assert!(matches!(result, Err(Error::CouponNotFound { id: 999 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_expire_stale_coupons() -> Result<()> {
        let db = setup_test_db().await?;
        let mut old = new_test_coupon("Old");
        old.expiry_date = Utc::now() - chrono::Duration::days(1);
        let old = add_coupon(&db, old).await?;
        let fresh = create_test_coupon(&db, "Fresh").await?;

        assert_eq!(expire_stale_coupons(&db, Utc::now()).await?, 1);
        let old = get_coupon_by_id(&db, old.id).await?.unwrap();
        let fresh = get_coupon_by_id(&db, fresh.id).await?.unwrap();
        assert_eq!(old.status, CouponStatus::Expired);
        assert_eq!(fresh.status, CouponStatus::Active);
        Ok(())
    }

    #[tokio::test]
    async fn test_menu_items() -> Result<()> {
        let db = setup_test_db().await?;
        let coupon = create_test_coupon(&db, "Bistro").await?;

        add_menu_item(&db, coupon.id, "Feijoada".to_string(), 42.5).await?;
        add_menu_item(&db, coupon.id, "Caipirinha".to_string(), 18.0).await?;

        let menu = get_menu_for_coupon(&db, coupon.id).await?;
        assert_eq!(menu.len(), 2);
        assert_eq!(menu[0].name, "Feijoada");

        let result = add_menu_item(&db, coupon.id, "Free".to_string(), -1.0).await;
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_distance_requires_both_coordinates() -> Result<()> {
        let db = setup_test_db().await?;
        let located = create_located_coupon(&db, "Here", -23.5505, -46.6333).await?;
        let unlocated = create_test_coupon(&db, "Nowhere").await?;

        let here = Coordinates {
            lat: -23.5505,
            lng: -46.6333,
        };
        assert_eq!(distance_to(&located, here), Some(0.0));
        assert_eq!(distance_to(&unlocated, here), None);
        Ok(())
    }
}
