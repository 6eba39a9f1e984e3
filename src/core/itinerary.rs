//! Itinerary business logic - Trip plans made of day buckets of coupon stops.
//!
//! Aggregates (`total_savings`, `duration_days`) are computed once, when the itinerary is
//! saved. A user has at most one active itinerary; its stops feed the proximity watcher.

use crate::{
    entities::{Coupon, Itinerary, ItineraryStop, coupon, itinerary, itinerary_stop},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use std::collections::HashMap;
use tracing::info;

/// One day of a saved itinerary with its stops in visiting order.
#[derive(Debug, Clone)]
pub struct DayPlan {
    /// Zero-based day number
    pub day_index: i32,
    /// Coupons to visit that day
    pub stops: Vec<coupon::Model>,
}

/// Money saved at one stop: regular price minus coupon price, never negative.
#[must_use]
pub fn stop_savings(coupon: &coupon::Model) -> f64 {
    match (coupon.original_price, coupon.discounted_price) {
        (Some(original), Some(discounted)) => (original - discounted).max(0.0),
        _ => 0.0,
    }
}

/// Total savings over a list of stops. A coupon visited twice counts twice.
#[must_use]
pub fn total_savings<'a>(stops: impl IntoIterator<Item = &'a coupon::Model>) -> f64 {
    stops.into_iter().map(stop_savings).sum()
}

/// Saves a new itinerary for `user_id`.
///
/// `days` holds one list of coupon ids per day, in visiting order.
///
/// # Errors
/// * [`Error::InvalidInput`] - empty title or no days
/// * [`Error::CouponNotFound`] - a stop references an unknown coupon
pub async fn create_itinerary(
    db: &DatabaseConnection,
    user_id: &str,
    title: &str,
    days: Vec<Vec<i64>>,
) -> Result<itinerary::Model> {
    if title.trim().is_empty() {
        return Err(Error::invalid("Itinerary title cannot be empty"));
    }
    if days.is_empty() {
        return Err(Error::invalid("An itinerary needs at least one day"));
    }

    let txn = db.begin().await?;

    let mut wanted: Vec<i64> = days.iter().flatten().copied().collect();
    wanted.sort_unstable();
    wanted.dedup();
    let coupons: HashMap<i64, coupon::Model> = Coupon::find()
        .filter(coupon::Column::Id.is_in(wanted.clone()))
        .all(&txn)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    if let Some(missing) = wanted.iter().find(|id| !coupons.contains_key(id)) {
        return Err(Error::CouponNotFound { id: *missing });
    }

    let savings = total_savings(days.iter().flatten().filter_map(|id| coupons.get(id)));
    let duration = i32::try_from(days.len()).map_err(|_| Error::invalid("Too many days"))?;

    let saved = itinerary::ActiveModel {
        user_id: Set(user_id.to_string()),
        title: Set(title.trim().to_string()),
        is_active: Set(false),
        total_savings: Set(savings),
        duration_days: Set(duration),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for (day_index, stops) in (0_i32..).zip(&days) {
        for (position, coupon_id) in (0_i32..).zip(stops) {
            itinerary_stop::ActiveModel {
                itinerary_id: Set(saved.id),
                day_index: Set(day_index),
                position: Set(position),
                coupon_id: Set(*coupon_id),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
    }

    txn.commit().await?;
    info!(
        "Saved itinerary {} '{}' for {user_id}: {duration} days, {savings:.2} saved",
        saved.id, saved.title
    );
    Ok(saved)
}

/// Fetch an itinerary by id.
pub async fn get_itinerary(
    db: &DatabaseConnection,
    itinerary_id: i64,
) -> Result<Option<itinerary::Model>> {
    Itinerary::find_by_id(itinerary_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// All itineraries owned by `user_id`, newest first.
pub async fn get_itineraries_for_user(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<itinerary::Model>> {
    Itinerary::find()
        .filter(itinerary::Column::UserId.eq(user_id))
        .order_by_desc(itinerary::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The day plans of an itinerary, in order.
pub async fn get_itinerary_days(
    db: &DatabaseConnection,
    itinerary_id: i64,
) -> Result<Vec<DayPlan>> {
    let itinerary = get_itinerary(db, itinerary_id)
        .await?
        .ok_or(Error::ItineraryNotFound { id: itinerary_id })?;

    let stops = ItineraryStop::find()
        .filter(itinerary_stop::Column::ItineraryId.eq(itinerary_id))
        .order_by_asc(itinerary_stop::Column::DayIndex)
        .order_by_asc(itinerary_stop::Column::Position)
        .find_also_related(Coupon)
        .all(db)
        .await?;

    let mut days: Vec<DayPlan> = (0..itinerary.duration_days)
        .map(|day_index| DayPlan {
            day_index,
            stops: Vec::new(),
        })
        .collect();
    for (stop, coupon) in stops {
        let (Some(coupon), Ok(index)) = (coupon, usize::try_from(stop.day_index)) else {
            continue;
        };
        if let Some(day) = days.get_mut(index) {
            day.stops.push(coupon);
        }
    }
    Ok(days)
}

/// Makes `itinerary_id` the owner's only active itinerary.
///
/// # Errors
/// [`Error::ItineraryNotFound`] when the itinerary does not exist or belongs to someone else.
pub async fn set_active_itinerary(
    db: &DatabaseConnection,
    user_id: &str,
    itinerary_id: i64,
) -> Result<itinerary::Model> {
    let txn = db.begin().await?;

    let target = Itinerary::find_by_id(itinerary_id)
        .one(&txn)
        .await?
        .filter(|i| i.user_id == user_id)
        .ok_or(Error::ItineraryNotFound { id: itinerary_id })?;

    Itinerary::update_many()
        .col_expr(itinerary::Column::IsActive, Expr::value(false))
        .filter(itinerary::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;

    let mut active: itinerary::ActiveModel = target.into();
    active.is_active = Set(true);
    let active = active.update(&txn).await?;

    txn.commit().await?;
    info!("Itinerary {itinerary_id} is now active for {user_id}");
    Ok(active)
}

/// Distinct coupons on the user's active itinerary; empty when none is active.
pub async fn get_active_itinerary_coupons(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<coupon::Model>> {
    let Some(active) = Itinerary::find()
        .filter(itinerary::Column::UserId.eq(user_id))
        .filter(itinerary::Column::IsActive.eq(true))
        .one(db)
        .await?
    else {
        return Ok(Vec::new());
    };

    let mut coupons: Vec<coupon::Model> = get_itinerary_days(db, active.id)
        .await?
        .into_iter()
        .flat_map(|day| day.stops)
        .collect();
    coupons.sort_by_key(|c| c.id);
    coupons.dedup_by_key(|c| c.id);
    Ok(coupons)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::coupon::add_coupon;
    use crate::test_utils::*;

    async fn priced(db: &DatabaseConnection, title: &str, original: f64, discounted: f64) -> Result<coupon::Model> {
        let mut new = new_test_coupon(title);
        new.original_price = Some(original);
        new.discounted_price = Some(discounted);
        add_coupon(db, new).await
    }

    #[tokio::test]
    async fn test_create_itinerary_computes_aggregates() -> Result<()> {
        let db = setup_test_db().await?;
        let museum = priced(&db, "Museum", 40.0, 30.0).await?;
        let dinner = priced(&db, "Dinner", 100.0, 75.0).await?;
        let walk = create_test_coupon(&db, "Free walk").await?;

        let trip = create_itinerary(
            &db,
            "alice",
            "Rio weekend",
            vec![vec![museum.id, walk.id], vec![dinner.id], vec![museum.id]],
        )
        .await?;

        assert_eq!(trip.duration_days, 3);
        assert_eq!(trip.total_savings, 10.0 + 25.0 + 10.0);
        assert!(!trip.is_active);

        let days = get_itinerary_days(&db, trip.id).await?;
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].stops.len(), 2);
        assert_eq!(days[0].stops[0].id, museum.id);
        assert_eq!(days[0].stops[1].id, walk.id);
        assert_eq!(days[1].stops[0].id, dinner.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_itinerary_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let coupon = create_test_coupon(&db, "Stop").await?;

        let result = create_itinerary(&db, "alice", " ", vec![vec![coupon.id]]).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let result = create_itinerary(&db, "alice", "Trip", Vec::new()).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let result = create_itinerary(&db, "alice", "Trip", vec![vec![coupon.id, 404]]).await;
        assert!(matches!(result, Err(Error::CouponNotFound { id: 404 })));

        assert!(get_itineraries_for_user(&db, "alice").await?.is_empty());
        Ok(())
    }

    #[test]
    fn test_stop_savings_never_negative() {
        let mut coupon = sample_coupon_model(1);
        coupon.original_price = Some(10.0);
        coupon.discounted_price = Some(12.0);
        assert_eq!(stop_savings(&coupon), 0.0);

        coupon.discounted_price = None;
        assert_eq!(stop_savings(&coupon), 0.0);
    }

    #[tokio::test]
    async fn test_only_one_active_itinerary() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_coupon(&db, "A").await?;
        let b = create_test_coupon(&db, "B").await?;

        let first = create_itinerary(&db, "alice", "First", vec![vec![a.id]]).await?;
        let second = create_itinerary(&db, "alice", "Second", vec![vec![b.id, a.id]]).await?;

        assert!(get_active_itinerary_coupons(&db, "alice").await?.is_empty());

        set_active_itinerary(&db, "alice", first.id).await?;
        set_active_itinerary(&db, "alice", second.id).await?;

        let all = get_itineraries_for_user(&db, "alice").await?;
        let active: Vec<_> = all.iter().filter(|i| i.is_active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.id);

        let coupons = get_active_itinerary_coupons(&db, "alice").await?;
        let ids: Vec<i64> = coupons.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_cannot_activate_someone_elses_itinerary() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_coupon(&db, "A").await?;
        let trip = create_itinerary(&db, "alice", "Mine", vec![vec![a.id]]).await?;

        let result = set_active_itinerary(&db, "bob", trip.id).await;
        assert!(matches!(result, Err(Error::ItineraryNotFound { .. })));

        let result = get_itinerary_days(&db, 999).await;
        assert!(matches!(result, Err(Error::ItineraryNotFound { id: 999 })));
        Ok(())
    }
}
