//! Review business logic - Ratings and comments on coupons.
//!
//! Every new review recomputes the coupon's `average_rating` from all stored ratings,
//! so the average depends only on the multiset of ratings, never on submission order.

use crate::{
    entities::{Coupon, Review, coupon, review},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

/// A review as submitted by a user, before id and timestamp are assigned.
#[derive(Debug, Clone)]
pub struct NewReview {
    /// Author's user id
    pub user_id: String,
    /// Author's display name
    pub user_name: String,
    /// Rating from 1 to 5
    pub rating: i32,
    /// Free-text comment
    pub comment: String,
}

/// Arithmetic mean of `ratings`, `None` when empty.
#[must_use]
pub fn average_rating(ratings: &[i32]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    #[allow(clippy::cast_precision_loss)] // review counts stay far below 2^52
    let mean = sum as f64 / ratings.len() as f64;
    Some(mean)
}

/// Stores a review and refreshes the coupon's rating summary in one transaction.
///
/// # Errors
/// * [`Error::InvalidRating`] - rating outside 1..=5
/// * [`Error::CouponNotFound`] - unknown coupon
pub async fn add_review(
    db: &DatabaseConnection,
    coupon_id: i64,
    new_review: NewReview,
) -> Result<review::Model> {
    if !(1..=5).contains(&new_review.rating) {
        return Err(Error::InvalidRating {
            rating: new_review.rating,
        });
    }

    let txn = db.begin().await?;

    let coupon = Coupon::find_by_id(coupon_id)
        .one(&txn)
        .await?
        .ok_or(Error::CouponNotFound { id: coupon_id })?;

    let created = review::ActiveModel {
        coupon_id: Set(coupon_id),
        user_id: Set(new_review.user_id),
        user_name: Set(new_review.user_name),
        rating: Set(new_review.rating),
        comment: Set(new_review.comment.trim().to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let ratings: Vec<i32> = Review::find()
        .filter(review::Column::CouponId.eq(coupon_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|r| r.rating)
        .collect();

    let average = average_rating(&ratings);
    let count = i32::try_from(ratings.len()).unwrap_or(i32::MAX);

    let mut summary: coupon::ActiveModel = coupon.into();
    summary.average_rating = Set(average);
    summary.review_count = Set(count);
    summary.update(&txn).await?;

    txn.commit().await?;

    info!(
        "Review {} added to coupon {coupon_id}, average now {:.2} over {count}",
        created.id,
        average.unwrap_or_default()
    );
    Ok(created)
}

/// Reviews for a coupon, newest first.
pub async fn get_reviews_for_coupon(
    db: &DatabaseConnection,
    coupon_id: i64,
) -> Result<Vec<review::Model>> {
    Review::find()
        .filter(review::Column::CouponId.eq(coupon_id))
        .order_by_desc(review::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::coupon::get_coupon_by_id;
    use crate::test_utils::*;

    fn review(rating: i32) -> NewReview {
        NewReview {
            user_id: "reviewer".to_string(),
            user_name: "Reviewer".to_string(),
            rating,
            comment: "  Great deal  ".to_string(),
        }
    }

    #[test]
    fn test_average_rating() {
        assert_eq!(average_rating(&[]), None);
        assert_eq!(average_rating(&[5]), Some(5.0));
        assert_eq!(average_rating(&[5, 3, 4]), Some(4.0));
        assert_eq!(average_rating(&[1, 2]), Some(1.5));
    }

    #[tokio::test]
    async fn test_average_is_independent_of_order() -> Result<()> {
        let db = setup_test_db().await?;
        let orders = [[5, 3, 4], [4, 5, 3], [3, 4, 5]];

        for order in orders {
            let coupon = create_test_coupon(&db, "Rated").await?;
            for rating in order {
                add_review(&db, coupon.id, review(rating)).await?;
            }
            let rated = get_coupon_by_id(&db, coupon.id).await?.unwrap();
            assert_eq!(rated.average_rating, Some(4.0));
            assert_eq!(rated.review_count, 3);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_add_review_assigns_id_and_trims() -> Result<()> {
        let db = setup_test_db().await?;
        let coupon = create_test_coupon(&db, "Rated").await?;

        let first = add_review(&db, coupon.id, review(5)).await?;
        let second = add_review(&db, coupon.id, review(4)).await?;
        assert_ne!(first.id, second.id);
        assert_eq!(first.comment, "Great deal");

        let reviews = get_reviews_for_coupon(&db, coupon.id).await?;
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].id, second.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_review_rejects_bad_rating() -> Result<()> {
        let db = setup_test_db().await?;
        let coupon = create_test_coupon(&db, "Rated").await?;

        for rating in [0, 6, -1] {
            let result = add_review(&db, coupon.id, review(rating)).await;
            assert!(matches!(result, Err(Error::InvalidRating { .. })));
        }

        let untouched = get_coupon_by_id(&db, coupon.id).await?.unwrap();
        assert_eq!(untouched.average_rating, None);
        assert_eq!(untouched.review_count, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_review_unknown_coupon() -> Result<()> {
        let db = setup_test_db().await?;
        let result = add_review(&db, 77, review(3)).await;
        assert!(matches!(result, Err(Error::CouponNotFound { id: 77 })));
        Ok(())
    }
}
