//! Vendor campaigns - Publishing coupons on behalf of a store and comparing variants.

use crate::{
    core::coupon::{self, NewCoupon},
    entities::coupon as coupon_entity,
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use tracing::{info, instrument};

/// Publishes a vendor campaign as a new coupon.
///
/// The coupon is attributed to `vendor` and must not already be expired. Everything else
/// goes through [`coupon::add_coupon`], so the campaign shows up first in the catalog.
#[instrument(skip(db, draft), fields(title = %draft.title))]
pub async fn create_campaign(
    db: &DatabaseConnection,
    vendor: &str,
    mut draft: NewCoupon,
) -> Result<coupon_entity::Model> {
    let vendor = vendor.trim();
    if vendor.is_empty() {
        return Err(Error::invalid("Vendor name cannot be empty"));
    }
    if draft.expiry_date <= Utc::now() {
        return Err(Error::invalid("Campaign expiry must be in the future"));
    }

    draft.store_name = vendor.to_string();
    let created = coupon::add_coupon(db, draft).await?;
    info!("Vendor {vendor} launched campaign coupon {}", created.id);
    Ok(created)
}

/// Which side of an A/B test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Control arm
    A,
    /// Challenger arm
    B,
}

/// Observed traffic for one variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VariantStats {
    /// Times the variant was shown
    pub impressions: u64,
    /// Times the variant converted
    pub conversions: u64,
}

impl VariantStats {
    /// Build stats from raw counts.
    #[must_use]
    pub const fn new(impressions: u64, conversions: u64) -> Self {
        Self {
            impressions,
            conversions,
        }
    }

    /// Conversions per impression, `None` without impressions.
    ///
    /// Conversions are capped at the impression count.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn conversion_rate(&self) -> Option<f64> {
        if self.impressions == 0 {
            return None;
        }
        let conversions = self.conversions.min(self.impressions);
        Some(conversions as f64 / self.impressions as f64)
    }
}

/// Outcome of [`compare_variants`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbComparison {
    /// Conversion rate of variant A, if it was ever shown
    pub rate_a: Option<f64>,
    /// Conversion rate of variant B, if it was ever shown
    pub rate_b: Option<f64>,
    /// Relative lift of B over A, `None` when A has no conversions to compare against
    pub lift: Option<f64>,
    /// Higher conversion rate, `None` on a tie or when either side lacks impressions
    pub winner: Option<Variant>,
}

/// Compares two variants by conversion rate.
#[must_use]
pub fn compare_variants(a: VariantStats, b: VariantStats) -> AbComparison {
    let rate_a = a.conversion_rate();
    let rate_b = b.conversion_rate();

    let (lift, winner) = match (rate_a, rate_b) {
        (Some(ra), Some(rb)) => {
            let lift = (ra > 0.0).then(|| (rb - ra) / ra);
            let winner = if (ra - rb).abs() < f64::EPSILON {
                None
            } else if ra > rb {
                Some(Variant::A)
            } else {
                Some(Variant::B)
            };
            (lift, winner)
        }
        _ => (None, None),
    };

    AbComparison {
        rate_a,
        rate_b,
        lift,
        winner,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use chrono::Duration;

    #[test]
    fn test_conversion_rate() {
        assert_eq!(VariantStats::new(0, 0).conversion_rate(), None);
        assert_eq!(VariantStats::new(200, 50).conversion_rate(), Some(0.25));
        assert_eq!(VariantStats::new(10, 40).conversion_rate(), Some(1.0));
    }

    #[test]
    fn test_compare_variants_picks_higher_rate() {
        let result = compare_variants(VariantStats::new(1000, 50), VariantStats::new(1000, 75));
        assert_eq!(result.rate_a, Some(0.05));
        assert_eq!(result.rate_b, Some(0.075));
        assert_eq!(result.winner, Some(Variant::B));
        assert!((result.lift.unwrap() - 0.5).abs() < 1e-9);

        let result = compare_variants(VariantStats::new(100, 30), VariantStats::new(100, 10));
        assert_eq!(result.winner, Some(Variant::A));
        assert!(result.lift.unwrap() < 0.0);
    }

    #[test]
    fn test_compare_variants_tie_and_missing_data() {
        let tie = compare_variants(VariantStats::new(100, 10), VariantStats::new(200, 20));
        assert_eq!(tie.winner, None);
        assert_eq!(tie.lift, Some(0.0));

        let empty = compare_variants(VariantStats::new(0, 0), VariantStats::new(100, 10));
        assert_eq!(empty.winner, None);
        assert_eq!(empty.lift, None);
        assert_eq!(empty.rate_b, Some(0.1));

        let no_baseline = compare_variants(VariantStats::new(100, 0), VariantStats::new(100, 5));
        assert_eq!(no_baseline.winner, Some(Variant::B));
        assert_eq!(no_baseline.lift, None);
    }

    #[tokio::test]
    async fn test_create_campaign_attributes_vendor() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_coupon(&db, "Older deal").await?;

        let mut draft = new_test_coupon("Happy hour");
        draft.store_name = "ignored".to_string();
        let created = create_campaign(&db, "  Bar do Zé ", draft).await?;
        assert_eq!(created.store_name, "Bar do Zé");

        let catalog = coupon::get_all_coupons(&db).await?;
        assert_eq!(catalog[0].id, created.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_campaign_rejects_past_expiry() -> Result<()> {
        let db = setup_test_db().await?;
        let mut draft = new_test_coupon("Yesterday's special");
        draft.expiry_date = Utc::now() - Duration::days(1);

        let result = create_campaign(&db, "Padaria", draft).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let result = create_campaign(&db, "   ", new_test_coupon("No vendor")).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
        Ok(())
    }
}
