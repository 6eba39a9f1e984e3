//! Catalog seeding from config.toml.
//!
//! The `[[coupons]]` entries of the configuration populate the database on first
//! run. Seeding is skipped once the catalog holds any coupon, so vendor and
//! community additions are never duplicated by a restart.

use crate::{
    config::AppConfig,
    core::coupon,
    entities::Coupon,
    errors::Result,
};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use tracing::info;

/// Inserts the configured seed coupons when the catalog is empty.
///
/// # Returns
/// The number of coupons inserted (zero when the catalog was already populated).
pub async fn seed_catalog(db: &DatabaseConnection, config: &AppConfig) -> Result<usize> {
    let existing = Coupon::find().count(db).await?;
    if existing > 0 {
        info!("Catalog already holds {existing} coupons, skipping seed");
        return Ok(0);
    }

    for seed in &config.coupons {
        coupon::add_coupon(db, seed.clone()).await?;
    }
    info!("Seeded {} coupons from configuration", config.coupons.len());
    Ok(config.coupons.len())
}
