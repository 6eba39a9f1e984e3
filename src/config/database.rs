//! Database configuration module for `DealScout`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs without hand-written SQL.

use crate::entities::{
    Coupon, Itinerary, ItineraryStop, MenuItem, Reservation, Review, SavedCoupon, User,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::info;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/dealscout.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable,
/// falling back to a local `SQLite` file.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Directory holding a file-backed `SQLite` database, if the URL names one.
#[must_use]
pub fn sqlite_directory(database_url: &str) -> Option<&Path> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split_once('?').map_or(path, |(file, _)| file);
    Path::new(path)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
}

/// Establishes a connection to the database named by [`get_database_url`].
/// The directory of a file-backed `SQLite` database is created if missing.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if let Some(dir) = sqlite_directory(&database_url) {
        std::fs::create_dir_all(dir)?;
    }
    info!("Connecting to database at {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates every table the application needs, skipping those that already exist.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    create_table(db, Coupon).await?;
    create_table(db, Review).await?;
    create_table(db, MenuItem).await?;
    create_table(db, SavedCoupon).await?;
    create_table(db, Reservation).await?;
    create_table(db, Itinerary).await?;
    create_table(db, ItineraryStop).await?;
    create_table(db, User).await?;
    Ok(())
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{CouponModel, ReservationModel, UserModel};
    use sea_orm::QuerySelect;

    #[test]
    fn test_sqlite_directory() {
        assert_eq!(
            sqlite_directory("sqlite://data/dealscout.sqlite?mode=rwc"),
            Some(Path::new("data"))
        );
        assert_eq!(sqlite_directory("sqlite://dealscout.sqlite"), None);
        assert_eq!(sqlite_directory("sqlite::memory:"), None);
    }

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        let _: Vec<CouponModel> = Coupon::find().limit(1).all(&db).await?;
        let _: Vec<ReservationModel> = Reservation::find().limit(1).all(&db).await?;
        let _: Vec<UserModel> = User::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_repeatable() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
