#![allow(clippy::result_large_err)]

use dealscout::{
    bot::{self, BotData},
    config::{self, database},
    core::{coupon, i18n::Catalog, session::SessionRegistry},
    errors::{Error, Result},
};
use dotenvy::dotenv;
use sea_orm::DatabaseConnection;
use std::{env, sync::Arc, time::Duration};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// How often expired coupons are swept
const EXPIRY_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

async fn sweep_expired_coupons(db: DatabaseConnection) {
    let mut interval = tokio::time::interval(EXPIRY_SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        match coupon::expire_stale_coupons(&db, chrono::Utc::now()).await {
            Ok(0) => {}
            Ok(expired) => info!("Marked {expired} coupons as expired"),
            Err(e) => warn!("Expiry sweep failed: {e}"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load settings, seed catalog and seasonal events
    let app_config = config::load_default_config()
        .inspect_err(|e| error!("Critical error loading application configuration: {e}"))?;
    let catalog = Arc::new(Catalog::load_default()?);
    info!(
        "Loaded configuration: {} seed coupons, {} events, {} languages",
        app_config.coupons.len(),
        app_config.events.len(),
        catalog.language_count()
    );

    // 4. Initialize database
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {e}"))?;

    // 5. Seed the catalog on first run
    config::catalog::seed_catalog(&db, &app_config)
        .await
        .inspect_err(|e| error!("Failed to seed catalog: {e}"))?;
    tokio::spawn(sweep_expired_coupons(db.clone()));

    // 6. Run the bot
    // DISCORD_BOT_TOKEN is loaded here, directly before use, not stored in AppConfig
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;

    let settings = Arc::new(app_config.settings);
    let sessions = SessionRegistry::new(
        db.clone(),
        Arc::clone(&settings),
        catalog,
        Arc::new(app_config.events),
    );
    bot::run_bot(token, BotData::new(db, settings, sessions)).await
}
