/// Database configuration and connection management
pub mod database;

/// Catalog seeding from config.toml
pub mod catalog;

/// Application settings, seed coupons and seasonal events from config.toml
pub mod settings;

pub use settings::{AppConfig, Settings, load_config, load_default_config, parse_config};
