//! Application configuration loaded from `config.toml`.
//!
//! The file has a `[settings]` table with tunables for the proximity watcher, chat
//! simulation, rewards, payments and language, followed by `[[coupons]]` seed entries
//! and `[[events]]` seasonal events. Every setting has a default, so an empty file is valid.

use crate::{
    core::{coupon::NewCoupon, i18n::Language, proximity::SeasonalEvent},
    errors::{Error, Result},
};
use serde::Deserialize;
use std::{path::Path, time::Duration};

/// Default path of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Tunables
    #[serde(default)]
    pub settings: Settings,
    /// Coupons inserted when the catalog is empty
    #[serde(default)]
    pub coupons: Vec<NewCoupon>,
    /// Seasonal events watched by the proximity watcher
    #[serde(default)]
    pub events: Vec<SeasonalEvent>,
}

/// All tunables, grouped by concern.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Proximity watcher thresholds
    pub proximity: ProximitySettings,
    /// Chat simulation
    pub chat: ChatSettings,
    /// Loyalty rewards
    pub rewards: RewardSettings,
    /// Simulated payment processor
    pub payment: PaymentSettings,
    /// Language defaults
    pub i18n: I18nSettings,
}

/// Thresholds for smart notifications.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProximitySettings {
    /// Radius for saved coupons and itinerary stops, in meters
    pub coupon_radius_m: f64,
    /// Radius for seasonal events, in meters
    pub event_radius_m: f64,
    /// How far ahead an expiry triggers an alert, in hours
    pub expiry_window_hours: i64,
}

impl Default for ProximitySettings {
    fn default() -> Self {
        Self {
            coupon_radius_m: 500.0,
            event_radius_m: 1_000.0,
            expiry_window_hours: 24,
        }
    }
}

impl ProximitySettings {
    /// Expiry window as a [`chrono::Duration`], or `None` when the hour count is too
    /// large to represent.
    #[must_use]
    pub fn expiry_window(&self) -> Option<chrono::Duration> {
        chrono::Duration::try_hours(self.expiry_window_hours)
    }

    fn validate(&self) -> Result<()> {
        for (name, radius) in [
            ("coupon_radius_m", self.coupon_radius_m),
            ("event_radius_m", self.event_radius_m),
        ] {
            if !radius.is_finite() || radius < 0.0 {
                return Err(Error::Config {
                    message: format!(
                        "settings.proximity.{name} must be a non-negative number, got {radius}"
                    ),
                });
            }
        }
        if self.expiry_window_hours < 0 || self.expiry_window().is_none() {
            return Err(Error::Config {
                message: format!(
                    "settings.proximity.expiry_window_hours out of range: {}",
                    self.expiry_window_hours
                ),
            });
        }
        Ok(())
    }
}

/// Simulated counterpart behaviour.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Delay before the automated reply, in milliseconds
    pub reply_delay_ms: u64,
    /// Text of the automated reply
    pub auto_reply: String,
}

impl ChatSettings {
    /// Reply delay as a [`Duration`].
    #[must_use]
    pub const fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            reply_delay_ms: 2_000,
            auto_reply: "Thanks for your message! We'll get back to you shortly.".to_string(),
        }
    }
}

/// Loyalty programme.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RewardSettings {
    /// Points credited after a successful purchase
    pub points_per_purchase: i32,
}

impl Default for RewardSettings {
    fn default() -> Self {
        Self {
            points_per_purchase: 50,
        }
    }
}

/// Simulated payment processor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaymentSettings {
    /// Simulated processing latency, in milliseconds
    pub processing_delay_ms: u64,
    /// Give up after this long, in milliseconds
    pub timeout_ms: u64,
}

impl PaymentSettings {
    /// Processing latency as a [`Duration`].
    #[must_use]
    pub const fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }

    /// Timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            processing_delay_ms: 1_500,
            timeout_ms: 10_000,
        }
    }
}

/// Language defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct I18nSettings {
    /// Fallback and initial language
    pub default_language: Language,
}

impl Default for I18nSettings {
    fn default() -> Self {
        Self {
            default_language: Language::Pt,
        }
    }
}

/// Parses configuration from a TOML string.
///
/// # Errors
/// Returns an error if the TOML is invalid or a proximity setting is out of range.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.settings.proximity.validate()?;
    Ok(config)
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_config(&contents)
}

/// Loads configuration from `DEALSCOUT_CONFIG`, or `./config.toml` when unset.
/// A missing default file yields the built-in defaults with an empty catalog.
pub fn load_default_config() -> Result<AppConfig> {
    if let Ok(path) = std::env::var("DEALSCOUT_CONFIG") {
        return load_config(path);
    }
    if Path::new(DEFAULT_CONFIG_PATH).exists() {
        load_config(DEFAULT_CONFIG_PATH)
    } else {
        tracing::warn!("{DEFAULT_CONFIG_PATH} not found, using built-in defaults");
        Ok(AppConfig::default())
    }
}
