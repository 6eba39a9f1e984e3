//! Core module - Framework-agnostic business logic.
//! Database-backed operations take a `DatabaseConnection`; the in-memory stores are
//! plain `Send + Sync` types owned by a [`session::Session`].

/// Vendor campaigns and A/B variant comparison
pub mod campaign;
/// Chat threads with simulated replies
pub mod chat;
/// Payment processing and loyalty rewards at checkout
pub mod checkout;
/// Coupon catalog, saving, voting and reservations
pub mod coupon;
/// Currency, date and distance formatting
pub mod format;
/// Languages and translation lookup
pub mod i18n;
/// Multi-day trip planning
pub mod itinerary;
/// In-memory inbox and toasts
pub mod notification;
/// Distance math and the smart-notification watcher
pub mod proximity;
/// Coupon reviews and ratings
pub mod review;
/// Per-user bundles of in-memory stores
pub mod session;
/// Users, roles and loyalty points
pub mod user;
