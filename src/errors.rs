//! Unified error type for `DealScout`.
//!
//! Every fallible operation returns [`Result`]. Failures fall into a small closed set of
//! kinds (see [`ErrorKind`]) so callers can handle them exhaustively instead of checking
//! booleans or matching on message strings.

use thiserror::Error;

/// All errors produced by the application.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or unreadable configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Underlying database failure.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// No coupon with this id exists.
    #[error("Coupon {id} not found")]
    CouponNotFound {
        /// Requested coupon id
        id: i64,
    },

    /// The coupon's inventory is exhausted.
    #[error("Coupon {coupon_id} is sold out")]
    SoldOut {
        /// Coupon that ran out
        coupon_id: i64,
    },

    /// The user already holds a reservation for this coupon.
    #[error("Coupon {coupon_id} is already reserved by this user")]
    AlreadyReserved {
        /// Coupon that was already reserved
        coupon_id: i64,
    },

    /// No itinerary with this id exists.
    #[error("Itinerary {id} not found")]
    ItineraryNotFound {
        /// Requested itinerary id
        id: i64,
    },

    /// No chat thread with this id exists.
    #[error("Chat thread {id} not found")]
    ThreadNotFound {
        /// Requested thread id
        id: u64,
    },

    /// No user with this id exists.
    #[error("User '{id}' not found")]
    UserNotFound {
        /// Requested user id
        id: String,
    },

    /// Caller supplied malformed input.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Human-readable reason
        message: String,
    },

    /// Review rating outside 1..=5.
    #[error("Invalid rating {rating}: must be between 1 and 5")]
    InvalidRating {
        /// Rejected rating
        rating: i32,
    },

    /// Amount is zero, negative, or not finite.
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// Rejected amount
        amount: f64,
    },

    /// Payment processor refused the payment.
    #[error("Payment declined: {reason}")]
    PaymentDeclined {
        /// Processor-supplied reason
        reason: String,
    },

    /// A simulated remote operation took too long.
    #[error("Operation '{operation}' timed out")]
    Timeout {
        /// Name of the operation that timed out
        operation: String,
    },

    /// I/O failure (config files, translation catalog).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure while building a reply.
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Environment variable missing or invalid.
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Discord framework failure.
    #[error("Serenity/Poise framework error: {0}")]
    #[allow(clippy::enum_variant_names)]
    FrameworkError(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::FrameworkError(Box::new(value))
    }
}

/// Closed classification of [`Error`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Inventory exhausted or already reserved.
    Capacity,
    /// Malformed input rejected before any state change.
    InvalidInput,
    /// Referenced entity does not exist.
    NotFound,
    /// Infrastructure or collaborator failure.
    Failure,
}

impl Error {
    /// Classifies this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::SoldOut { .. } | Self::AlreadyReserved { .. } => ErrorKind::Capacity,
            Self::InvalidInput { .. } | Self::InvalidRating { .. } | Self::InvalidAmount { .. } => {
                ErrorKind::InvalidInput
            }
            Self::CouponNotFound { .. }
            | Self::ItineraryNotFound { .. }
            | Self::ThreadNotFound { .. }
            | Self::UserNotFound { .. } => ErrorKind::NotFound,
            Self::Config { .. }
            | Self::Database(_)
            | Self::PaymentDeclined { .. }
            | Self::Timeout { .. }
            | Self::Io(_)
            | Self::Fmt(_)
            | Self::EnvVar(_)
            | Self::FrameworkError(_) => ErrorKind::Failure,
        }
    }

    /// Shorthand for [`Error::InvalidInput`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
