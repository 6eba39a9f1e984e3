//! Checkout business logic - Paying for a coupon and earning loyalty points.
//!
//! The payment processor is a collaborator behind the [`PaymentProcessor`] trait. The
//! bundled [`SimulatedProcessor`] stands in for a real gateway: it waits a configurable
//! latency and then approves or declines. Every payment runs under a timeout.

use crate::{
    config::Settings,
    core::{coupon, user},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use std::{
    future::Future,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};
use tracing::{info, instrument, warn};

/// Maximum number of credit card installments.
pub const MAX_INSTALLMENTS: u8 = 12;

/// Supported payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    /// Credit card, optionally in installments
    CreditCard,
    /// Debit card
    DebitCard,
    /// Instant bank transfer
    Pix,
    /// Bank slip
    Boleto,
}

impl PaymentMethod {
    /// Whether the method can be split into installments.
    #[must_use]
    pub const fn allows_installments(self) -> bool {
        matches!(self, Self::CreditCard)
    }
}

/// What the processor is asked to charge.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    /// Coupon being purchased
    pub coupon_id: i64,
    /// Amount charged
    pub amount: f64,
    /// How the customer pays
    pub method: PaymentMethod,
    /// Number of installments (1 for a single charge)
    pub installments: u8,
}

/// Proof of a successful charge.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    /// Processor-assigned reference
    pub transaction_id: String,
    /// Amount charged
    pub amount: f64,
    /// Method used
    pub method: PaymentMethod,
    /// Installments the charge was split into
    pub installments: u8,
    /// When the processor settled the charge
    pub processed_at: DateTime<Utc>,
}

/// A payment gateway.
pub trait PaymentProcessor: Send + Sync {
    /// Charges the request. Declines are reported as [`Error::PaymentDeclined`].
    fn process(
        &self,
        request: &PaymentRequest,
    ) -> impl Future<Output = Result<PaymentReceipt>> + Send;
}

/// Gateway stand-in with fixed latency and a fixed verdict.
#[derive(Debug)]
pub struct SimulatedProcessor {
    latency: Duration,
    approve: bool,
    sequence: AtomicU64,
}

impl SimulatedProcessor {
    /// Processor that approves every charge after `latency`.
    #[must_use]
    pub const fn approving(latency: Duration) -> Self {
        Self {
            latency,
            approve: true,
            sequence: AtomicU64::new(0),
        }
    }

    /// Processor that declines every charge after `latency`.
    #[must_use]
    pub const fn declining(latency: Duration) -> Self {
        Self {
            latency,
            approve: false,
            sequence: AtomicU64::new(0),
        }
    }
}

impl PaymentProcessor for SimulatedProcessor {
    async fn process(&self, request: &PaymentRequest) -> Result<PaymentReceipt> {
        tokio::time::sleep(self.latency).await;
        if !self.approve {
            return Err(Error::PaymentDeclined {
                reason: "Card declined by issuer".to_string(),
            });
        }
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(PaymentReceipt {
            transaction_id: format!("SIM-{sequence:06}"),
            amount: request.amount,
            method: request.method,
            installments: request.installments,
            processed_at: Utc::now(),
        })
    }
}

/// Result of a completed checkout.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    /// Receipt from the payment processor
    pub receipt: PaymentReceipt,
    /// Points credited for this purchase
    pub points_awarded: i32,
    /// Balance after crediting
    pub total_points: i32,
}

/// Minimal structural email check: one `@`, a non-empty local part and a dotted domain.
pub fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    let malformed = || Error::invalid(format!("'{email}' is not a valid email address"));

    if email.chars().any(char::is_whitespace) {
        return Err(malformed());
    }
    let (local, domain) = email.split_once('@').ok_or_else(malformed)?;
    if local.is_empty() || domain.contains('@') {
        return Err(malformed());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(malformed());
    }
    Ok(())
}

fn validate_request(request: &PaymentRequest) -> Result<()> {
    if !request.amount.is_finite() || request.amount <= 0.0 {
        return Err(Error::InvalidAmount {
            amount: request.amount,
        });
    }
    if request.installments == 0 || request.installments > MAX_INSTALLMENTS {
        return Err(Error::invalid(format!(
            "Installments must be between 1 and {MAX_INSTALLMENTS}"
        )));
    }
    if request.installments > 1 && !request.method.allows_installments() {
        return Err(Error::invalid(
            "Only credit card payments can be split into installments",
        ));
    }
    Ok(())
}

/// Pays for a coupon and credits loyalty points.
///
/// Input is validated before the processor is contacted; the processor call is bounded
/// by the configured payment timeout.
///
/// # Errors
/// * [`Error::InvalidInput`] / [`Error::InvalidAmount`] - malformed email or request
/// * [`Error::CouponNotFound`] / [`Error::UserNotFound`] - unknown coupon or buyer
/// * [`Error::PaymentDeclined`] - processor refused
/// * [`Error::Timeout`] - processor did not answer in time
#[instrument(skip(db, processor, settings, email, request), fields(coupon_id = request.coupon_id))]
pub async fn checkout<P: PaymentProcessor>(
    db: &DatabaseConnection,
    processor: &P,
    settings: &Settings,
    user_id: &str,
    email: &str,
    request: PaymentRequest,
) -> Result<CheckoutOutcome> {
    validate_email(email)?;
    validate_request(&request)?;

    coupon::get_coupon_by_id(db, request.coupon_id)
        .await?
        .ok_or(Error::CouponNotFound {
            id: request.coupon_id,
        })?;
    user::get_user(db, user_id)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            id: user_id.to_string(),
        })?;

    let receipt = tokio::time::timeout(settings.payment.timeout(), processor.process(&request))
        .await
        .map_err(|_| {
            warn!("Payment for coupon {} timed out", request.coupon_id);
            Error::Timeout {
                operation: "payment".to_string(),
            }
        })??;

    let points = settings.rewards.points_per_purchase;
    let buyer = if points > 0 {
        user::credit_points(db, user_id, points).await?
    } else {
        user::get_user(db, user_id)
            .await?
            .ok_or_else(|| Error::UserNotFound {
                id: user_id.to_string(),
            })?
    };

    info!(
        "Checkout {} for {user_id}: {:.2} paid, {points} points",
        receipt.transaction_id, receipt.amount
    );
    Ok(CheckoutOutcome {
        receipt,
        points_awarded: points.max(0),
        total_points: buyer.loyalty_points,
    })
}
