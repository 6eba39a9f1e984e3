//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Profile, role, language and checkout commands
pub mod account;

/// Vendor chat commands
pub mod chat;

/// Coupon catalog, saving, reservation, review and campaign commands
pub mod coupon;

/// General utility commands
pub mod general;

/// Inbox, smart alert and location commands
pub mod inbox;

/// Itinerary planning commands
pub mod trip;

use crate::{
    bot::{BotData, Context},
    core::session::Session,
    errors::Error,
};
use std::sync::Arc;

// Export commands
pub use account::*;
pub use chat::*;
pub use coupon::*;
pub use general::*;
pub use inbox::*;
pub use trip::*;

/// Every command the bot registers.
#[must_use]
pub fn all() -> Vec<poise::Command<BotData, Error>> {
    vec![
        ping(),
        help(),
        coupons(),
        coupon_info(),
        save(),
        saved(),
        reserve(),
        review(),
        vote(),
        campaign(),
        ab_test(),
        inbox(),
        read(),
        clear_inbox(),
        smart_alerts(),
        location(),
        chat(),
        send(),
        chats(),
        plan_trip(),
        trips(),
        activate_trip(),
        profile(),
        role(),
        language(),
        checkout(),
    ]
}

/// The invoking user's Discord id.
pub(crate) fn user_id(ctx: Context<'_>) -> String {
    ctx.author().id.to_string()
}

/// The invoking user's session, started on first use.
pub(crate) async fn session(ctx: Context<'_>) -> Arc<Session> {
    ctx.data().sessions.session(&user_id(ctx)).await
}
