//! General Discord commands - ping, help, and other utility commands.
//! This module contains simple commands that don't require database operations
//! and provide basic bot functionality and user assistance.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    ///
    /// This is a simple health check command that doesn't require any database operations.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**DealScout Help**\n\
        Here is a summary of all available commands for DealScout.\n\n\
        **Coupons**\n\
        • `/coupons [category]` - Lists current deals, nearest first once you share a location.\n\
        • `/coupon_info <coupon>` - Shows details, menu and reviews.\n\
        • `/save <coupon>` / `/saved` - Saves a coupon or lists your saved ones.\n\
        • `/reserve <coupon>` - Reserves one unit of a limited coupon.\n\
        • `/review <coupon> <rating> [comment]` / `/vote <coupon> <up|down>`\n\n\
        **Alerts**\n\
        • `/location <lat> <lng>` - Shares your position for smart alerts.\n\
        • `/inbox`, `/read [id]`, `/clear_inbox`, `/smart_alerts`\n\n\
        **Chat and trips**\n\
        • `/chat <vendor>`, `/send <message>`, `/chats`\n\
        • `/plan_trip <title> <days>`, `/trips`, `/activate_trip <id>`\n\n\
        **Account**\n\
        • `/profile`, `/role <role>`, `/language <code>`, `/checkout <coupon> <email>`\n\
        • `/campaign ...` and `/ab_test ...` for vendors.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
