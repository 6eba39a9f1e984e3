//! Inbox Discord commands - notifications, smart alerts and location sharing.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::session},
        core::{
            notification::{Notification, NotificationKind},
            proximity::Coordinates,
        },
        errors::{Error, Result},
    };
    use std::fmt::Write;

    const fn kind_icon(kind: NotificationKind) -> &'static str {
        match kind {
            NotificationKind::Info => "ℹ️",
            NotificationKind::Success => "✅",
            NotificationKind::Warning => "⚠️",
            NotificationKind::Promo => "🏷️",
            NotificationKind::Reminder => "⏰",
        }
    }

    fn render(notification: &Notification) -> String {
        let marker = if notification.read { "" } else { "🔵 " };
        format!(
            "{marker}{} `{}` **{}** - {}",
            kind_icon(notification.kind),
            notification.id,
            notification.title,
            notification.message
        )
    }

    /// Shows your notifications, newest first.
    #[poise::command(slash_command, prefix_command)]
    pub async fn inbox(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let session = session(ctx).await;
        let notifications = session.notifications().list().await;
        if notifications.is_empty() {
            let text = session.language().read().await.t("inbox.empty").to_string();
            ctx.say(format!("📭 {text}")).await?;
            return Ok(());
        }

        let unread = session.notifications().unread_count().await;
        let mut reply = format!("**📬 Inbox** ({unread} unread)\n");
        for notification in notifications.iter().take(15) {
            writeln!(&mut reply, "{}", render(notification))?;
        }
        ctx.say(reply).await?;
        Ok(())
    }

    /// Marks one notification, or all of them, as read.
    #[poise::command(slash_command, prefix_command)]
    pub async fn read(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Notification id (all if empty)"] id: Option<u64>,
    ) -> Result<()> {
        let session = session(ctx).await;
        match id {
            Some(id) => {
                if session.notifications().mark_as_read(id).await {
                    ctx.say(format!("✅ Notification {id} marked as read.")).await?;
                } else {
                    ctx.say(format!("❓ No notification with id {id}.")).await?;
                }
            }
            None => {
                session.notifications().mark_all_as_read().await;
                ctx.say("✅ All notifications marked as read.").await?;
            }
        }
        Ok(())
    }

    /// Deletes every notification.
    #[poise::command(slash_command, prefix_command)]
    pub async fn clear_inbox(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        session(ctx).await.notifications().clear_all().await;
        ctx.say("🗑️ Inbox cleared.").await?;
        Ok(())
    }

    /// Turns smart proximity and expiry alerts on or off.
    #[poise::command(slash_command, prefix_command)]
    pub async fn smart_alerts(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let enabled = session(ctx).await.notifications().toggle_smart_alerts().await;
        let state = if enabled { "on" } else { "off" };
        ctx.say(format!("🧠 Smart alerts are now **{state}**.")).await?;
        Ok(())
    }

    /// Shares your position so nearby deals and events can alert you.
    #[poise::command(slash_command, prefix_command)]
    pub async fn location(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Latitude in decimal degrees"] latitude: f64,
        #[description = "Longitude in decimal degrees"] longitude: f64,
    ) -> Result<()> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::invalid("Coordinates out of range"));
        }

        session(ctx).await.update_location(Coordinates {
            lat: latitude,
            lng: longitude,
        });
        ctx.say("📍 Location updated. Nearby deals will show up in `/inbox`.")
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
