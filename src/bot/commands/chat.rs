//! Chat Discord commands - talking to vendors.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::session},
        core::chat::Sender,
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Opens a conversation with a vendor and shows its history.
    #[poise::command(slash_command, prefix_command)]
    pub async fn chat(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Vendor or store name"] vendor: String,
    ) -> Result<()> {
        let vendor = vendor.trim();
        if vendor.is_empty() {
            return Err(Error::invalid("Vendor name cannot be empty"));
        }

        let session = session(ctx).await;
        let store = session.chat();
        let thread_id = store.start_chat(&vendor.to_lowercase(), vendor);
        store.mark_as_read(thread_id)?;
        let thread = store
            .thread(thread_id)
            .ok_or(Error::ThreadNotFound { id: thread_id })?;

        let mut reply = format!("**💬 {}**\n", thread.participant_name);
        if thread.messages.is_empty() {
            reply.push_str("Say hello with `/send`.");
        }
        for message in thread.messages.iter().rev().take(10).rev() {
            let who = match message.sender {
                Sender::Me => "You",
                Sender::Participant => thread.participant_name.as_str(),
            };
            writeln!(&mut reply, "**{who}:** {}", message.text)?;
        }
        ctx.say(reply).await?;
        Ok(())
    }

    /// Sends a message in your active conversation.
    #[poise::command(slash_command, prefix_command)]
    pub async fn send(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Message"] message: String,
    ) -> Result<()> {
        let session = session(ctx).await;
        let thread_id = session
            .chat()
            .active_thread()
            .ok_or_else(|| Error::invalid("Open a conversation with `/chat` first"))?;
        session.chat().send_message(thread_id, &message)?;
        ctx.say("📨 Sent. The vendor will reply shortly.").await?;
        Ok(())
    }

    /// Lists your conversations.
    #[poise::command(slash_command, prefix_command)]
    pub async fn chats(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let session = session(ctx).await;
        let threads = session.chat().threads();
        if threads.is_empty() {
            ctx.say("💬 No conversations yet.").await?;
            return Ok(());
        }

        let mut reply = format!("**💬 Conversations** ({} unread)\n", session.chat().total_unread());
        for thread in &threads {
            writeln!(
                &mut reply,
                "• **{}** ({} unread): {}",
                thread.participant_name,
                thread.unread_count,
                thread.last_message.as_deref().unwrap_or("")
            )?;
        }
        ctx.say(reply).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
