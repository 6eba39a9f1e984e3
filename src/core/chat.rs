//! Chat store - Simulated two-party messaging.
//!
//! Sending a message schedules an automated reply from the other participant after a
//! fixed delay. Pending replies live in a [`JoinSet`] owned by the store, so
//! [`ChatStore::shutdown`] or dropping the store cancels them, and a reply task only
//! ever holds a weak reference to the thread state.

use crate::{
    config::settings::ChatSettings,
    core::notification::{NotificationKind, Toast, ToastBus},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};
use tokio::task::JoinSet;
use tracing::{debug, info};

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// The local user
    Me,
    /// The other participant
    Participant,
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Sequential id within the thread
    pub id: u64,
    /// Who wrote the message
    pub sender: Sender,
    /// Message body
    pub text: String,
    /// When the message was posted
    pub sent_at: DateTime<Utc>,
}

/// A conversation with one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatThread {
    /// Thread id
    pub id: u64,
    /// The other party (store, agency, support)
    pub participant_id: String,
    /// Display name of the other party
    pub participant_name: String,
    /// Messages, oldest first
    pub messages: Vec<Message>,
    /// Text of the newest message
    pub last_message: Option<String>,
    /// Time of the newest activity
    pub last_updated: DateTime<Utc>,
    /// Replies not yet seen
    pub unread_count: u32,
}

#[derive(Debug, Default)]
struct ChatState {
    threads: Vec<ChatThread>,
    next_thread_id: u64,
    next_message_id: u64,
    active: Option<u64>,
}

impl ChatState {
    fn thread_mut(&mut self, id: u64) -> Option<&mut ChatThread> {
        self.threads.iter_mut().find(|t| t.id == id)
    }

    fn append(&mut self, thread_id: u64, sender: Sender, text: String) -> Option<Message> {
        self.next_message_id += 1;
        let message = Message {
            id: self.next_message_id,
            sender,
            text,
            sent_at: Utc::now(),
        };
        let thread = self.thread_mut(thread_id)?;
        thread.last_message = Some(message.text.clone());
        thread.last_updated = message.sent_at;
        thread.messages.push(message.clone());
        if sender == Sender::Participant {
            thread.unread_count += 1;
        }
        Some(message)
    }
}

fn lock(state: &Mutex<ChatState>) -> MutexGuard<'_, ChatState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory chat threads with simulated replies.
#[derive(Debug)]
pub struct ChatStore {
    state: Arc<Mutex<ChatState>>,
    replies: Mutex<JoinSet<()>>,
    toasts: ToastBus,
    reply_delay: Duration,
    auto_reply: String,
}

impl ChatStore {
    /// Create an empty store whose auto-replies are posted on `toasts`.
    #[must_use]
    pub fn new(settings: &ChatSettings, toasts: ToastBus) -> Self {
        Self {
            state: Arc::new(Mutex::new(ChatState::default())),
            replies: Mutex::new(JoinSet::new()),
            toasts,
            reply_delay: settings.reply_delay(),
            auto_reply: settings.auto_reply.clone(),
        }
    }

    /// Opens the conversation with `participant_id`, creating it if needed, and makes it
    /// the active thread.
    ///
    /// # Returns
    /// The thread id; the same id for every call with the same participant.
    pub fn start_chat(&self, participant_id: &str, participant_name: &str) -> u64 {
        let mut state = lock(&self.state);
        if let Some(existing) = state
            .threads
            .iter()
            .find(|t| t.participant_id == participant_id)
            .map(|t| t.id)
        {
            state.active = Some(existing);
            return existing;
        }

        state.next_thread_id += 1;
        let id = state.next_thread_id;
        state.threads.insert(
            0,
            ChatThread {
                id,
                participant_id: participant_id.to_string(),
                participant_name: participant_name.to_string(),
                messages: Vec::new(),
                last_message: None,
                last_updated: Utc::now(),
                unread_count: 0,
            },
        );
        state.active = Some(id);
        info!("Started chat {id} with {participant_name}");
        id
    }

    /// Appends a message from the local user and schedules the automated reply.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// * [`Error::InvalidInput`] - empty message
    /// * [`Error::ThreadNotFound`] - unknown thread
    pub fn send_message(&self, thread_id: u64, text: &str) -> Result<Message> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::invalid("Message cannot be empty"));
        }

        let (message, participant_name) = {
            let mut state = lock(&self.state);
            let message = state
                .append(thread_id, Sender::Me, text.to_string())
                .ok_or(Error::ThreadNotFound { id: thread_id })?;
            let name = state
                .thread_mut(thread_id)
                .map(|t| t.participant_name.clone())
                .unwrap_or_default();
            (message, name)
        };

        let state = Arc::downgrade(&self.state);
        let toasts = self.toasts.clone();
        let reply = self.auto_reply.clone();
        let delay = self.reply_delay;

        let mut replies = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while replies.try_join_next().is_some() {}
        replies.spawn(deliver_reply(
            state,
            toasts,
            thread_id,
            participant_name,
            reply,
            delay,
        ));

        Ok(message)
    }

    /// Zeroes the unread counter of a thread.
    pub fn mark_as_read(&self, thread_id: u64) -> Result<()> {
        let mut state = lock(&self.state);
        let thread = state
            .thread_mut(thread_id)
            .ok_or(Error::ThreadNotFound { id: thread_id })?;
        thread.unread_count = 0;
        Ok(())
    }

    /// Snapshot of one thread.
    #[must_use]
    pub fn thread(&self, thread_id: u64) -> Option<ChatThread> {
        lock(&self.state)
            .threads
            .iter()
            .find(|t| t.id == thread_id)
            .cloned()
    }

    /// Snapshot of all threads, most recently started first.
    #[must_use]
    pub fn threads(&self) -> Vec<ChatThread> {
        lock(&self.state).threads.clone()
    }

    /// Thread currently open, if any.
    #[must_use]
    pub fn active_thread(&self) -> Option<u64> {
        lock(&self.state).active
    }

    /// Total unread replies across threads.
    #[must_use]
    pub fn total_unread(&self) -> u32 {
        lock(&self.state).threads.iter().map(|t| t.unread_count).sum()
    }

    /// Replies scheduled but not yet delivered.
    #[must_use]
    pub fn pending_replies(&self) -> usize {
        let mut replies = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while replies.try_join_next().is_some() {}
        replies.len()
    }

    /// Cancels every pending reply.
    pub fn shutdown(&self) {
        let mut replies = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        debug!("Cancelling {} pending chat replies", replies.len());
        replies.abort_all();
    }
}

async fn deliver_reply(
    state: Weak<Mutex<ChatState>>,
    toasts: ToastBus,
    thread_id: u64,
    participant_name: String,
    reply: String,
    delay: Duration,
) {
    tokio::time::sleep(delay).await;

    let Some(state) = state.upgrade() else {
        return;
    };
    let delivered = lock(&state).append(thread_id, Sender::Participant, reply.clone());
    if delivered.is_some() {
        toasts.raise(Toast {
            title: format!("New message from {participant_name}"),
            message: reply,
            kind: NotificationKind::Info,
        });
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn settings() -> ChatSettings {
        ChatSettings {
            reply_delay_ms: 1_000,
            auto_reply: "Auto reply".to_string(),
        }
    }

    #[test]
    fn test_start_chat_is_idempotent() {
        let store = ChatStore::new(&settings(), ToastBus::new());

        let first = store.start_chat("store-1", "Padaria");
        let other = store.start_chat("store-2", "Livraria");
        let again = store.start_chat("store-1", "Padaria");

        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(store.threads().len(), 2);
        assert_eq!(store.active_thread(), Some(first));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_message_then_auto_reply() {
        let toasts = ToastBus::new();
        let mut received = toasts.subscribe();
        let store = ChatStore::new(&settings(), toasts);
        let thread_id = store.start_chat("store-1", "Padaria");

        let sent = store.send_message(thread_id, "  Is the deal still on?  ").unwrap();
        assert_eq!(sent.text, "Is the deal still on?");
        assert_eq!(sent.sender, Sender::Me);

        let thread = store.thread(thread_id).unwrap();
        assert_eq!(thread.messages.len(), 1);
        assert_eq!(thread.last_message.as_deref(), Some("Is the deal still on?"));
        assert_eq!(thread.unread_count, 0);
        assert_eq!(store.pending_replies(), 1);

        tokio::time::sleep(Duration::from_millis(1_001)).await;

        let thread = store.thread(thread_id).unwrap();
        assert_eq!(thread.messages.len(), 2);
        assert_eq!(thread.messages[1].sender, Sender::Participant);
        assert_eq!(thread.last_message.as_deref(), Some("Auto reply"));
        assert_eq!(thread.unread_count, 1);
        assert_eq!(store.pending_replies(), 0);

        let toast = received.try_recv().unwrap();
        assert_eq!(toast.title, "New message from Padaria");

        store.mark_as_read(thread_id).unwrap();
        assert_eq!(store.total_unread(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_replies() {
        let store = ChatStore::new(&settings(), ToastBus::new());
        let thread_id = store.start_chat("agency", "Agência");
        store.send_message(thread_id, "hello").unwrap();

        store.shutdown();
        tokio::time::sleep(Duration::from_millis(2_000)).await;

        let thread = store.thread(thread_id).unwrap();
        assert_eq!(thread.messages.len(), 1);
        assert_eq!(thread.unread_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_store_never_replies() {
        let toasts = ToastBus::new();
        let mut received = toasts.subscribe();
        let store = ChatStore::new(&settings(), toasts);
        let thread_id = store.start_chat("agency", "Agência");
        store.send_message(thread_id, "hello").unwrap();

        drop(store);
        tokio::time::sleep(Duration::from_millis(2_000)).await;
        assert!(received.try_recv().is_err());
    }

    #[test]
    fn test_send_errors() {
        let store = ChatStore::new(&settings(), ToastBus::new());
        let thread_id = store.start_chat("x", "X");

        assert!(matches!(
            store.send_message(thread_id, "   "),
            Err(Error::InvalidInput { .. })
        ));
        assert!(matches!(
            store.send_message(99, "hi"),
            Err(Error::ThreadNotFound { id: 99 })
        ));
        assert!(matches!(
            store.mark_as_read(99),
            Err(Error::ThreadNotFound { id: 99 })
        ));
    }
}
