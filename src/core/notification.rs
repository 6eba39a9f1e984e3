//! Notification store - The user's in-memory inbox.
//!
//! Every producer (proximity watcher, coupon actions, chat) goes through
//! [`NotificationStore::add_notification`]. Accepted notifications are prepended to the
//! inbox and also raised as transient toasts on a [`ToastBus`]. While smart alerts are
//! switched off, notifications in the [`NotificationCategory::Smart`] category are
//! dropped at creation and never stored.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info};

const TOAST_CAPACITY: usize = 64;

/// Visual flavour of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Neutral information
    Info,
    /// An action completed
    Success,
    /// Something needs attention
    Warning,
    /// A deal or offer
    Promo,
    /// A time-based reminder
    Reminder,
}

/// How urgently a notification should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Can wait
    Low,
    /// Normal
    Medium,
    /// Show prominently
    High,
}

/// Producer category, used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    /// Inferred from location or timing; subject to the smart-alerts toggle
    Smart,
    /// Coupon actions (reservations, reviews)
    Coupon,
    /// Chat messages
    Chat,
    /// Loyalty rewards
    Reward,
    /// Everything else
    System,
}

/// A stored notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    /// Unique within the store
    pub id: u64,
    /// Headline
    pub title: String,
    /// Body text
    pub message: String,
    /// Visual flavour
    pub kind: NotificationKind,
    /// Whether the user has seen it
    pub read: bool,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Optional urgency
    pub priority: Option<Priority>,
    /// Optional producer category
    pub category: Option<NotificationCategory>,
    /// Optional deep link
    pub link: Option<String>,
}

/// A notification as submitted by a producer; the store fills in id, time and read state.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    /// Headline
    pub title: String,
    /// Body text
    pub message: String,
    /// Visual flavour
    pub kind: NotificationKind,
    /// Optional urgency
    pub priority: Option<Priority>,
    /// Optional producer category
    pub category: Option<NotificationCategory>,
    /// Optional deep link
    pub link: Option<String>,
}

impl NewNotification {
    /// An informational notification with no category.
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind: NotificationKind::Info,
            priority: None,
            category: None,
            link: None,
        }
    }

    /// Set the notification kind.
    #[must_use]
    pub const fn kind(mut self, kind: NotificationKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the priority.
    #[must_use]
    pub const fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the preference category used for filtering.
    #[must_use]
    pub const fn category(mut self, category: NotificationCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Attach a deep link.
    #[must_use]
    pub fn link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Whether this notification is subject to the smart-alerts toggle.
    #[must_use]
    pub fn is_smart(&self) -> bool {
        self.category == Some(NotificationCategory::Smart)
    }
}

/// A transient alert shown once and not stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Headline
    pub title: String,
    /// Body text
    pub message: String,
    /// Visual flavour
    pub kind: NotificationKind,
}

/// Broadcast channel for toasts. Toasts raised with no subscriber are discarded.
#[derive(Debug, Clone)]
pub struct ToastBus {
    sender: broadcast::Sender<Toast>,
}

impl ToastBus {
    /// Creates a bus with a bounded backlog per subscriber.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(TOAST_CAPACITY);
        Self { sender }
    }

    /// Subscribes to toasts raised from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.sender.subscribe()
    }

    /// Raises a toast.
    pub fn raise(&self, toast: Toast) {
        // Err only means nobody is listening.
        let _ = self.sender.send(toast);
    }
}

impl Default for ToastBus {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct Inbox {
    items: Vec<Notification>,
    next_id: u64,
    smart_alerts: bool,
}

/// The in-memory inbox.
#[derive(Debug)]
pub struct NotificationStore {
    inbox: RwLock<Inbox>,
    toasts: ToastBus,
}

impl NotificationStore {
    /// Creates an empty inbox.
    #[must_use]
    pub fn new(smart_alerts: bool, toasts: ToastBus) -> Self {
        Self {
            inbox: RwLock::new(Inbox {
                items: Vec::new(),
                next_id: 1,
                smart_alerts,
            }),
            toasts,
        }
    }

    /// The bus this store raises toasts on.
    #[must_use]
    pub const fn toasts(&self) -> &ToastBus {
        &self.toasts
    }

    /// Stores a notification and raises it as a toast.
    ///
    /// # Returns
    /// The stored notification, or `None` when it was a smart notification and smart
    /// alerts are off.
    pub async fn add_notification(&self, new: NewNotification) -> Option<Notification> {
        let mut inbox = self.inbox.write().await;
        if new.is_smart() && !inbox.smart_alerts {
            debug!("Smart alerts disabled, dropping '{}'", new.title);
            return None;
        }

        let notification = Notification {
            id: inbox.next_id,
            title: new.title,
            message: new.message,
            kind: new.kind,
            read: false,
            timestamp: Utc::now(),
            priority: new.priority,
            category: new.category,
            link: new.link,
        };
        inbox.next_id += 1;
        inbox.items.insert(0, notification.clone());
        drop(inbox);

        self.toasts.raise(Toast {
            title: notification.title.clone(),
            message: notification.message.clone(),
            kind: notification.kind,
        });
        Some(notification)
    }

    /// Marks one notification as read.
    ///
    /// # Returns
    /// `false` if no notification has this id.
    pub async fn mark_as_read(&self, id: u64) -> bool {
        let mut inbox = self.inbox.write().await;
        inbox
            .items
            .iter_mut()
            .find(|n| n.id == id)
            .map(|n| n.read = true)
            .is_some()
    }

    /// Marks every notification as read.
    pub async fn mark_all_as_read(&self) {
        let mut inbox = self.inbox.write().await;
        for notification in &mut inbox.items {
            notification.read = true;
        }
    }

    /// Removes every notification.
    pub async fn clear_all(&self) {
        let mut inbox = self.inbox.write().await;
        let cleared = inbox.items.len();
        inbox.items.clear();
        info!("Cleared {cleared} notifications");
    }

    /// Flips the smart-alerts gate. Already stored notifications are not affected.
    ///
    /// # Returns
    /// The new state.
    pub async fn toggle_smart_alerts(&self) -> bool {
        let mut inbox = self.inbox.write().await;
        inbox.smart_alerts = !inbox.smart_alerts;
        info!("Smart alerts {}", if inbox.smart_alerts { "on" } else { "off" });
        inbox.smart_alerts
    }

    /// Whether proximity and expiry alerts are delivered.
    pub async fn smart_alerts_enabled(&self) -> bool {
        self.inbox.read().await.smart_alerts
    }

    /// All notifications, newest first.
    pub async fn list(&self) -> Vec<Notification> {
        self.inbox.read().await.items.clone()
    }

    /// Number of stored notifications.
    pub async fn len(&self) -> usize {
        self.inbox.read().await.items.len()
    }

    /// Whether the inbox is empty.
    pub async fn is_empty(&self) -> bool {
        self.inbox.read().await.items.is_empty()
    }

    /// Number of notifications not yet read.
    pub async fn unread_count(&self) -> usize {
        self.inbox
            .read()
            .await
            .items
            .iter()
            .filter(|n| !n.read)
            .count()
    }
}
