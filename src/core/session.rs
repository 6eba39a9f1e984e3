//! Per-user sessions - The in-memory stores one user interacts with.
//!
//! A [`Session`] owns a user's inbox, chats, language choice and location feed. The
//! proximity watcher for the session runs as a background task fed by
//! [`Session::update_location`] and stops when the session is closed or dropped.

use crate::{
    config::Settings,
    core::{
        chat::ChatStore,
        i18n::{Catalog, LanguageStore},
        notification::{NotificationStore, ToastBus},
        proximity::{self, Coordinates, ProximityWatcher, SeasonalEvent},
    },
};
use sea_orm::DatabaseConnection;
use std::{collections::HashMap, sync::Arc};
use tokio::{
    sync::{RwLock, watch},
    task::JoinHandle,
};
use tracing::{info, warn};

/// Everything the application keeps in memory for one user.
#[derive(Debug)]
pub struct Session {
    user_id: String,
    notifications: Arc<NotificationStore>,
    chat: ChatStore,
    language: RwLock<LanguageStore>,
    location: watch::Sender<Option<Coordinates>>,
    watcher: JoinHandle<ProximityWatcher>,
}

impl Session {
    /// Creates the stores and starts the proximity watcher.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn start(
        db: DatabaseConnection,
        user_id: &str,
        settings: &Settings,
        catalog: Arc<Catalog>,
        events: Arc<Vec<SeasonalEvent>>,
    ) -> Self {
        let toasts = ToastBus::new();
        let notifications = Arc::new(NotificationStore::new(true, toasts.clone()));
        let (location, feed) = watch::channel(None);

        let watcher = tokio::spawn(proximity::run_watcher(
            db,
            user_id.to_string(),
            ProximityWatcher::new(settings.proximity.clone()),
            Arc::clone(&notifications),
            events,
            feed,
        ));

        Self {
            user_id: user_id.to_string(),
            notifications,
            chat: ChatStore::new(&settings.chat, toasts),
            language: RwLock::new(LanguageStore::new(catalog, settings.i18n.default_language)),
            location,
            watcher,
        }
    }

    /// Owner of this session.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The session's notification inbox.
    #[must_use]
    pub fn notifications(&self) -> &NotificationStore {
        &self.notifications
    }

    /// The session's chat threads.
    #[must_use]
    pub const fn chat(&self) -> &ChatStore {
        &self.chat
    }

    /// The session's language selection.
    #[must_use]
    pub const fn language(&self) -> &RwLock<LanguageStore> {
        &self.language
    }

    /// Publishes the user's latest position to the proximity watcher.
    pub fn update_location(&self, location: Coordinates) {
        self.location.send_replace(Some(location));
    }

    /// Last published position.
    #[must_use]
    pub fn last_location(&self) -> Option<Coordinates> {
        *self.location.borrow()
    }

    /// Stops the watcher and cancels pending chat replies.
    ///
    /// # Returns
    /// The watcher with everything it notified during the session, if it stopped cleanly.
    pub async fn close(self) -> Option<ProximityWatcher> {
        self.chat.shutdown();
        drop(self.location);
        match self.watcher.await {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!("Proximity watcher for {} ended abnormally: {e}", self.user_id);
                None
            }
        }
    }
}

/// All live sessions, keyed by user id.
#[derive(Debug)]
pub struct SessionRegistry {
    db: DatabaseConnection,
    settings: Arc<Settings>,
    catalog: Arc<Catalog>,
    events: Arc<Vec<SeasonalEvent>>,
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    /// Create an empty registry sharing the given database and reference data.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        settings: Arc<Settings>,
        catalog: Arc<Catalog>,
        events: Arc<Vec<SeasonalEvent>>,
    ) -> Self {
        Self {
            db,
            settings,
            catalog,
            events,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the user's session, starting one on first use.
    pub async fn session(&self, user_id: &str) -> Arc<Session> {
        if let Some(existing) = self.sessions.read().await.get(user_id) {
            return Arc::clone(existing);
        }

        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(user_id.to_string()).or_insert_with(|| {
            info!("Starting session for {user_id}");
            Arc::new(Session::start(
                self.db.clone(),
                user_id,
                &self.settings,
                Arc::clone(&self.catalog),
                Arc::clone(&self.events),
            ))
        });
        Arc::clone(session)
    }

    /// Ends the user's session. The watcher stops once the last handle is released.
    pub async fn end(&self, user_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(user_id);
        if removed.is_some() {
            info!("Ended session for {user_id}");
        }
        removed.is_some()
    }

    /// Number of open sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no session is open.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
