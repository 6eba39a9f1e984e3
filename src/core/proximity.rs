//! Proximity watcher - Smart notifications from the user's location and the clock.
//!
//! The watcher compares the latest user location against saved coupons, the stops of
//! the user's active itinerary and seasonal events, and alerts on saved coupons that
//! are about to expire. Each triggering condition is remembered under a key (coupon id,
//! `event-<id>` or `<id>-exp`) and fires at most once for the watcher's lifetime.

use crate::{
    config::settings::ProximitySettings,
    core::{
        coupon,
        itinerary,
        notification::{
            NewNotification, NotificationCategory, NotificationKind, NotificationStore, Priority,
        },
    },
    entities::coupon as coupon_entity,
    errors::Result,
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A point on Earth in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude
    pub lat: f64,
    /// Longitude
    pub lng: f64,
}

/// Great-circle distance between two points, in meters.
#[must_use]
pub fn haversine_distance(a: Coordinates, b: Coordinates) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// A time-limited event (festival, fair) worth alerting about when nearby.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeasonalEvent {
    /// Stable identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// Latitude, if known
    pub latitude: Option<f64>,
    /// Longitude, if known
    pub longitude: Option<f64>,
}

impl SeasonalEvent {
    fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
            _ => None,
        }
    }
}

/// Everything one evaluation looks at.
#[derive(Debug, Clone, Copy)]
pub struct WatchInput<'a> {
    /// The user's saved coupons
    pub saved: &'a [coupon_entity::Model],
    /// Coupons on the user's active itinerary
    pub itinerary: &'a [coupon_entity::Model],
    /// Seasonal events
    pub events: &'a [SeasonalEvent],
}

/// Stateful evaluator. Keeps the set of already-notified keys for one session.
#[derive(Debug, Clone)]
pub struct ProximityWatcher {
    settings: ProximitySettings,
    notified: HashSet<String>,
}

impl ProximityWatcher {
    /// Create a watcher with no alerts delivered yet.
    #[must_use]
    pub fn new(settings: ProximitySettings) -> Self {
        Self {
            settings,
            notified: HashSet::new(),
        }
    }

    /// Whether the condition under `key` has already fired.
    #[must_use]
    pub fn has_notified(&self, key: &str) -> bool {
        self.notified.contains(key)
    }

    /// Number of conditions that have fired this session.
    #[must_use]
    pub fn notified_count(&self) -> usize {
        self.notified.len()
    }

    /// Returns the notifications that newly trigger at `location` and `now`.
    ///
    /// Expiry alerts are checked even without a location. Saved and itinerary coupons
    /// are merged by id, so a coupon present in both is evaluated once. Points without
    /// coordinates are skipped.
    pub fn evaluate(
        &mut self,
        location: Option<Coordinates>,
        now: DateTime<Utc>,
        input: WatchInput<'_>,
    ) -> Vec<NewNotification> {
        let mut fired = Vec::new();
        // Unrepresentable windows cover every future expiry.
        let window = self.settings.expiry_window();

        for saved in input.saved {
            let remaining = saved.expiry_date - now;
            if remaining > Duration::zero() && window.map_or(true, |window| remaining <= window) {
                let key = format!("{}-exp", saved.id);
                if self.notified.insert(key) {
                    fired.push(expiry_notification(saved, remaining));
                }
            }
        }

        let Some(location) = location else {
            return fired;
        };

        let points: BTreeMap<i64, &coupon_entity::Model> = input
            .saved
            .iter()
            .chain(input.itinerary)
            .map(|c| (c.id, c))
            .collect();

        for point in points.values() {
            let Some(distance) = coupon::distance_to(point, location) else {
                continue;
            };
            if distance < self.settings.coupon_radius_m {
                debug!("Coupon {} is {distance:.0} m away", point.id);
                if self.notified.insert(point.id.to_string()) {
                    fired.push(nearby_coupon_notification(point, distance));
                }
            }
        }

        for event in input.events {
            let Some(position) = event.coordinates() else {
                continue;
            };
            let distance = haversine_distance(location, position);
            if distance < self.settings.event_radius_m
                && self.notified.insert(format!("event-{}", event.id))
            {
                fired.push(nearby_event_notification(event, distance));
            }
        }

        fired
    }

    /// Loads the user's saved coupons and active itinerary, evaluates them at `location`
    /// and forwards new notifications to `notifications`.
    ///
    /// # Returns
    /// How many notifications the store accepted.
    #[instrument(skip(self, db, notifications, events))]
    pub async fn tick(
        &mut self,
        db: &DatabaseConnection,
        user_id: &str,
        location: Coordinates,
        notifications: &NotificationStore,
        events: &[SeasonalEvent],
    ) -> Result<usize> {
        let saved = coupon::get_saved_coupons(db, user_id).await?;
        let stops = itinerary::get_active_itinerary_coupons(db, user_id).await?;

        let fired = self.evaluate(
            Some(location),
            Utc::now(),
            WatchInput {
                saved: &saved,
                itinerary: &stops,
                events,
            },
        );

        let mut accepted = 0;
        for notification in fired {
            if notifications.add_notification(notification).await.is_some() {
                accepted += 1;
            }
        }
        if accepted > 0 {
            info!("Raised {accepted} smart notifications for {user_id}");
        }
        Ok(accepted)
    }
}

/// Runs `watcher` on every location published to `locations` until the sender is dropped.
///
/// # Returns
/// The watcher, with its notified set, once the feed closes.
pub async fn run_watcher(
    db: DatabaseConnection,
    user_id: String,
    mut watcher: ProximityWatcher,
    notifications: std::sync::Arc<NotificationStore>,
    events: std::sync::Arc<Vec<SeasonalEvent>>,
    mut locations: watch::Receiver<Option<Coordinates>>,
) -> ProximityWatcher {
    info!("Proximity watcher started for {user_id}");
    while locations.changed().await.is_ok() {
        let latest = *locations.borrow_and_update();
        let Some(location) = latest else {
            continue;
        };
        if let Err(e) = watcher
            .tick(&db, &user_id, location, &notifications, &events)
            .await
        {
            warn!("Proximity tick failed for {user_id}: {e}");
        }
    }
    info!("Location feed closed, proximity watcher for {user_id} stopped");
    watcher
}

fn nearby_coupon_notification(coupon: &coupon_entity::Model, distance: f64) -> NewNotification {
    NewNotification::new(
        format!("{} nearby!", coupon.store_name),
        format!(
            "{} is {} away: {}",
            coupon.title,
            crate::core::format::format_distance(distance),
            coupon.discount
        ),
    )
    .kind(NotificationKind::Promo)
    .priority(Priority::High)
    .category(NotificationCategory::Smart)
    .link(format!("/coupon/{}", coupon.id))
}

fn nearby_event_notification(event: &SeasonalEvent, distance: f64) -> NewNotification {
    NewNotification::new(
        format!("{} is happening nearby", event.name),
        format!(
            "{} away. {}",
            crate::core::format::format_distance(distance),
            event.description
        )
        .trim()
        .to_string(),
    )
    .kind(NotificationKind::Info)
    .priority(Priority::Medium)
    .category(NotificationCategory::Smart)
}

fn expiry_notification(coupon: &coupon_entity::Model, remaining: Duration) -> NewNotification {
    NewNotification::new(
        "Coupon expiring soon",
        format!(
            "{} at {} expires in {}h",
            coupon.title,
            coupon.store_name,
            remaining.num_hours().max(1)
        ),
    )
    .kind(NotificationKind::Reminder)
    .priority(Priority::High)
    .category(NotificationCategory::Smart)
    .link(format!("/coupon/{}", coupon.id))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::notification::ToastBus;
    use crate::test_utils::*;
    use std::sync::Arc;

    const SAO_PAULO: Coordinates = Coordinates {
        lat: -23.5505,
        lng: -46.6333,
    };

    /// A point roughly `meters` north of `origin`.
    fn north_of(origin: Coordinates, meters: f64) -> Coordinates {
        Coordinates {
            lat: origin.lat + (meters / EARTH_RADIUS_M).to_degrees(),
            lng: origin.lng,
        }
    }

    fn event_at(id: &str, at: Coordinates) -> SeasonalEvent {
        SeasonalEvent {
            id: id.to_string(),
            name: format!("Event {id}"),
            description: String::new(),
            latitude: Some(at.lat),
            longitude: Some(at.lng),
        }
    }

    #[test]
    fn test_haversine_known_distances() {
        assert!(haversine_distance(SAO_PAULO, SAO_PAULO).abs() < 1e-6);

        let hundred = haversine_distance(SAO_PAULO, north_of(SAO_PAULO, 100.0));
        assert!((hundred - 100.0).abs() < 0.5, "got {hundred}");

        // Paris to London, about 343.5 km
        let paris = Coordinates {
            lat: 48.8566,
            lng: 2.3522,
        };
        let london = Coordinates {
            lat: 51.5074,
            lng: -0.1278,
        };
        let d = haversine_distance(paris, london);
        assert!((d - 343_500.0).abs() < 1_500.0, "got {d}");
    }

    #[tokio::test]
    async fn test_repeated_ticks_notify_once() -> Result<()> {
        let db = setup_test_db().await?;
        let saved = create_located_coupon(&db, "Coffee", SAO_PAULO.lat, SAO_PAULO.lng).await?;
        let user_at = north_of(SAO_PAULO, 100.0);

        let mut watcher = ProximityWatcher::new(ProximitySettings::default());
        let mut total = Vec::new();
        for _ in 0..5 {
            total.extend(watcher.evaluate(
                Some(user_at),
                Utc::now(),
                WatchInput {
                    saved: std::slice::from_ref(&saved),
                    itinerary: &[],
                    events: &[],
                },
            ));
        }

        assert_eq!(total.len(), 1);
        assert!(total[0].is_smart());
        assert!(watcher.has_notified(&saved.id.to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_outside_radius_does_not_notify() -> Result<()> {
        let db = setup_test_db().await?;
        let saved = create_located_coupon(&db, "Far", SAO_PAULO.lat, SAO_PAULO.lng).await?;

        let mut watcher = ProximityWatcher::new(ProximitySettings::default());
        let fired = watcher.evaluate(
            Some(north_of(SAO_PAULO, 600.0)),
            Utc::now(),
            WatchInput {
                saved: &[saved],
                itinerary: &[],
                events: &[],
            },
        );
        assert!(fired.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_saved_and_itinerary_duplicates_are_merged() -> Result<()> {
        let db = setup_test_db().await?;
        let both = create_located_coupon(&db, "Both", SAO_PAULO.lat, SAO_PAULO.lng).await?;
        let unlocated = create_test_coupon(&db, "No coordinates").await?;

        let mut watcher = ProximityWatcher::new(ProximitySettings::default());
        let fired = watcher.evaluate(
            Some(SAO_PAULO),
            Utc::now(),
            WatchInput {
                saved: std::slice::from_ref(&both),
                itinerary: &[both.clone(), unlocated],
                events: &[],
            },
        );
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].link.as_deref(), Some(format!("/coupon/{}", both.id).as_str()));
        Ok(())
    }

    #[test]
    fn test_events_use_wider_radius() {
        let mut watcher = ProximityWatcher::new(ProximitySettings::default());
        let events = [
            event_at("fair", north_of(SAO_PAULO, 800.0)),
            event_at("far", north_of(SAO_PAULO, 1_500.0)),
            SeasonalEvent {
                id: "nowhere".to_string(),
                name: "Nowhere".to_string(),
                description: String::new(),
                latitude: None,
                longitude: None,
            },
        ];
        let input = WatchInput {
            saved: &[],
            itinerary: &[],
            events: &events,
        };

        let fired = watcher.evaluate(Some(SAO_PAULO), Utc::now(), input);
        assert_eq!(fired.len(), 1);
        assert!(watcher.has_notified("event-fair"));
        assert!(!watcher.has_notified("event-far"));

        let again = watcher.evaluate(Some(SAO_PAULO), Utc::now(), input);
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn test_expiry_alert_without_location() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();

        let mut soon = new_test_coupon("Soon");
        soon.expiry_date = now + Duration::hours(5);
        let soon = crate::core::coupon::add_coupon(&db, soon).await?;

        let mut later = new_test_coupon("Later");
        later.expiry_date = now + Duration::hours(48);
        let later = crate::core::coupon::add_coupon(&db, later).await?;

        let mut past = new_test_coupon("Past");
        past.expiry_date = now - Duration::hours(1);
        let past = crate::core::coupon::add_coupon(&db, past).await?;

        let saved = [soon.clone(), later, past];
        let mut watcher = ProximityWatcher::new(ProximitySettings::default());
        let input = WatchInput {
            saved: &saved,
            itinerary: &[],
            events: &[],
        };

        let fired = watcher.evaluate(None, now, input);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].kind, NotificationKind::Reminder);
        assert!(watcher.has_notified(&format!("{}-exp", soon.id)));

        assert!(watcher.evaluate(None, now, input).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_huge_expiry_window_does_not_panic() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();

        let mut distant = new_test_coupon("Distant");
        distant.expiry_date = now + Duration::days(3_650);
        let distant = crate::core::coupon::add_coupon(&db, distant).await?;

        let saved = [distant.clone()];
        let mut watcher = ProximityWatcher::new(ProximitySettings {
            expiry_window_hours: i64::MAX,
            ..ProximitySettings::default()
        });
        let input = WatchInput {
            saved: &saved,
            itinerary: &[],
            events: &[],
        };

        let fired = watcher.evaluate(None, now, input);
        assert_eq!(fired.len(), 1);
        assert!(watcher.has_notified(&format!("{}-exp", distant.id)));
        Ok(())
    }

    #[tokio::test]
    async fn test_tick_forwards_to_store_and_respects_gate() -> Result<()> {
        let db = setup_test_db().await?;
        let coupon = create_located_coupon(&db, "Pastel", SAO_PAULO.lat, SAO_PAULO.lng).await?;
        crate::core::coupon::toggle_save(&db, "alice", coupon.id).await?;

        let store = NotificationStore::new(false, ToastBus::new());
        let mut watcher = ProximityWatcher::new(ProximitySettings::default());

        let accepted = watcher
            .tick(&db, "alice", SAO_PAULO, &store, &[])
            .await?;
        assert_eq!(accepted, 0);
        assert!(store.is_empty().await);
        // The condition still counts as handled for this session
        assert_eq!(watcher.notified_count(), 1);

        let store = NotificationStore::new(true, ToastBus::new());
        let mut watcher = ProximityWatcher::new(ProximitySettings::default());
        for _ in 0..3 {
            watcher.tick(&db, "alice", SAO_PAULO, &store, &[]).await?;
        }
        assert_eq!(store.len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_run_watcher_stops_when_feed_closes() -> Result<()> {
        let db = setup_test_db().await?;
        let coupon = create_located_coupon(&db, "Açaí", SAO_PAULO.lat, SAO_PAULO.lng).await?;
        crate::core::coupon::toggle_save(&db, "bob", coupon.id).await?;

        let store = Arc::new(NotificationStore::new(true, ToastBus::new()));
        let (tx, rx) = watch::channel(None);
        let handle = tokio::spawn(run_watcher(
            db.clone(),
            "bob".to_string(),
            ProximityWatcher::new(ProximitySettings::default()),
            Arc::clone(&store),
            Arc::new(Vec::new()),
            rx,
        ));

        tx.send(Some(north_of(SAO_PAULO, 50.0))).unwrap();
        tokio::task::yield_now().await;
        tx.send(Some(north_of(SAO_PAULO, 60.0))).unwrap();
        drop(tx);

        let watcher = handle.await.unwrap();
        assert!(watcher.has_notified(&coupon.id.to_string()));
        assert_eq!(store.len().await, 1);
        Ok(())
    }
}
