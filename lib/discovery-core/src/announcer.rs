//! Owner of the announcements this node advertises to discovery

use crate::accessor::find_by_type;
use crate::{AnnouncementMetrics, CoreError, Result};
use discovery_api::ServiceAnnouncement;
use std::collections::BTreeMap;
use tokio::sync::{watch, Notify, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Announcer holds the set of service announcements advertised by this node.
///
/// Announcements are keyed by type, so the collection can never hold two
/// announcements of the same type and replacing one is a single map write.
/// Every read-modify-write goes through [`Announcer::replace_properties`],
/// which holds the write lock for the whole cycle.
pub struct Announcer {
    // Map of announcement type to the current announcement
    announcements: RwLock<BTreeMap<String, ServiceAnnouncement>>,
    force: Notify,
    shutdown: watch::Sender<bool>,
    metrics: Option<AnnouncementMetrics>,
}

impl Announcer {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            announcements: RwLock::new(BTreeMap::new()),
            force: Notify::new(),
            shutdown,
            metrics: None,
        }
    }

    /// Create an announcer that records update metrics
    pub fn with_metrics(metrics: AnnouncementMetrics) -> Self {
        Self {
            metrics: Some(metrics),
            ..Self::new()
        }
    }

    pub fn metrics(&self) -> Option<&AnnouncementMetrics> {
        self.metrics.as_ref()
    }

    /// Snapshot of every announcement currently advertised
    pub async fn service_announcements(&self) -> Vec<ServiceAnnouncement> {
        let announcements = self.announcements.read().await;
        announcements.values().cloned().collect()
    }

    /// Start advertising an announcement.
    ///
    /// Fails if an announcement of the same type is already present.
    pub async fn add_service_announcement(&self, announcement: ServiceAnnouncement) -> Result<()> {
        let mut announcements = self.announcements.write().await;
        let announcement_type = announcement.announcement_type().to_string();
        if announcements.contains_key(&announcement_type) {
            return Err(CoreError::DuplicateAnnouncement(announcement_type));
        }

        debug!("Added {} announcement {}", announcement_type, announcement.id());
        announcements.insert(announcement_type, announcement);
        Ok(())
    }

    /// Stop advertising the announcement with the given id
    pub async fn remove_service_announcement(&self, id: Uuid) -> bool {
        let mut announcements = self.announcements.write().await;
        let before = announcements.len();
        announcements.retain(|_, announcement| announcement.id() != id);

        let removed = announcements.len() != before;
        if removed {
            debug!("Removed announcement {}", id);
        }
        removed
    }

    /// Replace the announcement of `announcement_type` with one built from
    /// the properties returned by `update`.
    ///
    /// The new announcement keeps the type and gets a fresh id. If no
    /// announcement of the type exists the collection is left untouched.
    pub async fn replace_properties<F>(
        &self,
        announcement_type: &str,
        update: F,
    ) -> Result<ServiceAnnouncement>
    where
        F: FnOnce(&ServiceAnnouncement) -> BTreeMap<String, String>,
    {
        let mut announcements = self.announcements.write().await;
        let current = find_by_type(announcements.values(), announcement_type)?;

        let replacement = ServiceAnnouncement::builder(current.announcement_type())
            .add_properties(update(&current))
            .build();

        debug!(
            "Replacing {} announcement {} with {}",
            announcement_type,
            current.id(),
            replacement.id()
        );
        announcements.insert(announcement_type.to_string(), replacement.clone());
        Ok(replacement)
    }

    /// Request an immediate broadcast without waiting for the next periodic cycle
    pub fn force_announce(&self) {
        self.force.notify_one();
    }

    /// Wait until a broadcast is forced. A request made while nobody was
    /// waiting is delivered to the next caller.
    pub async fn forced(&self) {
        self.force.notified().await;
    }

    /// Watch for announcer shutdown
    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    pub fn is_destroyed(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Withdraw every announcement and stop broadcasting
    pub async fn destroy(&self) {
        let mut announcements = self.announcements.write().await;
        announcements.clear();
        self.shutdown.send_replace(true);
        info!("Announcer destroyed, no further announcements will be made");
    }

    /// Get count of advertised announcements
    pub async fn announcement_count(&self) -> usize {
        let announcements = self.announcements.read().await;
        announcements.len()
    }
}

impl Default for Announcer {
    fn default() -> Self {
        Self::new()
    }
}
