//! Periodic and forced broadcast of the node's announcements

use crate::metrics::{TRIGGER_FORCED, TRIGGER_PERIODIC};
use crate::Announcer;
use async_trait::async_trait;
use discovery_api::NodeAnnouncement;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Destination of node announcements, e.g. the discovery registry
#[async_trait]
pub trait AnnouncementSink: Send + Sync {
    async fn announce(&self, announcement: &NodeAnnouncement) -> anyhow::Result<()>;
}

/// Broadcast configuration
#[derive(Clone, Debug)]
pub struct BroadcastConfig {
    pub node_id: String,
    pub environment: String,
    pub location: Option<String>,
    /// Delay between announcements
    pub interval: Duration,
    /// Delay before retrying after a failed announcement
    pub retry_delay: Duration,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            node_id: "node".to_string(),
            environment: "production".to_string(),
            location: None,
            interval: Duration::from_secs(8),
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// Broadcaster sends the announcer's current announcements to a sink on a
/// fixed schedule and whenever a broadcast is forced
pub struct Broadcaster<S> {
    announcer: Arc<Announcer>,
    sink: S,
    config: BroadcastConfig,
}

impl<S: AnnouncementSink> Broadcaster<S> {
    pub fn new(announcer: Arc<Announcer>, sink: S, config: BroadcastConfig) -> Self {
        Self {
            announcer,
            sink,
            config,
        }
    }

    /// Send one snapshot of the current announcements
    pub async fn announce_once(&self, trigger: &str) -> anyhow::Result<()> {
        let services = self.announcer.service_announcements().await;
        let announcement = NodeAnnouncement::new(
            self.config.node_id.clone(),
            self.config.environment.clone(),
            self.config.location.clone(),
            services,
        );

        if let Some(metrics) = self.announcer.metrics() {
            metrics.broadcasts_total.with_label_values(&[trigger]).inc();
        }

        let result = self.sink.announce(&announcement).await;
        if result.is_err() {
            if let Some(metrics) = self.announcer.metrics() {
                metrics.broadcast_failures_total.with_label_values(&[trigger]).inc();
            }
        }
        result
    }

    /// Announce until the announcer is destroyed
    pub async fn run(self) {
        let mut shutdown = self.announcer.subscribe_shutdown();
        info!(
            "Broadcasting announcements for node {} every {:?}",
            self.config.node_id, self.config.interval
        );

        let mut delay = Duration::ZERO;
        loop {
            if *shutdown.borrow() {
                break;
            }

            let trigger = tokio::select! {
                _ = tokio::time::sleep(delay) => TRIGGER_PERIODIC,
                _ = self.announcer.forced() => TRIGGER_FORCED,
                _ = shutdown.changed() => break,
            };

            delay = match self.announce_once(trigger).await {
                Ok(()) => {
                    debug!("Sent {} announcement", trigger);
                    self.config.interval
                }
                Err(e) => {
                    warn!("Failed to send {} announcement: {}", trigger, e);
                    self.config.retry_delay
                }
            };
        }

        info!("Broadcaster stopped");
    }
}
