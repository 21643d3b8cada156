//! Prometheus metrics for announcement updates and broadcasts

use crate::Result;
use prometheus::{CounterVec, Encoder, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Update operation label values
pub const OP_REBUILD: &str = "rebuild";
pub const OP_ADD: &str = "add";

/// Broadcast trigger label values
pub const TRIGGER_PERIODIC: &str = "periodic";
pub const TRIGGER_FORCED: &str = "forced";

/// Metrics shared by the announcer, the updater and the broadcaster
#[derive(Clone)]
pub struct AnnouncementMetrics {
    /// Successful announcement replacements by operation
    pub updates_total: CounterVec,
    /// Failed announcement updates by operation
    pub update_failures_total: CounterVec,
    /// Broadcast cycles by trigger
    pub broadcasts_total: CounterVec,
    /// Broadcast cycles that the sink rejected
    pub broadcast_failures_total: CounterVec,
    /// Number of datasources in the current announcement
    pub announced_datasources: IntGauge,
    /// Prometheus registry for metrics
    pub registry: Arc<Registry>,
}

impl AnnouncementMetrics {
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let updates_total = CounterVec::new(
            Opts::new("announcement_updates_total", "Announcement replacements"),
            &["operation"],
        )?;
        let update_failures_total = CounterVec::new(
            Opts::new(
                "announcement_update_failures_total",
                "Announcement updates that failed",
            ),
            &["operation"],
        )?;
        let broadcasts_total = CounterVec::new(
            Opts::new("announcement_broadcasts_total", "Announcement broadcast cycles"),
            &["trigger"],
        )?;
        let broadcast_failures_total = CounterVec::new(
            Opts::new(
                "announcement_broadcast_failures_total",
                "Announcement broadcast cycles that failed",
            ),
            &["trigger"],
        )?;
        let announced_datasources = IntGauge::new(
            "announced_datasources",
            "Datasources in the current announcement",
        )?;

        registry.register(Box::new(updates_total.clone()))?;
        registry.register(Box::new(update_failures_total.clone()))?;
        registry.register(Box::new(broadcasts_total.clone()))?;
        registry.register(Box::new(broadcast_failures_total.clone()))?;
        registry.register(Box::new(announced_datasources.clone()))?;

        Ok(Self {
            updates_total,
            update_failures_total,
            broadcasts_total,
            broadcast_failures_total,
            announced_datasources,
            registry,
        })
    }

    /// Gather all metrics in Prometheus text format
    pub fn gather(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = vec![];
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
