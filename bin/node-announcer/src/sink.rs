//! Announcement sink that records each broadcast in the log

use async_trait::async_trait;
use discovery_api::NodeAnnouncement;
use discovery_core::AnnouncementSink;
use tracing::info;

/// Writes every node announcement as a single-line JSON log record
pub struct LogSink;

#[async_trait]
impl AnnouncementSink for LogSink {
    async fn announce(&self, announcement: &NodeAnnouncement) -> anyhow::Result<()> {
        let json = serde_json::to_string(announcement)?;
        info!(target: "announcement", node_id = %announcement.node_id, "{}", json);
        Ok(())
    }
}
