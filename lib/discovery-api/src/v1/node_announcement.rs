use crate::ServiceAnnouncement;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// NodeAnnouncement is the payload broadcast to the discovery registry on
/// every announce cycle: all services currently advertised by this node
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAnnouncement {
    /// Unique id of the announcing node
    pub node_id: String,

    /// Deployment environment (e.g. "production")
    pub environment: String,

    /// Optional node location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Services advertised by the node
    #[serde(default)]
    pub services: Vec<ServiceAnnouncement>,

    /// Time this snapshot was taken
    pub announced_at: DateTime<Utc>,
}

impl NodeAnnouncement {
    /// Snapshot the given services into a node announcement stamped with the current time
    pub fn new(
        node_id: impl Into<String>,
        environment: impl Into<String>,
        location: Option<String>,
        services: Vec<ServiceAnnouncement>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            environment: environment.into(),
            location,
            services,
            announced_at: Utc::now(),
        }
    }
}
