//! Core announcement management for a cluster node
//!
//! This library provides:
//! - Announcer owning the announcements advertised to discovery
//! - Datasource codec, lookup and default policy
//! - Serialized datasource updates of the `presto` announcement
//! - Catalog registry and periodic broadcasting

pub mod accessor;
pub mod announcer;
pub mod broadcast;
pub mod catalog;
pub mod datasources;
pub mod error;
pub mod metrics;
pub mod policy;
pub mod updater;

pub use accessor::find_by_type;
pub use announcer::Announcer;
pub use broadcast::{AnnouncementSink, BroadcastConfig, Broadcaster};
pub use catalog::{CatalogRegistry, CatalogStore};
pub use datasources::DatasourceSet;
pub use error::{CoreError, Result};
pub use metrics::AnnouncementMetrics;
pub use policy::resolve_default_datasources;
pub use updater::{add_datasource, rebuild_datasources, validate_connector_id};
