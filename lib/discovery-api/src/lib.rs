//! Discovery API types for node announcements
//!
//! This library defines the values a node advertises to the discovery registry:
//! - ServiceAnnouncement: a typed bundle of properties describing one service
//! - NodeAnnouncement: the full set of services broadcast by a node

pub mod v1;

pub use v1::{NodeAnnouncement, ServiceAnnouncement, ServiceAnnouncementBuilder};

/// Announcement type managed by the datasource announcer
pub const PRESTO_ANNOUNCEMENT_TYPE: &str = "presto";

/// Property carrying the comma-delimited datasource list
pub const DATASOURCES_PROPERTY: &str = "datasources";
