pub mod service_announcement;
pub mod node_announcement;

pub use service_announcement::{ServiceAnnouncement, ServiceAnnouncementBuilder};
pub use node_announcement::NodeAnnouncement;
