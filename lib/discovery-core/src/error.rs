use discovery_api::ServiceAnnouncement;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{announcement_type} announcement not found: {announcements:?}")]
    AnnouncementNotFound {
        announcement_type: String,
        announcements: Vec<ServiceAnnouncement>,
    },

    #[error("Announcement of type {0} already exists")]
    DuplicateAnnouncement(String),

    #[error("Invalid datasource id: {0:?}")]
    InvalidDatasource(String),

    #[error("Catalog already exists: {0}")]
    CatalogAlreadyExists(String),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl CoreError {
    /// Whether this error means the managed announcement was missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::AnnouncementNotFound { .. })
    }
}
