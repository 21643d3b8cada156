//! Lookup of a single announcement by type within a snapshot

use crate::{CoreError, Result};
use discovery_api::ServiceAnnouncement;
use tracing::warn;

/// Find the announcement of `announcement_type` in `announcements`.
///
/// The collection should hold at most one announcement per type. When more
/// than one matches, the first in iteration order is returned and the anomaly
/// is logged.
pub fn find_by_type<'a, I>(announcements: I, announcement_type: &str) -> Result<ServiceAnnouncement>
where
    I: IntoIterator<Item = &'a ServiceAnnouncement>,
{
    let examined: Vec<&ServiceAnnouncement> = announcements.into_iter().collect();
    let mut matching = examined
        .iter()
        .filter(|announcement| announcement.announcement_type() == announcement_type);

    let found = match matching.next() {
        Some(found) => *found,
        None => {
            return Err(CoreError::AnnouncementNotFound {
                announcement_type: announcement_type.to_string(),
                announcements: examined.iter().map(|announcement| (*announcement).clone()).collect(),
            })
        }
    };

    let extra = matching.count();
    if extra > 0 {
        warn!(
            "Found {} announcements of type {}, using {}",
            extra + 1,
            announcement_type,
            found.id()
        );
    }

    Ok(found.clone())
}
