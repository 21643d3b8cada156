//! Default datasource policy derived from the node's role

use crate::DatasourceSet;

/// Catalog advertised by a dedicated coordinator
pub const JMX_CATALOG: &str = "jmx";

/// Resolve the datasources a node advertises.
///
/// An explicitly configured set always wins. Otherwise a dedicated
/// coordinator (one not scheduled for query execution) advertises only the
/// `jmx` catalog when it exists, and every other node advertises all
/// available catalogs.
pub fn resolve_default_datasources<S: AsRef<str>>(
    configured: &DatasourceSet,
    available_catalogs: &[S],
    is_coordinator: bool,
    include_coordinator: bool,
) -> DatasourceSet {
    if !configured.is_empty() {
        return configured.clone();
    }

    if is_coordinator && !include_coordinator {
        return available_catalogs
            .iter()
            .map(AsRef::<str>::as_ref)
            .filter(|catalog| *catalog == JMX_CATALOG)
            .collect();
    }

    available_catalogs.iter().map(AsRef::<str>::as_ref).collect()
}
