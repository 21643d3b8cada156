//! Datasource updates of the `presto` announcement

use crate::datasources::{decode, encode};
use crate::metrics::{OP_ADD, OP_REBUILD};
use crate::policy::resolve_default_datasources;
use crate::{Announcer, CoreError, DatasourceSet, Result};
use discovery_api::{ServiceAnnouncement, DATASOURCES_PROPERTY, PRESTO_ANNOUNCEMENT_TYPE};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Recompute the advertised datasources from the node's role and catalogs.
///
/// Explicitly configured datasources are kept as they are; an empty list is
/// filled in from the available catalogs. All other properties are copied
/// unchanged. The change goes out with the next periodic broadcast.
pub async fn rebuild_datasources<S: AsRef<str>>(
    announcer: &Announcer,
    available_catalogs: &[S],
    is_coordinator: bool,
    include_coordinator: bool,
) -> Result<ServiceAnnouncement> {
    let result = announcer
        .replace_properties(PRESTO_ANNOUNCEMENT_TYPE, |current| {
            let configured = current_datasources(current);
            let datasources = resolve_default_datasources(
                &configured,
                available_catalogs,
                is_coordinator,
                include_coordinator,
            );
            with_datasources(current, &datasources)
        })
        .await;

    record(announcer, OP_REBUILD, &result);
    let announcement = result?;
    info!(
        "Announcing datasources: {}",
        announcement.property(DATASOURCES_PROPERTY).unwrap_or_default()
    );
    Ok(announcement)
}

/// Add a dynamically registered connector to the advertised datasources and
/// force an immediate broadcast. Adding a connector that is already
/// advertised leaves the datasource list unchanged.
///
/// Connector ids must be non-empty, free of commas and surrounding
/// whitespace; anything else is rejected before the announcement is touched.
pub async fn add_datasource(announcer: &Announcer, connector_id: &str) -> Result<ServiceAnnouncement> {
    let result = match validate_connector_id(connector_id) {
        Ok(()) => {
            announcer
                .replace_properties(PRESTO_ANNOUNCEMENT_TYPE, |current| {
                    let mut datasources = current_datasources(current);
                    if !datasources.insert(connector_id) {
                        debug!("Datasource {} already announced", connector_id);
                    }
                    with_datasources(current, &datasources)
                })
                .await
        }
        Err(e) => Err(e),
    };

    record(announcer, OP_ADD, &result);
    let announcement = result?;
    debug!("Added datasource {}, forcing announcement", connector_id);
    announcer.force_announce();
    Ok(announcement)
}

/// A connector id must survive a decode of the `datasources` property unchanged
pub fn validate_connector_id(connector_id: &str) -> Result<()> {
    if connector_id.is_empty() || connector_id.contains(',') || connector_id.trim() != connector_id {
        return Err(CoreError::InvalidDatasource(connector_id.to_string()));
    }
    Ok(())
}

fn current_datasources(announcement: &ServiceAnnouncement) -> DatasourceSet {
    decode(announcement.property(DATASOURCES_PROPERTY))
}

/// Copy every property except `datasources`, then set `datasources` to the encoded set
fn with_datasources(
    announcement: &ServiceAnnouncement,
    datasources: &DatasourceSet,
) -> BTreeMap<String, String> {
    let mut properties: BTreeMap<String, String> = announcement
        .properties()
        .iter()
        .filter(|(key, _)| key.as_str() != DATASOURCES_PROPERTY)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    properties.insert(DATASOURCES_PROPERTY.to_string(), encode(datasources));
    properties
}

fn record(announcer: &Announcer, operation: &str, result: &Result<ServiceAnnouncement>) {
    let Some(metrics) = announcer.metrics() else {
        return;
    };

    match result {
        Ok(announcement) => {
            metrics.updates_total.with_label_values(&[operation]).inc();
            let count = current_datasources(announcement).len();
            metrics.announced_datasources.set(count as i64);
        }
        Err(e) => {
            warn!("Failed to update datasources ({}): {}", operation, e);
            metrics.update_failures_total.with_label_values(&[operation]).inc();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AnnouncementMetrics;
    use std::sync::Arc;
    use std::time::Duration;

    fn presto(datasources: Option<&str>) -> ServiceAnnouncement {
        let builder = ServiceAnnouncement::builder(PRESTO_ANNOUNCEMENT_TYPE)
            .add_property("coordinator", "false")
            .add_property("node_version", "0.1.0")
            .add_property("http", "http://10.0.0.5:8080");
        match datasources {
            Some(value) => builder.add_property(DATASOURCES_PROPERTY, value).build(),
            None => builder.build(),
        }
    }

    async fn announcer_with(announcement: ServiceAnnouncement) -> Announcer {
        let announcer = Announcer::new();
        announcer.add_service_announcement(announcement).await.unwrap();
        announcer
    }

    async fn advertised(announcer: &Announcer) -> String {
        let announcements = announcer.service_announcements().await;
        let presto = crate::find_by_type(&announcements, PRESTO_ANNOUNCEMENT_TYPE).unwrap();
        presto.property(DATASOURCES_PROPERTY).unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn test_rebuild_fills_empty_datasources_from_catalogs() {
        let announcer = announcer_with(presto(None)).await;

        rebuild_datasources(&announcer, &["hive", "jmx", "tpch"], false, true)
            .await
            .unwrap();

        assert_eq!(advertised(&announcer).await, "hive,jmx,tpch");
    }

    #[tokio::test]
    async fn test_rebuild_dedicated_coordinator() {
        let announcer = announcer_with(presto(Some(" , "))).await;

        rebuild_datasources(&announcer, &["hive", "jmx"], true, false)
            .await
            .unwrap();

        assert_eq!(advertised(&announcer).await, "jmx");
    }

    #[tokio::test]
    async fn test_rebuild_keeps_configured_datasources_normalized() {
        let announcer = announcer_with(presto(Some("mysql, hive,mysql"))).await;

        rebuild_datasources(&announcer, &["jmx"], false, false)
            .await
            .unwrap();

        assert_eq!(advertised(&announcer).await, "mysql,hive");
    }

    #[tokio::test]
    async fn test_rebuild_is_non_destructive() {
        let original = presto(None);
        let announcer = announcer_with(original.clone()).await;
        let other = ServiceAnnouncement::builder("jmx-http").add_property("port", "9000").build();
        announcer.add_service_announcement(other.clone()).await.unwrap();

        let rebuilt = rebuild_datasources(&announcer, &["hive"], false, false)
            .await
            .unwrap();

        assert_eq!(rebuilt.announcement_type(), original.announcement_type());
        assert_ne!(rebuilt.id(), original.id());
        for (key, value) in original.properties() {
            assert_eq!(rebuilt.property(key), Some(value.as_str()));
        }
        assert_eq!(rebuilt.properties().len(), original.properties().len() + 1);
        assert!(announcer.service_announcements().await.contains(&other));
        assert_eq!(announcer.announcement_count().await, 2);
    }

    #[tokio::test]
    async fn test_rebuild_does_not_force_broadcast() {
        let announcer = announcer_with(presto(None)).await;
        rebuild_datasources(&announcer, &["hive"], false, false)
            .await
            .unwrap();

        let forced = tokio::time::timeout(Duration::from_millis(50), announcer.forced()).await;
        assert!(forced.is_err());
    }

    #[tokio::test]
    async fn test_add_datasource_appends_and_forces_broadcast() {
        let announcer = announcer_with(presto(Some("hive"))).await;

        add_datasource(&announcer, "mysql").await.unwrap();

        assert_eq!(advertised(&announcer).await, "hive,mysql");
        tokio::time::timeout(Duration::from_secs(1), announcer.forced())
            .await
            .expect("add_datasource should force a broadcast");
    }

    #[tokio::test]
    async fn test_add_datasource_is_idempotent() {
        let announcer = announcer_with(presto(Some("hive"))).await;

        add_datasource(&announcer, "mysql").await.unwrap();
        let once = advertised(&announcer).await;
        add_datasource(&announcer, "mysql").await.unwrap();

        assert_eq!(advertised(&announcer).await, once);
    }

    async fn assert_rejected(connector_id: &str) {
        let announcer = announcer_with(presto(Some("hive"))).await;
        let before = announcer.service_announcements().await;

        let err = add_datasource(&announcer, connector_id).await.unwrap_err();
        assert!(
            matches!(&err, CoreError::InvalidDatasource(id) if id == connector_id),
            "unexpected error: {}",
            err
        );
        assert_eq!(announcer.service_announcements().await, before);

        let forced = tokio::time::timeout(Duration::from_millis(50), announcer.forced()).await;
        assert!(forced.is_err());
    }

    #[tokio::test]
    async fn test_add_datasource_rejects_empty_id() {
        assert_rejected("").await;
    }

    #[tokio::test]
    async fn test_add_datasource_rejects_comma_in_id() {
        assert_rejected("a,b").await;
        assert_rejected(",").await;
    }

    #[tokio::test]
    async fn test_add_datasource_rejects_surrounding_whitespace() {
        assert_rejected(" hive ").await;
        assert_rejected("mysql\t").await;
        assert_rejected(" ").await;
    }

    #[test]
    fn test_validate_connector_id() {
        assert!(validate_connector_id("hive").is_ok());
        assert!(validate_connector_id("my_catalog-2").is_ok());
        assert!(validate_connector_id("").is_err());
        assert!(validate_connector_id("a,b").is_err());
        assert!(validate_connector_id(" hive").is_err());
    }

    #[tokio::test]
    async fn test_missing_announcement_fails_without_mutation() {
        let other = ServiceAnnouncement::builder("jmx-http").build();
        let announcer = announcer_with(other.clone()).await;

        let err = rebuild_datasources(&announcer, &["hive"], false, false)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = add_datasource(&announcer, "hive").await.unwrap_err();
        assert!(err.is_not_found());

        assert_eq!(announcer.service_announcements().await, vec![other]);
    }

    #[tokio::test]
    async fn test_metrics_recorded() {
        let metrics = AnnouncementMetrics::new().unwrap();
        let announcer = Announcer::with_metrics(metrics.clone());

        assert!(add_datasource(&announcer, "hive").await.is_err());
        announcer.add_service_announcement(presto(None)).await.unwrap();
        add_datasource(&announcer, "hive").await.unwrap();
        add_datasource(&announcer, "jmx").await.unwrap();

        assert_eq!(metrics.updates_total.with_label_values(&[OP_ADD]).get(), 2.0);
        assert_eq!(metrics.update_failures_total.with_label_values(&[OP_ADD]).get(), 1.0);
        assert_eq!(metrics.announced_datasources.get(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_lose_no_updates() {
        let announcer = Arc::new(announcer_with(presto(Some("hive"))).await);

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let announcer = announcer.clone();
                tokio::spawn(async move {
                    add_datasource(&announcer, &format!("connector_{}", i)).await.unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let datasources = decode(Some(advertised(&announcer).await.as_str()));
        assert_eq!(datasources.len(), 33);
        assert!(datasources.contains("hive"));
        for i in 0..32 {
            assert!(datasources.contains(&format!("connector_{}", i)));
        }
        assert_eq!(announcer.announcement_count().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_rebuild_races_with_adds() {
        let announcer = Arc::new(announcer_with(presto(None)).await);

        let rebuild = {
            let announcer = announcer.clone();
            tokio::spawn(async move {
                rebuild_datasources(&announcer, &["jmx", "tpch"], false, true)
                    .await
                    .unwrap();
            })
        };
        let adds: Vec<_> = (0..8)
            .map(|i| {
                let announcer = announcer.clone();
                tokio::spawn(async move {
                    add_datasource(&announcer, &format!("dynamic_{}", i)).await.unwrap();
                })
            })
            .collect();

        rebuild.await.unwrap();
        for add in adds {
            add.await.unwrap();
        }

        let datasources = decode(Some(advertised(&announcer).await.as_str()));
        for i in 0..8 {
            assert!(datasources.contains(&format!("dynamic_{}", i)));
        }
    }
}
