use anyhow::{Context, Result};
use discovery_api::{ServiceAnnouncement, DATASOURCES_PROPERTY, PRESTO_ANNOUNCEMENT_TYPE};
use discovery_core::datasources::encode;
use discovery_core::{
    rebuild_datasources, AnnouncementMetrics, Announcer, Broadcaster, CatalogRegistry, CatalogStore,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod admin;
mod config;
mod sink;

use admin::AdminState;
use config::{LogFormat, NodeConfig};
use sink::LogSink;

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::load()?;
    init_tracing(config.log_format);

    info!("Starting node-announcer {}...", config.node_id);

    let metrics = AnnouncementMetrics::new()?;
    let announcer = Arc::new(Announcer::with_metrics(metrics.clone()));
    announcer
        .add_service_announcement(presto_announcement(&config))
        .await?;
    info!("Announcer initialized");

    let catalogs = Arc::new(CatalogStore::new(announcer.clone(), config.catalogs.clone()));
    let catalog_names = catalogs.catalog_names().await;
    info!("Catalog registry initialized with {} catalogs", catalog_names.len());

    rebuild_datasources(
        &announcer,
        &catalog_names,
        config.coordinator,
        config.include_coordinator,
    )
    .await
    .context("Failed to build datasources announcement")?;

    let broadcaster = Broadcaster::new(announcer.clone(), LogSink, config.broadcast_config());
    let broadcast_task = tokio::task::spawn(broadcaster.run());

    let listener = TcpListener::bind(&config.admin_addr).await?;
    let state = Arc::new(AdminState {
        announcer: announcer.clone(),
        catalogs,
        metrics,
    });
    let admin_task = tokio::task::spawn(admin::serve(listener, state));

    tokio::signal::ctrl_c().await?;
    info!("Shutting down node-announcer...");
    announcer.destroy().await;

    if let Err(e) = broadcast_task.await {
        error!("Broadcaster task failed: {}", e);
    }
    match admin_task.await {
        Ok(Err(e)) => error!("Admin server failed: {}", e),
        Err(e) => error!("Admin server task failed: {}", e),
        Ok(Ok(())) => {}
    }

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

/// The node's `presto` announcement before datasources are resolved
fn presto_announcement(config: &NodeConfig) -> ServiceAnnouncement {
    let builder = ServiceAnnouncement::builder(PRESTO_ANNOUNCEMENT_TYPE)
        .add_property("node_version", config.node_version.as_str())
        .add_property("coordinator", config.coordinator.to_string())
        .add_property("http", config.http_uri.as_str());

    let datasources = config.configured_datasources();
    if datasources.is_empty() {
        builder.build()
    } else {
        builder.add_property(DATASOURCES_PROPERTY, encode(&datasources)).build()
    }
}
