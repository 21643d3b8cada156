//! Catalogs known to this node

use crate::updater::add_datasource;
use crate::{Announcer, CoreError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Source of the catalog names available on this node
#[async_trait]
pub trait CatalogRegistry: Send + Sync {
    async fn catalog_names(&self) -> Vec<String>;
}

/// In-memory catalog registry that supports registering catalogs at runtime.
///
/// Every catalog registered after startup is announced right away through
/// [`add_datasource`].
pub struct CatalogStore {
    // Catalog name and connector id pairs, in registration order
    catalogs: RwLock<Vec<(String, String)>>,
    announcer: Arc<Announcer>,
}

impl CatalogStore {
    /// Create a store seeded with catalogs loaded at startup. Each startup
    /// catalog uses its own name as connector id.
    pub fn new<I, S>(announcer: Arc<Announcer>, catalogs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seeded: Vec<(String, String)> = Vec::new();
        for catalog in catalogs {
            let catalog = catalog.into();
            if !seeded.iter().any(|(name, _)| *name == catalog) {
                seeded.push((catalog.clone(), catalog));
            }
        }

        Self {
            catalogs: RwLock::new(seeded),
            announcer,
        }
    }

    /// Register a catalog at runtime and announce its connector.
    ///
    /// The catalog is only recorded once the announcement was updated.
    pub async fn register_catalog(&self, catalog_name: &str, connector_id: &str) -> Result<()> {
        let mut catalogs = self.catalogs.write().await;
        if catalogs.iter().any(|(name, _)| name == catalog_name) {
            return Err(CoreError::CatalogAlreadyExists(catalog_name.to_string()));
        }

        add_datasource(&self.announcer, connector_id).await?;

        catalogs.push((catalog_name.to_string(), connector_id.to_string()));
        info!("Registered catalog {} (connector {})", catalog_name, connector_id);
        Ok(())
    }

    pub async fn contains(&self, catalog_name: &str) -> bool {
        let catalogs = self.catalogs.read().await;
        catalogs.iter().any(|(name, _)| name == catalog_name)
    }

    /// Connector id backing a catalog
    pub async fn connector_id(&self, catalog_name: &str) -> Option<String> {
        let catalogs = self.catalogs.read().await;
        catalogs
            .iter()
            .find(|(name, _)| name == catalog_name)
            .map(|(_, connector_id)| connector_id.clone())
    }
}

#[async_trait]
impl CatalogRegistry for CatalogStore {
    async fn catalog_names(&self) -> Vec<String> {
        let catalogs = self.catalogs.read().await;
        catalogs.iter().map(|(name, _)| name.clone()).collect()
    }
}
