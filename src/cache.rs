//! Process-wide read-through cache of the ticket types currently on sale.
//!
//! The purchase pages hit this list on every render, so it is kept in
//! memory and refreshed explicitly: after catalog changes the owner calls
//! [`invalidate_catalog_cache`] (or [`refresh_catalog_cache`] directly).
//! Deliberately explicit state, not a hidden module-level singleton.

use crate::core::catalog::available_ticket_types;
use crate::entities::ticket_type;
use crate::errors::Result;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, trace};

/// Shared handle to the cached list of available ticket types.
pub type CatalogCache = Arc<RwLock<Vec<ticket_type::Model>>>;

/// Creates an empty catalog cache.
#[must_use]
pub fn new_catalog_cache() -> CatalogCache {
    Arc::new(RwLock::new(Vec::new()))
}

/// Reloads the cache from the database.
pub async fn refresh_catalog_cache(db: &DatabaseConnection, cache: &CatalogCache) -> Result<()> {
    info!("Refreshing ticket type catalog cache...");
    let types = available_ticket_types(db).await?;
    let mut cache_writer = cache.write().await;
    *cache_writer = types;
    info!(
        "Catalog cache refreshed with {} ticket type(s).",
        cache_writer.len()
    );
    trace!("Catalog cache now contains: {:?}", cache_writer);
    Ok(())
}

/// Drops the cached list; the next refresh repopulates it.
pub async fn invalidate_catalog_cache(cache: &CatalogCache) {
    let mut cache_writer = cache.write().await;
    cache_writer.clear();
    info!("Catalog cache invalidated.");
}
