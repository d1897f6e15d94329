//! Dock Register
//!
//! Writes discovered docks and pools to the store, and removes them again.

use crate::domain::PersistenceClientRef;
use crate::error::Result;
use crate::model::{DockSpec, StoragePoolSpec};
use tracing::debug;

/// A record discovery can register
#[derive(Debug, Clone, PartialEq)]
pub enum Registrable {
    Dock(DockSpec),
    Pool(StoragePoolSpec),
}

impl Registrable {
    pub fn id(&self) -> &str {
        match self {
            Registrable::Dock(dock) => &dock.id,
            Registrable::Pool(pool) => &pool.id,
        }
    }
}

/// Store-backed register for discovery results
#[derive(Clone)]
pub struct DockRegister {
    store: PersistenceClientRef,
}

impl DockRegister {
    pub fn new(store: PersistenceClientRef) -> Self {
        Self { store }
    }

    /// Upsert a dock or pool
    pub async fn register(&self, item: Registrable) -> Result<()> {
        match item {
            Registrable::Dock(dock) => {
                debug!(dock = %dock.name, id = %dock.id, "Registering dock");
                self.store.create_dock(dock).await?;
            }
            Registrable::Pool(pool) => {
                debug!(pool = %pool.name, id = %pool.id, "Registering pool");
                self.store.create_pool(pool).await?;
            }
        }
        Ok(())
    }

    /// Remove a dock or pool
    pub async fn unregister(&self, item: &Registrable) -> Result<()> {
        match item {
            Registrable::Dock(dock) => self.store.delete_dock(&dock.id).await,
            Registrable::Pool(pool) => self.store.delete_pool(&pool.id).await,
        }
    }

    /// Pools currently registered
    pub async fn registered_pools(&self) -> Result<Vec<StoragePoolSpec>> {
        self.store.list_pools().await
    }
}
