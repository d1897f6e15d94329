//! Sample Storage Driver
//!
//! An in-process backend serving the pools listed in its configuration
//! section. Volumes and file shares are tracked in memory and draw down the
//! free capacity of their pool, so discovery sees provisioning take effect.

use crate::config::BackendConfig;
use crate::domain::ports::StorageDriver;
use crate::error::{Error, Result};
use crate::model::{
    CreateOpts, DeleteOpts, DriverResult, ExtendOpts, ResourceKind, StoragePoolSpec,
};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Driver name the sample backend registers under
pub const SAMPLE_DRIVER_NAME: &str = "sample";

// =============================================================================
// Provisioned State
// =============================================================================

/// Internal tracking of provisioned resources
#[derive(Debug, Clone)]
struct ProvisionedState {
    kind: ResourceKind,
    pool: String,
    size: u64,
    path: String,
}

// =============================================================================
// Sample Driver
// =============================================================================

/// In-memory storage driver
pub struct SampleDriver {
    backend: String,
    /// Pools keyed by name, in configuration order
    pools: RwLock<IndexMap<String, StoragePoolSpec>>,
    provisioned: RwLock<BTreeMap<String, ProvisionedState>>,
}

impl SampleDriver {
    /// Create a driver serving the pools of `config`
    pub fn new(config: &BackendConfig) -> Self {
        let pools = config
            .pools
            .iter()
            .map(|p| {
                let mut pool = StoragePoolSpec::new(p.name.clone(), p.total_capacity, p.free_capacity);
                pool.storage_type = p.storage_type;
                pool.availability_zone = p.availability_zone.clone();
                pool.extras = p.extras.clone();
                (p.name.clone(), pool)
            })
            .collect();

        Self {
            backend: config.name.clone(),
            pools: RwLock::new(pools),
            provisioned: RwLock::new(BTreeMap::new()),
        }
    }

    fn dispatch_error(&self, operation: &str, reason: impl Into<String>) -> Error {
        Error::DriverDispatch {
            driver: SAMPLE_DRIVER_NAME.into(),
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    async fn allocate(&self, opts: &CreateOpts, operation: &str) -> Result<DriverResult> {
        // Lock order is provisioned, then pools
        let mut provisioned = self.provisioned.write().await;
        if provisioned.contains_key(&opts.id) {
            return Err(self.dispatch_error(operation, format!("{} already exists", opts.id)));
        }

        let mut pools = self.pools.write().await;
        let pool = pools
            .get_mut(&opts.pool_name)
            .ok_or_else(|| self.dispatch_error(operation, format!("unknown pool {}", opts.pool_name)))?;

        if pool.free_capacity < opts.size {
            return Err(self.dispatch_error(
                operation,
                format!(
                    "pool {} has {} GiB free, {} GiB requested",
                    pool.name, pool.free_capacity, opts.size
                ),
            ));
        }
        pool.free_capacity -= opts.size;

        let path = format!("/{}/{}/{}", self.backend, pool.name, opts.id);
        info!(
            "Creating sample {}: {} in {} ({} GiB)",
            opts.kind, opts.name, pool.name, opts.size
        );

        provisioned.insert(
            opts.id.clone(),
            ProvisionedState {
                kind: opts.kind,
                pool: pool.name.clone(),
                size: opts.size,
                path: path.clone(),
            },
        );

        let mut metadata = BTreeMap::new();
        metadata.insert("backend".to_string(), self.backend.clone());
        metadata.insert("pool".to_string(), pool.name.clone());
        match opts.kind {
            ResourceKind::Volume => metadata.insert("path".to_string(), path),
            ResourceKind::FileShare => metadata.insert("exportLocation".to_string(), path),
        };

        Ok(DriverResult {
            size: Some(opts.size),
            metadata,
        })
    }

    async fn release(&self, opts: &DeleteOpts, operation: &str) -> Result<()> {
        info!("Deleting sample {}: {}", opts.kind, opts.id);

        let mut provisioned = self.provisioned.write().await;
        let state = match provisioned.get(&opts.id) {
            Some(state) if state.kind == opts.kind => state.clone(),
            Some(state) => {
                return Err(self.dispatch_error(operation, format!("{} is a {}", opts.id, state.kind)))
            }
            None => {
                return Err(Error::ResourceNotFound {
                    kind: opts.kind.to_string(),
                    id: opts.id.clone(),
                })
            }
        };
        provisioned.remove(&opts.id);

        if let Some(pool) = self.pools.write().await.get_mut(&state.pool) {
            pool.free_capacity = (pool.free_capacity + state.size).min(pool.total_capacity);
        }
        debug!(path = %state.path, "Released sample resource");
        Ok(())
    }
}

#[async_trait]
impl StorageDriver for SampleDriver {
    fn driver_name(&self) -> &str {
        SAMPLE_DRIVER_NAME
    }

    async fn list_pools(&self) -> Result<Vec<StoragePoolSpec>> {
        Ok(self.pools.read().await.values().cloned().collect())
    }

    async fn create_volume(&self, opts: &CreateOpts) -> Result<DriverResult> {
        self.allocate(opts, "create_volume").await
    }

    async fn delete_volume(&self, opts: &DeleteOpts) -> Result<()> {
        self.release(opts, "delete_volume").await
    }

    async fn extend_volume(&self, opts: &ExtendOpts) -> Result<DriverResult> {
        let mut provisioned = self.provisioned.write().await;
        let state = provisioned.get_mut(&opts.id).ok_or_else(|| Error::ResourceNotFound {
            kind: ResourceKind::Volume.to_string(),
            id: opts.id.clone(),
        })?;

        if opts.size <= state.size {
            return Err(self.dispatch_error(
                "extend_volume",
                format!("new size {} must exceed {}", opts.size, state.size),
            ));
        }
        let delta = opts.size - state.size;

        let mut pools = self.pools.write().await;
        let pool = pools
            .get_mut(&state.pool)
            .ok_or_else(|| self.dispatch_error("extend_volume", format!("unknown pool {}", state.pool)))?;
        if pool.free_capacity < delta {
            return Err(self.dispatch_error(
                "extend_volume",
                format!("pool {} has {} GiB free, {} GiB more requested", pool.name, pool.free_capacity, delta),
            ));
        }
        pool.free_capacity -= delta;
        state.size = opts.size;

        info!("Extended sample volume {} to {} GiB", opts.id, opts.size);
        Ok(DriverResult {
            size: Some(opts.size),
            metadata: BTreeMap::new(),
        })
    }

    async fn create_file_share(&self, opts: &CreateOpts) -> Result<DriverResult> {
        self.allocate(opts, "create_file_share").await
    }

    async fn delete_file_share(&self, opts: &DeleteOpts) -> Result<()> {
        self.release(opts, "delete_file_share").await
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
