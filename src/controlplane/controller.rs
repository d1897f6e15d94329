//! Provision Controller
//!
//! Turns pending volume and file share records into provisioned resources:
//! - Resolves the profile and selects a pool
//! - Resolves the pool's dock and driver, then dispatches to the driver
//! - Records the outcome as the resource status
//!
//! Capacity is not reserved at selection time; two concurrent requests can
//! pick the same pool and the driver has the final word.

use super::backends::DriverRegistry;
use super::profile::ProfileResolver;
use crate::domain::{PersistenceClientRef, StorageDriverRef};
use crate::error::{Error, Result};
use crate::metrics::Metrics;
use crate::model::{
    CreateOpts, DeleteOpts, ExtendOpts, ResourceKind, ResourceSpec, ResourceStatus,
};
use crate::placement::{PlacementRequest, PoolSelector};
use std::sync::Arc;
use tracing::{error, info, warn};

// =============================================================================
// Provision Controller
// =============================================================================

/// Drives resources through placement and driver dispatch
pub struct ProvisionController {
    store: PersistenceClientRef,
    drivers: Arc<DriverRegistry>,
    profiles: ProfileResolver,
    metrics: Arc<Metrics>,
}

impl ProvisionController {
    pub fn new(
        store: PersistenceClientRef,
        drivers: Arc<DriverRegistry>,
        metrics: Arc<Metrics>,
    ) -> Arc<Self> {
        Arc::new(Self {
            profiles: ProfileResolver::new(store.clone()),
            store,
            drivers,
            metrics,
        })
    }

    pub fn store(&self) -> &PersistenceClientRef {
        &self.store
    }

    pub fn drivers(&self) -> &Arc<DriverRegistry> {
        &self.drivers
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Validate and persist a new pending resource
    pub async fn submit(&self, mut resource: ResourceSpec) -> Result<ResourceSpec> {
        if resource.name.trim().is_empty() {
            return Err(Error::ApiValidation(format!("{} name is required", resource.kind)));
        }
        if resource.size == 0 {
            return Err(Error::ApiValidation(format!(
                "{} size must be at least 1 GiB",
                resource.kind
            )));
        }
        resource.status = ResourceStatus::Pending;
        self.store.create_resource(resource).await
    }

    // =========================================================================
    // Creation
    // =========================================================================

    pub async fn create_volume(&self, id: &str) -> Result<ResourceSpec> {
        self.create_resource(ResourceKind::Volume, id).await
    }

    pub async fn create_file_share(&self, id: &str) -> Result<ResourceSpec> {
        self.create_resource(ResourceKind::FileShare, id).await
    }

    /// Place and provision the pending resource `id`.
    ///
    /// Any failure after the record is loaded leaves it in `Error`.
    pub async fn create_resource(&self, kind: ResourceKind, id: &str) -> Result<ResourceSpec> {
        let resource = self.store.get_resource(kind, id).await?;
        if resource.status != ResourceStatus::Pending {
            return Err(Error::InvalidStatus {
                id: id.to_string(),
                status: resource.status.to_string(),
                expected: ResourceStatus::Pending.to_string(),
            });
        }

        match self.provision(resource).await {
            Ok(resource) => {
                self.count(kind, "create", "ok");
                info!("Provisioned {} {} in pool {}", kind, id, resource.pool_id);
                Ok(resource)
            }
            Err(e) => {
                self.count(kind, "create", "error");
                error!("Failed to create {} {}: {}", kind, id, e);
                self.mark(kind, id, ResourceStatus::Error).await;
                Err(e)
            }
        }
    }

    async fn provision(&self, mut resource: ResourceSpec) -> Result<ResourceSpec> {
        let kind = resource.kind;
        let profile = self.profiles.resolve(&resource.profile_id).await?;
        if resource.profile_id.is_empty() {
            resource.profile_id = profile.id.clone();
        }

        let pools = self.store.list_pools().await?;
        let pool = match PoolSelector::select_one(&profile, &PlacementRequest::from(&resource), &pools) {
            Ok(pool) => {
                self.metrics.placements.with_label_values(&["ok"]).inc();
                pool
            }
            Err(e) => {
                let outcome = match e {
                    Error::NoAvailablePool => "no_pool",
                    _ => "error",
                };
                self.metrics.placements.with_label_values(&[outcome]).inc();
                return Err(e);
            }
        };

        let dock = self.store.get_dock(&pool.dock_id).await?;
        let driver = self.drivers.get(&dock.driver_name)?;

        let mut opts = CreateOpts::from(&resource);
        opts.pool_id = pool.id.clone();
        opts.pool_name = pool.name.clone();
        opts.driver_name = dock.driver_name.clone();

        let result = match kind {
            ResourceKind::Volume => driver.create_volume(&opts).await,
            ResourceKind::FileShare => driver.create_file_share(&opts).await,
        }
        .map_err(|e| dispatch_error(&driver, "create", e))?;

        resource.pool_id = pool.id;
        if let Some(size) = result.size {
            resource.size = size;
        }
        resource.metadata.extend(result.metadata);
        resource.status = ResourceStatus::Available;
        self.store.update_resource(resource).await
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    pub async fn delete_volume(&self, id: &str) -> Result<()> {
        self.delete_resource(ResourceKind::Volume, id).await
    }

    pub async fn delete_file_share(&self, id: &str) -> Result<()> {
        self.delete_resource(ResourceKind::FileShare, id).await
    }

    /// Delete the backend resource, then the record. A failure leaves the
    /// record in `ErrorDeleting`.
    pub async fn delete_resource(&self, kind: ResourceKind, id: &str) -> Result<()> {
        let resource = self.store.get_resource(kind, id).await?;
        if resource.status == ResourceStatus::Deleting {
            return Err(Error::InvalidStatus {
                id: id.to_string(),
                status: resource.status.to_string(),
                expected: "any status but deleting".to_string(),
            });
        }
        self.store
            .update_status(kind, id, ResourceStatus::Deleting)
            .await?;

        match self.deprovision(&resource).await {
            Ok(()) => {
                self.count(kind, "delete", "ok");
                info!("Deleted {} {}", kind, id);
                Ok(())
            }
            Err(e) => {
                self.count(kind, "delete", "error");
                error!("Failed to delete {} {}: {}", kind, id, e);
                self.mark(kind, id, ResourceStatus::ErrorDeleting).await;
                Err(e)
            }
        }
    }

    async fn deprovision(&self, resource: &ResourceSpec) -> Result<()> {
        let kind = resource.kind;

        // Never provisioned, nothing exists on a backend
        if matches!(resource.status, ResourceStatus::Pending | ResourceStatus::Error) {
            return self.store.delete_resource(kind, &resource.id).await;
        }

        let profile = self.profiles.resolve(&resource.profile_id).await?;
        let dock = self.store.get_dock_by_pool_id(&resource.pool_id).await?;
        let driver = self.drivers.get(&dock.driver_name)?;

        let opts = DeleteOpts {
            id: resource.id.clone(),
            kind,
            pool_id: resource.pool_id.clone(),
            profile_id: profile.id,
            driver_name: dock.driver_name.clone(),
            metadata: resource.metadata.clone(),
        };
        match kind {
            ResourceKind::Volume => driver.delete_volume(&opts).await,
            ResourceKind::FileShare => driver.delete_file_share(&opts).await,
        }
        .map_err(|e| dispatch_error(&driver, "delete", e))?;

        self.store.delete_resource(kind, &resource.id).await
    }

    // =========================================================================
    // Extension
    // =========================================================================

    /// Grow an available volume to `new_size` GiB. A failure leaves the
    /// record in `ErrorExtending`.
    pub async fn extend_volume(&self, id: &str, new_size: u64) -> Result<ResourceSpec> {
        let kind = ResourceKind::Volume;
        let resource = self.store.get_resource(kind, id).await?;
        if resource.status != ResourceStatus::Available {
            return Err(Error::InvalidStatus {
                id: id.to_string(),
                status: resource.status.to_string(),
                expected: ResourceStatus::Available.to_string(),
            });
        }
        if new_size <= resource.size {
            return Err(Error::ApiValidation(format!(
                "new size {} must be larger than current size {}",
                new_size, resource.size
            )));
        }
        self.store
            .update_status(kind, id, ResourceStatus::Extending)
            .await?;

        match self.grow(resource, new_size).await {
            Ok(resource) => {
                self.count(kind, "extend", "ok");
                info!("Extended volume {} to {} GiB", id, resource.size);
                Ok(resource)
            }
            Err(e) => {
                self.count(kind, "extend", "error");
                error!("Failed to extend volume {}: {}", id, e);
                self.mark(kind, id, ResourceStatus::ErrorExtending).await;
                Err(e)
            }
        }
    }

    async fn grow(&self, mut resource: ResourceSpec, new_size: u64) -> Result<ResourceSpec> {
        let dock = self.store.get_dock_by_pool_id(&resource.pool_id).await?;
        let driver = self.drivers.get(&dock.driver_name)?;

        let opts = ExtendOpts {
            id: resource.id.clone(),
            pool_id: resource.pool_id.clone(),
            size: new_size,
            driver_name: dock.driver_name.clone(),
            metadata: resource.metadata.clone(),
        };
        let result = driver
            .extend_volume(&opts)
            .await
            .map_err(|e| dispatch_error(&driver, "extend", e))?;

        resource.size = result.size.unwrap_or(new_size);
        resource.metadata.extend(result.metadata);
        resource.status = ResourceStatus::Available;
        self.store.update_resource(resource).await
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Best-effort status write; the caller's error wins
    async fn mark(&self, kind: ResourceKind, id: &str, status: ResourceStatus) {
        if let Err(e) = self.store.update_status(kind, id, status).await {
            warn!("Failed to set {} {} to {}: {}", kind, id, status, e);
        }
    }

    fn count(&self, kind: ResourceKind, operation: &str, outcome: &str) {
        let kind = kind.to_string();
        self.metrics
            .provisions
            .with_label_values(&[kind.as_str(), operation, outcome])
            .inc();
    }
}

/// Wrap a driver failure, keeping errors the driver already classified
fn dispatch_error(driver: &StorageDriverRef, operation: &str, e: Error) -> Error {
    match e {
        Error::DriverDispatch { .. } | Error::ResourceNotFound { .. } => e,
        other => Error::DriverDispatch {
            driver: driver.driver_name().to_string(),
            operation: operation.to_string(),
            reason: other.to_string(),
        },
    }
}
