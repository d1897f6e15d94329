//! Domain Ports - Core trait definitions for the control plane
//!
//! These traits define the boundaries between placement logic and the
//! outside world: storage drivers on one side, persistence on the other.
//! Adapters implement these traits to provide concrete functionality.

use crate::error::Result;
use crate::model::{
    CreateOpts, DeleteOpts, DockSpec, DriverResult, ExtendOpts, ProfileSpec, ResourceKind,
    ResourceSpec, ResourceStatus, StoragePoolSpec,
};
use async_trait::async_trait;
use std::sync::Arc;

// =============================================================================
// Storage Driver Port
// =============================================================================

/// Port for a backend driver. Vendor protocols live behind this trait.
#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// Name the driver is registered under
    fn driver_name(&self) -> &str;

    /// List the capacity pools of the backend
    async fn list_pools(&self) -> Result<Vec<StoragePoolSpec>>;

    /// Create a volume in `opts.pool_id`
    async fn create_volume(&self, opts: &CreateOpts) -> Result<DriverResult>;

    /// Delete a volume
    async fn delete_volume(&self, opts: &DeleteOpts) -> Result<()>;

    /// Grow a volume to `opts.size`
    async fn extend_volume(&self, opts: &ExtendOpts) -> Result<DriverResult>;

    /// Create a file share in `opts.pool_id`
    async fn create_file_share(&self, opts: &CreateOpts) -> Result<DriverResult>;

    /// Delete a file share
    async fn delete_file_share(&self, opts: &DeleteOpts) -> Result<()>;

    /// Check if backend is reachable
    async fn health_check(&self) -> Result<bool>;
}

// =============================================================================
// Persistence Port
// =============================================================================

/// Port for the record store holding profiles, docks, pools and resources
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    // Profiles
    async fn create_profile(&self, profile: ProfileSpec) -> Result<ProfileSpec>;
    async fn get_profile(&self, id: &str) -> Result<ProfileSpec>;
    async fn get_default_profile(&self) -> Result<ProfileSpec>;
    async fn list_profiles(&self) -> Result<Vec<ProfileSpec>>;

    // Docks; create is an upsert keyed by id
    async fn create_dock(&self, dock: DockSpec) -> Result<DockSpec>;
    async fn get_dock(&self, id: &str) -> Result<DockSpec>;
    async fn get_dock_by_pool_id(&self, pool_id: &str) -> Result<DockSpec>;
    async fn list_docks(&self) -> Result<Vec<DockSpec>>;
    async fn delete_dock(&self, id: &str) -> Result<()>;

    // Pools; create is an upsert keyed by id
    async fn create_pool(&self, pool: StoragePoolSpec) -> Result<StoragePoolSpec>;
    async fn get_pool(&self, id: &str) -> Result<StoragePoolSpec>;
    /// Pools in registration order
    async fn list_pools(&self) -> Result<Vec<StoragePoolSpec>>;
    async fn delete_pool(&self, id: &str) -> Result<()>;

    // Volumes and file shares
    async fn create_resource(&self, resource: ResourceSpec) -> Result<ResourceSpec>;
    async fn get_resource(&self, kind: ResourceKind, id: &str) -> Result<ResourceSpec>;
    async fn list_resources(&self, kind: ResourceKind) -> Result<Vec<ResourceSpec>>;
    async fn update_resource(&self, resource: ResourceSpec) -> Result<ResourceSpec>;
    async fn update_status(&self, kind: ResourceKind, id: &str, status: ResourceStatus)
        -> Result<()>;
    async fn delete_resource(&self, kind: ResourceKind, id: &str) -> Result<()>;
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type StorageDriverRef = Arc<dyn StorageDriver>;
pub type PersistenceClientRef = Arc<dyn PersistenceClient>;
