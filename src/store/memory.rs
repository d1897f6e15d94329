//! In-Memory Store
//!
//! Keeps every record table behind its own lock. Tables preserve insertion
//! order so pool listings come back in registration order.

use crate::domain::PersistenceClient;
use crate::error::{Error, Result};
use crate::model::{
    DockSpec, ProfileSpec, ResourceKind, ResourceSpec, ResourceStatus, StoragePoolSpec,
};
use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

type ResourceKey = (ResourceKind, String);

/// Process-local implementation of the persistence port
#[derive(Debug, Default)]
pub struct MemoryStore {
    profiles: RwLock<IndexMap<String, ProfileSpec>>,
    docks: RwLock<IndexMap<String, DockSpec>>,
    pools: RwLock<IndexMap<String, StoragePoolSpec>>,
    resources: RwLock<IndexMap<ResourceKey, ResourceSpec>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered pools
    pub fn pool_count(&self) -> usize {
        self.pools.read().len()
    }
}

fn not_found(kind: &str, id: &str) -> Error {
    Error::ResourceNotFound {
        kind: kind.to_string(),
        id: id.to_string(),
    }
}

#[async_trait]
impl PersistenceClient for MemoryStore {
    // =========================================================================
    // Profiles
    // =========================================================================

    async fn create_profile(&self, mut profile: ProfileSpec) -> Result<ProfileSpec> {
        if profile.id.is_empty() {
            profile.id = uuid::Uuid::new_v4().to_string();
        }

        let mut profiles = self.profiles.write();
        if profiles.contains_key(&profile.id) {
            return Err(Error::ResourceExists {
                kind: "Profile".into(),
                id: profile.id,
            });
        }
        if profile.is_default() && profiles.values().any(|p| p.is_default()) {
            return Err(Error::ResourceExists {
                kind: "Profile".into(),
                id: profile.name,
            });
        }

        profiles.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    async fn get_profile(&self, id: &str) -> Result<ProfileSpec> {
        self.profiles
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("Profile", id))
    }

    async fn get_default_profile(&self) -> Result<ProfileSpec> {
        self.profiles
            .read()
            .values()
            .find(|p| p.is_default())
            .cloned()
            .ok_or_else(|| not_found("Profile", crate::model::DEFAULT_PROFILE_NAME))
    }

    async fn list_profiles(&self) -> Result<Vec<ProfileSpec>> {
        Ok(self.profiles.read().values().cloned().collect())
    }

    // =========================================================================
    // Docks
    // =========================================================================

    async fn create_dock(&self, mut dock: DockSpec) -> Result<DockSpec> {
        let now = Utc::now();
        let mut docks = self.docks.write();
        match docks.get(&dock.id) {
            Some(existing) => {
                dock.created_at = existing.created_at;
                dock.updated_at = Some(now);
            }
            None => dock.created_at = Some(now),
        }
        debug!(dock = %dock.name, id = %dock.id, "storing dock");
        docks.insert(dock.id.clone(), dock.clone());
        Ok(dock)
    }

    async fn get_dock(&self, id: &str) -> Result<DockSpec> {
        self.docks
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::DockNotFound { dock: id.to_string() })
    }

    async fn get_dock_by_pool_id(&self, pool_id: &str) -> Result<DockSpec> {
        let dock_id = self
            .pools
            .read()
            .get(pool_id)
            .map(|p| p.dock_id.clone())
            .ok_or_else(|| not_found("Pool", pool_id))?;
        self.get_dock(&dock_id).await
    }

    async fn list_docks(&self) -> Result<Vec<DockSpec>> {
        Ok(self.docks.read().values().cloned().collect())
    }

    async fn delete_dock(&self, id: &str) -> Result<()> {
        self.docks
            .write()
            .shift_remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::DockNotFound { dock: id.to_string() })
    }

    // =========================================================================
    // Pools
    // =========================================================================

    async fn create_pool(&self, mut pool: StoragePoolSpec) -> Result<StoragePoolSpec> {
        let now = Utc::now();
        let mut pools = self.pools.write();
        match pools.get(&pool.id) {
            Some(existing) => {
                pool.created_at = existing.created_at;
                pool.updated_at = Some(now);
            }
            None => pool.created_at = Some(now),
        }
        pools.insert(pool.id.clone(), pool.clone());
        Ok(pool)
    }

    async fn get_pool(&self, id: &str) -> Result<StoragePoolSpec> {
        self.pools
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("Pool", id))
    }

    async fn list_pools(&self) -> Result<Vec<StoragePoolSpec>> {
        Ok(self.pools.read().values().cloned().collect())
    }

    async fn delete_pool(&self, id: &str) -> Result<()> {
        self.pools
            .write()
            .shift_remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("Pool", id))
    }

    // =========================================================================
    // Resources
    // =========================================================================

    async fn create_resource(&self, resource: ResourceSpec) -> Result<ResourceSpec> {
        let key = (resource.kind, resource.id.clone());
        let mut resources = self.resources.write();
        if resources.contains_key(&key) {
            return Err(Error::ResourceExists {
                kind: resource.kind.to_string(),
                id: resource.id,
            });
        }
        resources.insert(key, resource.clone());
        Ok(resource)
    }

    async fn get_resource(&self, kind: ResourceKind, id: &str) -> Result<ResourceSpec> {
        self.resources
            .read()
            .get(&(kind, id.to_string()))
            .cloned()
            .ok_or_else(|| not_found(&kind.to_string(), id))
    }

    async fn list_resources(&self, kind: ResourceKind) -> Result<Vec<ResourceSpec>> {
        Ok(self
            .resources
            .read()
            .values()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect())
    }

    async fn update_resource(&self, mut resource: ResourceSpec) -> Result<ResourceSpec> {
        let mut resources = self.resources.write();
        let entry = resources
            .get_mut(&(resource.kind, resource.id.clone()))
            .ok_or_else(|| not_found(&resource.kind.to_string(), &resource.id))?;
        resource.updated_at = Some(Utc::now());
        *entry = resource.clone();
        Ok(resource)
    }

    async fn update_status(
        &self,
        kind: ResourceKind,
        id: &str,
        status: ResourceStatus,
    ) -> Result<()> {
        let mut resources = self.resources.write();
        let entry = resources
            .get_mut(&(kind, id.to_string()))
            .ok_or_else(|| not_found(&kind.to_string(), id))?;
        entry.status = status;
        entry.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn delete_resource(&self, kind: ResourceKind, id: &str) -> Result<()> {
        self.resources
            .write()
            .shift_remove(&(kind, id.to_string()))
            .map(|_| ())
            .ok_or_else(|| not_found(&kind.to_string(), id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn dock(id: &str) -> DockSpec {
        DockSpec {
            id: id.into(),
            name: format!("dock-{}", id),
            description: String::new(),
            driver_name: "sample".into(),
            endpoint: "127.0.0.1:50050".into(),
            node_id: "host-1".into(),
            dock_type: Default::default(),
            metadata: Default::default(),
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_profiles_and_default() {
        let store = MemoryStore::new();
        assert_matches!(
            store.get_default_profile().await,
            Err(Error::ResourceNotFound { .. })
        );

        let default = store.create_profile(ProfileSpec::new("default")).await.unwrap();
        assert!(!default.id.is_empty());
        store.create_profile(ProfileSpec::new("gold")).await.unwrap();

        assert_eq!(store.get_default_profile().await.unwrap().id, default.id);
        assert_eq!(store.list_profiles().await.unwrap().len(), 2);
        assert_matches!(
            store.create_profile(ProfileSpec::new("default")).await,
            Err(Error::ResourceExists { .. })
        );
    }

    #[tokio::test]
    async fn test_pool_upsert_keeps_order() {
        let store = MemoryStore::new();
        for id in ["p1", "p2", "p3"] {
            let mut pool = StoragePoolSpec::new(id, 100, 100);
            pool.id = id.into();
            store.create_pool(pool).await.unwrap();
        }

        let mut updated = StoragePoolSpec::new("p1", 100, 40);
        updated.id = "p1".into();
        let stored = store.create_pool(updated).await.unwrap();
        assert!(stored.updated_at.is_some());
        assert!(stored.created_at.is_some());

        let pools = store.list_pools().await.unwrap();
        let ids: Vec<_> = pools.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2", "p3"]);
        assert_eq!(pools[0].free_capacity, 40);
        assert_eq!(store.pool_count(), 3);
    }

    #[tokio::test]
    async fn test_dock_by_pool() {
        let store = MemoryStore::new();
        store.create_dock(dock("d1")).await.unwrap();

        let mut pool = StoragePoolSpec::new("p", 10, 10);
        pool.id = "p".into();
        pool.dock_id = "d1".into();
        store.create_pool(pool).await.unwrap();

        assert_eq!(store.get_dock_by_pool_id("p").await.unwrap().id, "d1");
        assert_matches!(
            store.get_dock_by_pool_id("nope").await,
            Err(Error::ResourceNotFound { .. })
        );

        store.delete_dock("d1").await.unwrap();
        assert_matches!(
            store.get_dock_by_pool_id("p").await,
            Err(Error::DockNotFound { .. })
        );
    }

    #[tokio::test]
    async fn test_resource_lifecycle() {
        let store = MemoryStore::new();
        let vol = ResourceSpec::new(ResourceKind::Volume, "vol", 1);
        let id = vol.id.clone();
        store.create_resource(vol.clone()).await.unwrap();
        assert_matches!(
            store.create_resource(vol).await,
            Err(Error::ResourceExists { .. })
        );

        // Kinds are separate namespaces
        assert_matches!(
            store.get_resource(ResourceKind::FileShare, &id).await,
            Err(Error::ResourceNotFound { .. })
        );

        store
            .update_status(ResourceKind::Volume, &id, ResourceStatus::Available)
            .await
            .unwrap();
        let got = store.get_resource(ResourceKind::Volume, &id).await.unwrap();
        assert_eq!(got.status, ResourceStatus::Available);
        assert!(got.updated_at.is_some());

        assert_eq!(store.list_resources(ResourceKind::Volume).await.unwrap().len(), 1);
        assert!(store.list_resources(ResourceKind::FileShare).await.unwrap().is_empty());

        store.delete_resource(ResourceKind::Volume, &id).await.unwrap();
        assert_matches!(
            store.update_status(ResourceKind::Volume, &id, ResourceStatus::Error).await,
            Err(Error::ResourceNotFound { .. })
        );
    }
}
