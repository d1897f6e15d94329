//! Dock Discoverer
//!
//! Builds the docks this host serves from configuration, polls each dock's
//! driver for its pools and registers docks and pools with the store. The
//! discovery loop repeats the sweep until it is cancelled.

use super::identity;
use super::register::{DockRegister, Registrable};
use crate::config::ControllerConfig;
use crate::controlplane::backends::DriverRegistry;
use crate::domain::PersistenceClientRef;
use crate::error::{Error, Result};
use crate::metrics::Metrics;
use crate::model::{DockSpec, DockType, StoragePoolSpec, HOST_REPLICATION_DRIVER_KEY};
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

// =============================================================================
// Discoverer Trait
// =============================================================================

/// A discoverer for one dock type
#[async_trait]
pub trait DockDiscoverer: Send + Sync {
    /// Build the dock records from configuration
    async fn init(&mut self) -> Result<()>;

    /// Replace the pool snapshot with a fresh poll of every dock
    async fn discover(&mut self) -> Result<()>;

    /// Register the docks and the current pool snapshot
    async fn report(&self) -> Result<()>;

    fn docks(&self) -> &[DockSpec];

    fn pools(&self) -> &[StoragePoolSpec];
}

/// Services a discoverer is built from
#[derive(Clone)]
pub struct DiscovererDeps {
    pub config: Arc<ControllerConfig>,
    pub drivers: Arc<DriverRegistry>,
    pub store: PersistenceClientRef,
}

// =============================================================================
// Provision Dock Discoverer
// =============================================================================

/// Discoverer for provisioner docks, one per enabled backend
pub struct ProvisionDockDiscoverer {
    config: Arc<ControllerConfig>,
    drivers: Arc<DriverRegistry>,
    register: DockRegister,
    host: String,
    docks: Vec<DockSpec>,
    pools: Vec<StoragePoolSpec>,
    /// Backend endpoint of each dock, keyed by dock id
    backend_endpoints: HashMap<String, String>,
    /// Docks whose driver answered during the last sweep
    listed: HashSet<String>,
}

impl ProvisionDockDiscoverer {
    pub fn new(deps: DiscovererDeps) -> Self {
        let host = identity::hostname(deps.config.dock.hostname.as_deref());
        Self {
            config: deps.config,
            drivers: deps.drivers,
            register: DockRegister::new(deps.store),
            host,
            docks: Vec::new(),
            pools: Vec::new(),
            backend_endpoints: HashMap::new(),
            listed: HashSet::new(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    async fn list_dock_pools(&self, dock: &DockSpec) -> Result<Vec<StoragePoolSpec>> {
        let driver = self.drivers.get(&dock.driver_name)?;
        driver.list_pools().await.map_err(|e| Error::BackendList {
            backend: dock.name.clone(),
            reason: e.to_string(),
        })
    }

    /// Drop registered pools of answering docks that the last sweep no
    /// longer reported
    async fn prune_stale_pools(&self) -> Result<()> {
        let current: HashSet<&str> = self.pools.iter().map(|p| p.id.as_str()).collect();
        for pool in self.register.registered_pools().await? {
            if self.listed.contains(&pool.dock_id) && !current.contains(pool.id.as_str()) {
                info!(pool = %pool.name, id = %pool.id, "Unregistering vanished pool");
                self.register.unregister(&Registrable::Pool(pool)).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DockDiscoverer for ProvisionDockDiscoverer {
    async fn init(&mut self) -> Result<()> {
        self.docks.clear();
        self.backend_endpoints.clear();

        for name in &self.config.enabled_backends {
            let Some(backend) = self.config.backend(name).filter(|b| !b.name.is_empty()) else {
                warn!(backend = %name, "Enabled backend has no configuration, skipping");
                continue;
            };

            let mut metadata = BTreeMap::new();
            metadata.insert(
                HOST_REPLICATION_DRIVER_KEY.to_string(),
                self.config.dock.host_based_replication_driver.clone(),
            );

            let id = identity::dock_id(&self.host, &backend.driver_name);
            self.backend_endpoints
                .insert(id.clone(), backend.pool_endpoint().to_string());

            self.docks.push(DockSpec {
                id,
                name: backend.name.clone(),
                description: backend.description.clone(),
                driver_name: backend.driver_name.clone(),
                endpoint: self.config.dock.api_endpoint.clone(),
                node_id: self.host.clone(),
                dock_type: DockType::Provisioner,
                metadata,
                created_at: None,
                updated_at: None,
            });
        }

        info!(host = %self.host, docks = self.docks.len(), "Provision discoverer initialized");
        Ok(())
    }

    async fn discover(&mut self) -> Result<()> {
        self.pools.clear();
        self.listed.clear();

        let listings = join_all(self.docks.iter().map(|dock| self.list_dock_pools(dock))).await;

        let mut discovered = Vec::new();
        for (dock, listing) in self.docks.iter().zip(listings) {
            let pools = match listing {
                Ok(pools) => pools,
                Err(e) => {
                    warn!(dock = %dock.name, error = %e, "Failed to list pools of dock");
                    continue;
                }
            };
            self.listed.insert(dock.id.clone());

            if pools.is_empty() {
                warn!(dock = %dock.name, "The pool of dock {} is empty", dock.name);
            }

            let endpoint = self
                .backend_endpoints
                .get(&dock.id)
                .map_or(dock.name.as_str(), String::as_str);
            for mut pool in pools {
                pool.id = identity::pool_id(&self.host, endpoint, &pool.name);
                pool.dock_id = dock.id.clone();
                if pool.availability_zone.is_empty() {
                    pool.availability_zone = crate::model::DEFAULT_AVAILABILITY_ZONE.to_string();
                }
                debug!(pool = %pool.name, id = %pool.id, dock = %dock.name, "Discovered pool");
                discovered.push(pool);
            }
        }

        if discovered.is_empty() {
            return Err(Error::NoPoolDiscovered {
                docks: self.docks.len(),
            });
        }

        self.pools = discovered;
        Ok(())
    }

    async fn report(&self) -> Result<()> {
        for dock in &self.docks {
            self.register.register(Registrable::Dock(dock.clone())).await?;
        }
        for pool in &self.pools {
            self.register.register(Registrable::Pool(pool.clone())).await?;
        }
        self.prune_stale_pools().await
    }

    fn docks(&self) -> &[DockSpec] {
        &self.docks
    }

    fn pools(&self) -> &[StoragePoolSpec] {
        &self.pools
    }
}

// =============================================================================
// Discoverer Registry
// =============================================================================

/// Builds a discoverer from its dependencies
pub type DiscovererConstructor =
    Box<dyn Fn(DiscovererDeps) -> Box<dyn DockDiscoverer> + Send + Sync>;

/// Constructor table keyed by dock type
pub struct DiscovererRegistry {
    constructors: BTreeMap<DockType, DiscovererConstructor>,
}

impl Default for DiscovererRegistry {
    fn default() -> Self {
        let mut registry = Self {
            constructors: BTreeMap::new(),
        };
        registry.register(
            DockType::Provisioner,
            Box::new(|deps: DiscovererDeps| {
                Box::new(ProvisionDockDiscoverer::new(deps)) as Box<dyn DockDiscoverer>
            }),
        );
        registry
    }
}

impl DiscovererRegistry {
    pub fn register(&mut self, dock_type: DockType, constructor: DiscovererConstructor) {
        self.constructors.insert(dock_type, constructor);
    }

    pub fn create(&self, dock_type: DockType, deps: DiscovererDeps) -> Result<Box<dyn DockDiscoverer>> {
        let constructor = self.constructors.get(&dock_type).ok_or_else(|| {
            Error::Configuration(format!("no discoverer for dock type {}", dock_type))
        })?;
        Ok(constructor(deps))
    }
}

// =============================================================================
// Discovery Loop
// =============================================================================

/// Controls of a running discovery loop
#[derive(Clone)]
pub struct DiscoveryContext {
    /// Observed between sweeps
    pub stop: CancellationToken,
    /// Receives report failures; the loop keeps running
    pub errors: mpsc::Sender<Error>,
    pub interval: Duration,
    pub metrics: Arc<Metrics>,
}

/// Initialize `discoverer`, then discover and report every interval until
/// cancelled. A sweep that finds no pool at all ends the loop with that
/// error.
pub async fn discovery_and_report(
    mut discoverer: Box<dyn DockDiscoverer>,
    ctx: DiscoveryContext,
) -> Result<()> {
    discoverer.init().await?;

    loop {
        if ctx.stop.is_cancelled() {
            info!("Discovery loop stopped");
            return Ok(());
        }

        if let Err(e) = discoverer.discover().await {
            error!(error = %e, "Discovery failed");
            ctx.metrics.discovery_sweeps.with_label_values(&["no_pool"]).inc();
            return Err(e);
        }
        ctx.metrics
            .pools_discovered
            .set(discoverer.pools().len() as i64);

        match discoverer.report().await {
            Ok(()) => {
                debug!(
                    docks = discoverer.docks().len(),
                    pools = discoverer.pools().len(),
                    "Discovery sweep reported"
                );
                ctx.metrics.discovery_sweeps.with_label_values(&["ok"]).inc();
            }
            Err(e) => {
                warn!(error = %e, "Failed to report discovery results");
                ctx.metrics
                    .discovery_sweeps
                    .with_label_values(&["report_failed"])
                    .inc();
                if let Err(send_err) = ctx.errors.try_send(e) {
                    debug!(error = %send_err, "Dropped discovery report error");
                }
            }
        }

        tokio::select! {
            _ = ctx.stop.cancelled() => {
                info!("Discovery loop stopped");
                return Ok(());
            }
            _ = tokio::time::sleep(ctx.interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;
    use crate::domain::{PersistenceClient, StorageDriver};
    use crate::model::{CreateOpts, DeleteOpts, DriverResult, ExtendOpts};
    use crate::store::MemoryStore;
    use assert_matches::assert_matches;
    use parking_lot::Mutex;

    /// Driver returning a scripted pool listing
    struct ScriptedDriver {
        name: String,
        pools: Mutex<Result<Vec<StoragePoolSpec>>>,
    }

    impl ScriptedDriver {
        fn new(name: &str, pools: Result<Vec<StoragePoolSpec>>) -> Arc<Self> {
            Arc::new(Self {
                name: name.into(),
                pools: Mutex::new(pools),
            })
        }

        fn set(&self, pools: Result<Vec<StoragePoolSpec>>) {
            *self.pools.lock() = pools;
        }
    }

    #[async_trait]
    impl StorageDriver for ScriptedDriver {
        fn driver_name(&self) -> &str {
            &self.name
        }

        async fn list_pools(&self) -> Result<Vec<StoragePoolSpec>> {
            match &*self.pools.lock() {
                Ok(pools) => Ok(pools.clone()),
                Err(e) => Err(Error::Internal(e.to_string())),
            }
        }

        async fn create_volume(&self, _: &CreateOpts) -> Result<DriverResult> {
            Ok(DriverResult::default())
        }

        async fn delete_volume(&self, _: &DeleteOpts) -> Result<()> {
            Ok(())
        }

        async fn extend_volume(&self, _: &ExtendOpts) -> Result<DriverResult> {
            Ok(DriverResult::default())
        }

        async fn create_file_share(&self, _: &CreateOpts) -> Result<DriverResult> {
            Ok(DriverResult::default())
        }

        async fn delete_file_share(&self, _: &DeleteOpts) -> Result<()> {
            Ok(())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
    }

    fn pools(names: &[&str]) -> Vec<StoragePoolSpec> {
        names.iter().map(|n| StoragePoolSpec::new(*n, 100, 100)).collect()
    }

    fn config(backends: &[&str]) -> ControllerConfig {
        let mut config = ControllerConfig {
            enabled_backends: backends.iter().map(|b| b.to_string()).collect(),
            ..Default::default()
        };
        config.dock.hostname = Some("host-1".into());
        config.backends.clear();
        for b in backends {
            config.backends.insert(
                b.to_string(),
                BackendConfig {
                    name: b.to_string(),
                    driver_name: b.to_string(),
                    ..Default::default()
                },
            );
        }
        config
    }

    fn deps(config: ControllerConfig, drivers: DriverRegistry, store: Arc<MemoryStore>) -> DiscovererDeps {
        DiscovererDeps {
            config: Arc::new(config),
            drivers: Arc::new(drivers),
            store,
        }
    }

    #[tokio::test]
    async fn test_one_backend_fails_other_reports() {
        let drivers = DriverRegistry::new();
        drivers.register(ScriptedDriver::new(
            "broken",
            Err(Error::Internal("connection refused".into())),
        ));
        drivers.register(ScriptedDriver::new("lvm", Ok(pools(&["a", "b", "c"]))));

        let store = Arc::new(MemoryStore::new());
        let mut discoverer =
            ProvisionDockDiscoverer::new(deps(config(&["broken", "lvm"]), drivers, store.clone()));
        discoverer.init().await.unwrap();
        assert_eq!(discoverer.docks().len(), 2);

        discoverer.discover().await.unwrap();
        assert_eq!(discoverer.pools().len(), 3);

        let lvm_dock = &discoverer.docks()[1];
        for pool in discoverer.pools() {
            assert_eq!(pool.dock_id, lvm_dock.id);
            assert_eq!(pool.id, identity::pool_id("host-1", "lvm", &pool.name));
            assert_eq!(pool.availability_zone, "default");
        }

        discoverer.report().await.unwrap();
        assert_eq!(store.list_docks().await.unwrap().len(), 2);
        let names: Vec<_> = store
            .list_pools()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_same_pool_name_on_two_backends() {
        let drivers = DriverRegistry::new();
        drivers.register(ScriptedDriver::new("lvm", Ok(pools(&["pool-1"]))));
        drivers.register(ScriptedDriver::new("ceph", Ok(pools(&["pool-1"]))));

        let mut config = config(&["lvm", "ceph"]);
        if let Some(lvm) = config.backends.get_mut("lvm") {
            lvm.endpoint = "10.0.0.7:8088".into();
        }
        if let Some(ceph) = config.backends.get_mut("ceph") {
            ceph.endpoint = "10.0.0.8:6789".into();
        }

        let store = Arc::new(MemoryStore::new());
        let mut discoverer = ProvisionDockDiscoverer::new(deps(config, drivers, store.clone()));
        discoverer.init().await.unwrap();
        discoverer.discover().await.unwrap();

        let discovered = discoverer.pools();
        assert_eq!(discovered.len(), 2);
        assert_eq!(
            discovered[0].id,
            identity::pool_id("host-1", "10.0.0.7:8088", "pool-1")
        );
        assert_eq!(
            discovered[1].id,
            identity::pool_id("host-1", "10.0.0.8:6789", "pool-1")
        );
        assert_ne!(discovered[0].id, discovered[1].id);

        discoverer.report().await.unwrap();
        let stored = store.list_pools().await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].dock_id, discoverer.docks()[0].id);
        assert_eq!(stored[1].dock_id, discoverer.docks()[1].id);
    }

    #[tokio::test]
    async fn test_ids_stable_across_sweeps() {
        let drivers = DriverRegistry::new();
        drivers.register(ScriptedDriver::new("lvm", Ok(pools(&["a"]))));
        let store = Arc::new(MemoryStore::new());
        let mut discoverer =
            ProvisionDockDiscoverer::new(deps(config(&["lvm"]), drivers, store.clone()));
        discoverer.init().await.unwrap();

        discoverer.discover().await.unwrap();
        discoverer.report().await.unwrap();
        let first = store.list_pools().await.unwrap();

        discoverer.discover().await.unwrap();
        discoverer.report().await.unwrap();
        let second = store.list_pools().await.unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, second[0].id);
        assert_eq!(second.len(), 1);
    }

    #[tokio::test]
    async fn test_all_backends_fail() {
        let drivers = DriverRegistry::new();
        drivers.register(ScriptedDriver::new("lvm", Ok(Vec::new())));
        let store = Arc::new(MemoryStore::new());
        // "ceph" has no driver, "lvm" reports nothing
        let mut discoverer =
            ProvisionDockDiscoverer::new(deps(config(&["ceph", "lvm"]), drivers, store));
        discoverer.init().await.unwrap();

        assert_matches!(
            discoverer.discover().await,
            Err(Error::NoPoolDiscovered { docks: 2 })
        );
        assert!(discoverer.pools().is_empty());
    }

    #[tokio::test]
    async fn test_vanished_pools_are_unregistered() {
        let drivers = DriverRegistry::new();
        let lvm = ScriptedDriver::new("lvm", Ok(pools(&["a", "b"])));
        drivers.register(lvm.clone());
        let store = Arc::new(MemoryStore::new());
        let mut discoverer =
            ProvisionDockDiscoverer::new(deps(config(&["lvm"]), drivers, store.clone()));
        discoverer.init().await.unwrap();

        discoverer.discover().await.unwrap();
        discoverer.report().await.unwrap();
        assert_eq!(store.list_pools().await.unwrap().len(), 2);

        lvm.set(Ok(pools(&["b"])));
        discoverer.discover().await.unwrap();
        discoverer.report().await.unwrap();
        let remaining = store.list_pools().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "b");
    }

    #[tokio::test]
    async fn test_unknown_backend_skipped_at_init() {
        let mut config = config(&["lvm"]);
        config.enabled_backends.push("ghost".into());
        let store = Arc::new(MemoryStore::new());
        let mut discoverer = ProvisionDockDiscoverer::new(deps(config, DriverRegistry::new(), store));
        discoverer.init().await.unwrap();

        assert_eq!(discoverer.docks().len(), 1);
        let dock = &discoverer.docks()[0];
        assert_eq!(dock.node_id, "host-1");
        assert_eq!(dock.dock_type, DockType::Provisioner);
        assert_eq!(dock.metadata[HOST_REPLICATION_DRIVER_KEY], "drbd");
        assert_eq!(dock.id, identity::dock_id("host-1", "lvm"));
    }

    #[tokio::test]
    async fn test_registry_unknown_dock_type() {
        let registry = DiscovererRegistry::default();
        let d = deps(config(&[]), DriverRegistry::new(), Arc::new(MemoryStore::new()));
        assert!(registry.create(DockType::Provisioner, d.clone()).is_ok());
        assert!(matches!(
            registry.create(DockType::Attacher, d),
            Err(Error::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_loop_stops_on_cancel() {
        let drivers = DriverRegistry::new();
        drivers.register(ScriptedDriver::new("lvm", Ok(pools(&["a"]))));
        let store = Arc::new(MemoryStore::new());
        let discoverer = DiscovererRegistry::default()
            .create(
                DockType::Provisioner,
                deps(config(&["lvm"]), drivers, store.clone()),
            )
            .unwrap();

        let (tx, _rx) = mpsc::channel(4);
        let ctx = DiscoveryContext {
            stop: CancellationToken::new(),
            errors: tx,
            interval: Duration::from_millis(10),
            metrics: Arc::new(Metrics::new().unwrap()),
        };
        let stop = ctx.stop.clone();
        let metrics = ctx.metrics.clone();
        let handle = tokio::spawn(discovery_and_report(discoverer, ctx));

        tokio::time::sleep(Duration::from_millis(50)).await;
        stop.cancel();
        handle.await.unwrap().unwrap();

        assert_eq!(store.list_pools().await.unwrap().len(), 1);
        assert!(metrics.discovery_sweeps.with_label_values(&["ok"]).get() >= 1);
        assert_eq!(metrics.pools_discovered.get(), 1);
    }

    /// Store rejecting every write
    struct ReadOnlyStore(MemoryStore);

    #[async_trait]
    impl PersistenceClient for ReadOnlyStore {
        async fn create_profile(&self, p: crate::model::ProfileSpec) -> Result<crate::model::ProfileSpec> {
            self.0.create_profile(p).await
        }
        async fn get_profile(&self, id: &str) -> Result<crate::model::ProfileSpec> {
            self.0.get_profile(id).await
        }
        async fn get_default_profile(&self) -> Result<crate::model::ProfileSpec> {
            self.0.get_default_profile().await
        }
        async fn list_profiles(&self) -> Result<Vec<crate::model::ProfileSpec>> {
            self.0.list_profiles().await
        }
        async fn create_dock(&self, _: DockSpec) -> Result<DockSpec> {
            Err(Error::Internal("store is read-only".into()))
        }
        async fn get_dock(&self, id: &str) -> Result<DockSpec> {
            self.0.get_dock(id).await
        }
        async fn get_dock_by_pool_id(&self, id: &str) -> Result<DockSpec> {
            self.0.get_dock_by_pool_id(id).await
        }
        async fn list_docks(&self) -> Result<Vec<DockSpec>> {
            self.0.list_docks().await
        }
        async fn delete_dock(&self, id: &str) -> Result<()> {
            self.0.delete_dock(id).await
        }
        async fn create_pool(&self, _: StoragePoolSpec) -> Result<StoragePoolSpec> {
            Err(Error::Internal("store is read-only".into()))
        }
        async fn get_pool(&self, id: &str) -> Result<StoragePoolSpec> {
            self.0.get_pool(id).await
        }
        async fn list_pools(&self) -> Result<Vec<StoragePoolSpec>> {
            self.0.list_pools().await
        }
        async fn delete_pool(&self, id: &str) -> Result<()> {
            self.0.delete_pool(id).await
        }
        async fn create_resource(&self, r: crate::model::ResourceSpec) -> Result<crate::model::ResourceSpec> {
            self.0.create_resource(r).await
        }
        async fn get_resource(&self, k: crate::model::ResourceKind, id: &str) -> Result<crate::model::ResourceSpec> {
            self.0.get_resource(k, id).await
        }
        async fn list_resources(&self, k: crate::model::ResourceKind) -> Result<Vec<crate::model::ResourceSpec>> {
            self.0.list_resources(k).await
        }
        async fn update_resource(&self, r: crate::model::ResourceSpec) -> Result<crate::model::ResourceSpec> {
            self.0.update_resource(r).await
        }
        async fn update_status(
            &self,
            k: crate::model::ResourceKind,
            id: &str,
            s: crate::model::ResourceStatus,
        ) -> Result<()> {
            self.0.update_status(k, id, s).await
        }
        async fn delete_resource(&self, k: crate::model::ResourceKind, id: &str) -> Result<()> {
            self.0.delete_resource(k, id).await
        }
    }

    #[tokio::test]
    async fn test_report_errors_are_sent_and_loop_continues() {
        let drivers = DriverRegistry::new();
        drivers.register(ScriptedDriver::new("lvm", Ok(pools(&["a"]))));
        let discoverer = Box::new(ProvisionDockDiscoverer::new(DiscovererDeps {
            config: Arc::new(config(&["lvm"])),
            drivers: Arc::new(drivers),
            store: Arc::new(ReadOnlyStore(MemoryStore::new())),
        }));

        let (tx, mut rx) = mpsc::channel(8);
        let ctx = DiscoveryContext {
            stop: CancellationToken::new(),
            errors: tx,
            interval: Duration::from_millis(5),
            metrics: Arc::new(Metrics::new().unwrap()),
        };
        let stop = ctx.stop.clone();
        let handle = tokio::spawn(discovery_and_report(discoverer, ctx));

        // Two failed reports prove the loop survived the first
        assert_matches!(rx.recv().await, Some(Error::Internal(_)));
        assert_matches!(rx.recv().await, Some(Error::Internal(_)));

        stop.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_loop_ends_when_nothing_discovered() {
        let store = Arc::new(MemoryStore::new());
        let discoverer = Box::new(ProvisionDockDiscoverer::new(deps(
            config(&["lvm"]),
            DriverRegistry::new(),
            store,
        )));

        let (tx, _rx) = mpsc::channel(4);
        let ctx = DiscoveryContext {
            stop: CancellationToken::new(),
            errors: tx,
            interval: Duration::from_secs(60),
            metrics: Arc::new(Metrics::new().unwrap()),
        };
        assert_matches!(
            discovery_and_report(discoverer, ctx).await,
            Err(Error::NoPoolDiscovered { .. })
        );
    }
}
