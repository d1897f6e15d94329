//! Storage Drivers
//!
//! Drivers are looked up by the driver name a dock carries. The factory maps
//! driver names to constructors; the registry holds the live instances.

pub mod sample;

pub use sample::*;

use crate::config::{BackendConfig, ControllerConfig};
use crate::domain::ports::StorageDriverRef;
use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{info, warn};

/// Builds a driver from its backend section
pub type DriverConstructor = fn(&BackendConfig) -> Result<StorageDriverRef>;

// =============================================================================
// Driver Factory
// =============================================================================

/// Constructor table keyed by driver name
#[derive(Clone)]
pub struct DriverFactory {
    constructors: HashMap<String, DriverConstructor>,
}

impl Default for DriverFactory {
    fn default() -> Self {
        let mut factory = Self::new();
        factory.register(SAMPLE_DRIVER_NAME, |config| {
            Ok(Arc::new(SampleDriver::new(config)) as StorageDriverRef)
        });
        factory
    }
}

impl DriverFactory {
    /// Empty factory; `default()` knows the built-in drivers
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    pub fn register(&mut self, driver_name: impl Into<String>, constructor: DriverConstructor) {
        self.constructors.insert(driver_name.into(), constructor);
    }

    /// Create the driver a backend section asks for
    pub fn create(&self, config: &BackendConfig) -> Result<StorageDriverRef> {
        let constructor = self
            .constructors
            .get(&config.driver_name)
            .ok_or_else(|| Error::DriverNotFound {
                driver: config.driver_name.clone(),
            })?;
        constructor(config)
    }
}

// =============================================================================
// Driver Registry
// =============================================================================

/// Live drivers keyed by driver name
#[derive(Default)]
pub struct DriverRegistry {
    drivers: RwLock<HashMap<String, StorageDriverRef>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate the drivers of every enabled backend.
    ///
    /// Backends without a section, a name or a known driver are skipped; their
    /// docks then fail discovery.
    pub fn from_config(factory: &DriverFactory, config: &ControllerConfig) -> Self {
        let registry = Self::new();

        for name in &config.enabled_backends {
            let Some(backend) = config.backend(name).filter(|b| !b.name.is_empty()) else {
                warn!(backend = %name, "Enabled backend has no configuration, skipping");
                continue;
            };
            if registry.contains(&backend.driver_name) {
                continue;
            }
            match factory.create(backend) {
                Ok(driver) => registry.register(driver),
                Err(e) => warn!(backend = %name, error = %e, "Failed to create driver"),
            }
        }

        info!(drivers = ?registry.names(), "Driver registry initialized");
        registry
    }

    pub fn register(&self, driver: StorageDriverRef) {
        self.drivers
            .write()
            .insert(driver.driver_name().to_string(), driver);
    }

    pub fn contains(&self, driver_name: &str) -> bool {
        self.drivers.read().contains_key(driver_name)
    }

    /// Driver registered under `driver_name`
    pub fn get(&self, driver_name: &str) -> Result<StorageDriverRef> {
        self.drivers
            .read()
            .get(driver_name)
            .cloned()
            .ok_or_else(|| Error::DriverNotFound {
                driver: driver_name.to_string(),
            })
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.drivers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Health of every registered driver; a failing check reports unhealthy
    pub async fn health(&self) -> BTreeMap<String, bool> {
        let drivers: Vec<_> = self.drivers.read().values().cloned().collect();
        let mut health = BTreeMap::new();
        for driver in drivers {
            let healthy = driver.health_check().await.unwrap_or(false);
            health.insert(driver.driver_name().to_string(), healthy);
        }
        health
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_unknown_driver() {
        let factory = DriverFactory::default();
        let backend = BackendConfig {
            name: "ceph".into(),
            driver_name: "ceph".into(),
            ..Default::default()
        };
        assert!(matches!(
            factory.create(&backend),
            Err(Error::DriverNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_registry_from_config() {
        let mut config = ControllerConfig::default();
        config.enabled_backends.push("ceph".into());
        config.enabled_backends.push("missing".into());
        config.backends.insert(
            "ceph".into(),
            BackendConfig {
                name: "ceph".into(),
                driver_name: "ceph".into(),
                ..Default::default()
            },
        );

        let registry = DriverRegistry::from_config(&DriverFactory::default(), &config);
        assert_eq!(registry.names(), vec!["sample"]);
        assert!(registry.get("sample").is_ok());
        assert!(matches!(
            registry.get("ceph"),
            Err(Error::DriverNotFound { .. })
        ));

        let health = registry.health().await;
        assert_eq!(health.get("sample"), Some(&true));
    }
}
