//! Controller Configuration
//!
//! Dock and backend settings loaded from a YAML file. Every section has an
//! in-code default so the service starts with a single sample backend when
//! no file is given.

use crate::error::{Error, Result};
use crate::model::{StoragePoolExtraSpec, StorageType, DEFAULT_AVAILABILITY_ZONE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Default discovery sweep interval in seconds
pub const DEFAULT_DISCOVERY_INTERVAL_SECS: u64 = 60;

// =============================================================================
// Sections
// =============================================================================

/// Settings of the dock service running on this host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DockConfig {
    /// Endpoint the dock service is reachable at
    pub api_endpoint: String,
    /// Recorded on each dock as `HostReplicationDriver`
    pub host_based_replication_driver: String,
    /// Overrides hostname detection
    pub hostname: Option<String>,
}

impl Default for DockConfig {
    fn default() -> Self {
        Self {
            api_endpoint: "127.0.0.1:50050".to_string(),
            host_based_replication_driver: "drbd".to_string(),
            hostname: None,
        }
    }
}

/// A pool served by the in-process sample driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolConfig {
    pub name: String,
    #[serde(default)]
    pub storage_type: StorageType,
    #[serde(default = "default_zone")]
    pub availability_zone: String,
    pub total_capacity: u64,
    pub free_capacity: u64,
    #[serde(default)]
    pub extras: StoragePoolExtraSpec,
}

/// One storage backend section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackendConfig {
    /// Dock name; backends without one are not served
    pub name: String,
    pub description: String,
    /// Driver used to reach the backend
    pub driver_name: String,
    /// Backend API endpoint; seeds the ids of the backend's pools
    pub endpoint: String,
    /// Pools reported by the sample driver
    pub pools: Vec<PoolConfig>,
}

impl BackendConfig {
    /// Endpoint seeding pool ids, the backend name when none is configured
    pub fn pool_endpoint(&self) -> &str {
        if self.endpoint.is_empty() {
            &self.name
        } else {
            &self.endpoint
        }
    }
}

/// Discovery loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiscoveryConfig {
    pub interval_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_DISCOVERY_INTERVAL_SECS,
        }
    }
}

impl DiscoveryConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

// =============================================================================
// Controller Configuration
// =============================================================================

/// Top-level configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControllerConfig {
    pub dock: DockConfig,
    /// Backend sections served by this host, in order
    pub enabled_backends: Vec<String>,
    pub backends: BTreeMap<String, BackendConfig>,
    pub discovery: DiscoveryConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        let mut thin = StoragePoolExtraSpec::default();
        thin.data_storage.provisioning_policy = Some(crate::model::ProvisioningPolicy::Thin);
        thin.data_storage.is_space_efficient = true;
        thin.io_connectivity.access_protocol = "iscsi".to_string();
        thin.io_connectivity.max_iops = 7000;
        thin.io_connectivity.max_bws = 600;

        let mut thick = StoragePoolExtraSpec::default();
        thick.data_storage.provisioning_policy = Some(crate::model::ProvisioningPolicy::Thick);
        thick.io_connectivity.access_protocol = "nfs".to_string();
        thick.io_connectivity.max_iops = 3000;
        thick.io_connectivity.max_bws = 300;

        let sample = BackendConfig {
            name: "sample".to_string(),
            description: "In-process sample backend".to_string(),
            driver_name: "sample".to_string(),
            endpoint: "sample://127.0.0.1".to_string(),
            pools: vec![
                PoolConfig {
                    name: "sample-pool-01".to_string(),
                    storage_type: StorageType::Block,
                    availability_zone: default_zone(),
                    total_capacity: 100,
                    free_capacity: 100,
                    extras: thin,
                },
                PoolConfig {
                    name: "sample-pool-02".to_string(),
                    storage_type: StorageType::File,
                    availability_zone: default_zone(),
                    total_capacity: 200,
                    free_capacity: 200,
                    extras: thick,
                },
            ],
        };

        let mut backends = BTreeMap::new();
        backends.insert("sample".to_string(), sample);

        Self {
            dock: DockConfig::default(),
            enabled_backends: vec!["sample".to_string()],
            backends,
            discovery: DiscoveryConfig::default(),
        }
    }
}

impl ControllerConfig {
    /// Parse a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&raw)?;
        info!(
            path = %path.display(),
            backends = config.enabled_backends.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Backend section for an enabled backend name
    pub fn backend(&self, name: &str) -> Option<&BackendConfig> {
        self.backends.get(name)
    }

    fn validate(&self) -> Result<()> {
        if self.discovery.interval_secs == 0 {
            return Err(Error::Configuration(
                "discovery interval must be at least one second".into(),
            ));
        }
        for (key, backend) in &self.backends {
            if !backend.name.is_empty() && backend.driver_name.is_empty() {
                return Err(Error::Configuration(format!(
                    "backend {} has no driver name",
                    key
                )));
            }
        }
        Ok(())
    }
}

fn default_zone() -> String {
    DEFAULT_AVAILABILITY_ZONE.to_string()
}
