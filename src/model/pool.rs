//! Storage Pool Records
//!
//! A pool is one physical or logical capacity pool on one backend, as
//! reported by a driver and registered by discovery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Availability zone assumed when neither pool nor request names one
pub const DEFAULT_AVAILABILITY_ZONE: &str = "default";

// =============================================================================
// Storage Types
// =============================================================================

/// Storage types a pool can serve
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    #[default]
    Block,
    File,
    Object,
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageType::Block => write!(f, "block"),
            StorageType::File => write!(f, "file"),
            StorageType::Object => write!(f, "object"),
        }
    }
}

/// Thin or thick allocation of pool capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProvisioningPolicy {
    Thin,
    Thick,
}

impl std::fmt::Display for ProvisioningPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProvisioningPolicy::Thin => write!(f, "Thin"),
            ProvisioningPolicy::Thick => write!(f, "Thick"),
        }
    }
}

// =============================================================================
// Extra Capability Spec
// =============================================================================

/// Data storage capabilities of a pool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStorage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_policy: Option<ProvisioningPolicy>,
    #[serde(default)]
    pub is_space_efficient: bool,
    /// Recovery time objective in seconds
    #[serde(default)]
    pub recovery_time_objective: u64,
}

/// IO connectivity capabilities of a pool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IoConnectivity {
    #[serde(default)]
    pub access_protocol: String,
    #[serde(default, rename = "maxIOPS")]
    pub max_iops: u64,
    #[serde(default, rename = "maxBWS")]
    pub max_bws: u64,
}

/// Capability spec advertised by a pool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoragePoolExtraSpec {
    #[serde(default)]
    pub data_storage: DataStorage,
    #[serde(default)]
    pub io_connectivity: IoConnectivity,
    /// Vendor-specific attributes, opaque to the control plane
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub advanced: BTreeMap<String, serde_json::Value>,
}

// =============================================================================
// Storage Pool
// =============================================================================

/// One capacity pool on one backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoragePoolSpec {
    /// Stable id derived from host, backend endpoint and pool name
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Dock owning this pool
    #[serde(default)]
    pub dock_id: String,
    #[serde(default)]
    pub storage_type: StorageType,
    #[serde(default = "default_availability_zone")]
    pub availability_zone: String,
    /// Total capacity in GiB
    #[serde(default)]
    pub total_capacity: u64,
    /// Free capacity in GiB
    #[serde(default)]
    pub free_capacity: u64,
    #[serde(default)]
    pub extras: StoragePoolExtraSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoragePoolSpec {
    /// Create a pool with the given name and capacity, everything else defaulted
    pub fn new(name: impl Into<String>, total_capacity: u64, free_capacity: u64) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            description: String::new(),
            dock_id: String::new(),
            storage_type: StorageType::default(),
            availability_zone: default_availability_zone(),
            total_capacity,
            free_capacity,
            extras: StoragePoolExtraSpec::default(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Percentage of total capacity in use
    pub fn utilization_percent(&self) -> u32 {
        if self.total_capacity == 0 {
            return 0;
        }
        let used = self.total_capacity.saturating_sub(self.free_capacity);
        ((used as f64 / self.total_capacity as f64) * 100.0).round() as u32
    }
}

fn default_availability_zone() -> String {
    DEFAULT_AVAILABILITY_ZONE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_json_shape() {
        let mut pool = StoragePoolSpec::new("pool-a", 200, 100);
        pool.extras.data_storage.provisioning_policy = Some(ProvisioningPolicy::Thin);
        pool.extras.io_connectivity.max_iops = 5000;

        let json = serde_json::to_value(&pool).unwrap();
        assert_eq!(json["freeCapacity"], 100);
        assert_eq!(json["availabilityZone"], "default");
        assert_eq!(json["extras"]["dataStorage"]["provisioningPolicy"], "Thin");
        assert_eq!(json["extras"]["ioConnectivity"]["maxIOPS"], 5000);
    }

    #[test]
    fn test_pool_defaults_from_json() {
        let pool: StoragePoolSpec =
            serde_json::from_str(r#"{"name": "p", "freeCapacity": 7}"#).unwrap();
        assert_eq!(pool.availability_zone, DEFAULT_AVAILABILITY_ZONE);
        assert_eq!(pool.storage_type, StorageType::Block);
        assert_eq!(pool.free_capacity, 7);
    }

    #[test]
    fn test_utilization() {
        assert_eq!(StoragePoolSpec::new("p", 0, 0).utilization_percent(), 0);
        assert_eq!(StoragePoolSpec::new("p", 200, 50).utilization_percent(), 75);
    }
}
