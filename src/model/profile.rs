//! Profiles
//!
//! A profile is a tenant-declared service-level template. Its provisioning
//! properties and custom properties become placement constraints.

use super::pool::{ProvisioningPolicy, StorageType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the profile used when a request does not carry one
pub const DEFAULT_PROFILE_NAME: &str = "default";

/// Opaque predicates merged verbatim into the filter request
pub type CustomProperties = BTreeMap<String, serde_json::Value>;

/// Desired data storage level of service; every field optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStorageLos {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_policy: Option<ProvisioningPolicy>,
    #[serde(default)]
    pub is_space_efficient: bool,
    #[serde(default)]
    pub recovery_time_objective: u64,
}

impl DataStorageLos {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Desired IO connectivity level of service; every field optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IoConnectivityLos {
    #[serde(default)]
    pub access_protocol: String,
    #[serde(default, rename = "maxIOPS")]
    pub max_iops: u64,
    #[serde(default, rename = "maxBWS")]
    pub max_bws: u64,
}

impl IoConnectivityLos {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Provisioning requirements, mirroring the pool capability spec
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningProperties {
    #[serde(default)]
    pub data_storage: DataStorageLos,
    #[serde(default)]
    pub io_connectivity: IoConnectivityLos,
}

impl ProvisioningProperties {
    pub fn is_empty(&self) -> bool {
        self.data_storage.is_empty() && self.io_connectivity.is_empty()
    }
}

/// Tenant-declared service-level template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSpec {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub storage_type: StorageType,
    #[serde(default)]
    pub provisioning_properties: ProvisioningProperties,
    /// `None` contributes nothing; `Some` seeds the filter request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_properties: Option<CustomProperties>,
}

impl ProfileSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether this profile serves as the tenant default
    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_PROFILE_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_properties() {
        let mut props = ProvisioningProperties::default();
        assert!(props.is_empty());

        props.io_connectivity.max_bws = 100;
        assert!(!props.is_empty());
        assert!(props.data_storage.is_empty());
    }

    #[test]
    fn test_profile_from_json() {
        let profile: ProfileSpec = serde_json::from_str(
            r#"{
                "name": "gold",
                "provisioningProperties": {
                    "dataStorage": {"provisioningPolicy": "Thin", "isSpaceEfficient": true},
                    "ioConnectivity": {"accessProtocol": "iscsi", "maxIOPS": 1000}
                },
                "customProperties": {"diskType": "SSD"}
            }"#,
        )
        .unwrap();

        let ds = &profile.provisioning_properties.data_storage;
        assert_eq!(ds.provisioning_policy, Some(ProvisioningPolicy::Thin));
        assert!(ds.is_space_efficient);
        assert_eq!(profile.provisioning_properties.io_connectivity.max_iops, 1000);
        assert_eq!(
            profile.custom_properties.unwrap()["diskType"],
            serde_json::json!("SSD")
        );
        assert!(!ProfileSpec::new("gold").is_default());
        assert!(ProfileSpec::new(DEFAULT_PROFILE_NAME).is_default());
    }
}
