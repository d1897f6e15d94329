//! Provisioned Resources
//!
//! Volumes and file shares share one record shape; the controller moves
//! them through their status transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of resource being provisioned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    Volume,
    FileShare,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Volume => write!(f, "Volume"),
            ResourceKind::FileShare => write!(f, "FileShare"),
        }
    }
}

/// Lifecycle status of a resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceStatus {
    #[default]
    Pending,
    Available,
    Error,
    Deleting,
    ErrorDeleting,
    Extending,
    ErrorExtending,
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResourceStatus::Pending => "pending",
            ResourceStatus::Available => "available",
            ResourceStatus::Error => "error",
            ResourceStatus::Deleting => "deleting",
            ResourceStatus::ErrorDeleting => "errorDeleting",
            ResourceStatus::Extending => "extending",
            ResourceStatus::ErrorExtending => "errorExtending",
        };
        write!(f, "{}", s)
    }
}

/// Persisted volume or file share
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    pub id: String,
    pub kind: ResourceKind,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Size in GiB
    pub size: u64,
    #[serde(default)]
    pub availability_zone: String,
    #[serde(default)]
    pub profile_id: String,
    /// Optional placement hint on input, chosen pool after creation
    #[serde(default)]
    pub pool_id: String,
    #[serde(default)]
    pub status: ResourceStatus,
    /// Driver-returned fields
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ResourceSpec {
    /// Create a pending resource with a fresh id
    pub fn new(kind: ResourceKind, name: impl Into<String>, size: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            name: name.into(),
            description: String::new(),
            size,
            availability_zone: String::new(),
            profile_id: String::new(),
            pool_id: String::new(),
            status: ResourceStatus::Pending,
            metadata: BTreeMap::new(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

// =============================================================================
// Driver Option Envelopes
// =============================================================================

/// Fully specified creation request handed to a driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOpts {
    pub id: String,
    pub kind: ResourceKind,
    pub name: String,
    pub description: String,
    pub size: u64,
    pub availability_zone: String,
    pub profile_id: String,
    /// Written by the controller from the selected pool
    pub pool_id: String,
    pub pool_name: String,
    pub driver_name: String,
    pub metadata: BTreeMap<String, String>,
}

impl From<&ResourceSpec> for CreateOpts {
    fn from(res: &ResourceSpec) -> Self {
        Self {
            id: res.id.clone(),
            kind: res.kind,
            name: res.name.clone(),
            description: res.description.clone(),
            size: res.size,
            availability_zone: res.availability_zone.clone(),
            profile_id: res.profile_id.clone(),
            pool_id: res.pool_id.clone(),
            pool_name: String::new(),
            driver_name: String::new(),
            metadata: res.metadata.clone(),
        }
    }
}

/// Deletion request handed to a driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOpts {
    pub id: String,
    pub kind: ResourceKind,
    pub pool_id: String,
    pub profile_id: String,
    pub driver_name: String,
    pub metadata: BTreeMap<String, String>,
}

/// Extension request handed to a driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendOpts {
    pub id: String,
    pub pool_id: String,
    pub size: u64,
    pub driver_name: String,
    pub metadata: BTreeMap<String, String>,
}

/// What a driver returns after creating or extending a resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverResult {
    /// Size actually provisioned, when the backend rounds it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Vendor-assigned fields merged into the resource metadata
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}
