//! Docks
//!
//! A dock is one configured backend on one host; it owns the pools its
//! driver reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata key naming the host-based replication driver of a dock
pub const HOST_REPLICATION_DRIVER_KEY: &str = "HostReplicationDriver";

/// Role a dock plays in the control plane
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DockType {
    #[default]
    Provisioner,
    Attacher,
}

impl std::fmt::Display for DockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DockType::Provisioner => write!(f, "provisioner"),
            DockType::Attacher => write!(f, "attacher"),
        }
    }
}

/// One backend served from one host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockSpec {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Driver used to reach the backend
    pub driver_name: String,
    /// API endpoint of the dock service
    pub endpoint: String,
    /// Host the dock runs on
    pub node_id: String,
    #[serde(default)]
    pub dock_type: DockType,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
