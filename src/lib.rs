//! SDS Placement - Pool Discovery and Placement Control Plane
//!
//! Discovers storage pools on the configured backends, picks a pool for
//! each new volume or file share from the requested profile, and dispatches
//! the operation to the backend's driver.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         REST API                             │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────┐   ┌──────────────────┐                 │
//! │  │    Provision     │──▶│  Pool Placement  │                 │
//! │  │    Controller    │   │  (filter/select) │                 │
//! │  └────────┬─────────┘   └────────┬─────────┘                 │
//! │           │                      │                           │
//! │           │          ┌───────────┴───────────┐               │
//! │           │          │     Record Store      │◀── Discovery  │
//! │           │          │ (profiles/docks/pools)│     Loop      │
//! │           │          └───────────────────────┘       │       │
//! ├───────────┴──────────────────────────────────────────┴───────┤
//! │                      Storage Drivers                         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`placement`]: Filter predicates and pool selection
//! - [`discovery`]: Dock and pool discovery loop
//! - [`controlplane`]: Provision controller, drivers and REST API
//! - [`store`]: Record store adapters
//! - [`model`]: Pool, dock, profile and resource records
//! - [`domain`]: Port traits
//! - [`error`]: Error types and handling

pub mod config;
pub mod controlplane;
pub mod discovery;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod model;
pub mod placement;
pub mod store;

// Re-export commonly used types
pub use config::{BackendConfig, ControllerConfig, DiscoveryConfig, DockConfig, PoolConfig};

pub use controlplane::{
    ApiServer, ApiServerConfig, DriverFactory, DriverRegistry, ProfileResolver,
    ProvisionController, RestRouter, SampleDriver,
};

pub use discovery::{
    discovery_and_report, DiscovererDeps, DiscovererRegistry, DiscoveryContext, DockDiscoverer,
    ProvisionDockDiscoverer,
};

pub use domain::ports::{
    PersistenceClient, PersistenceClientRef, StorageDriver, StorageDriverRef,
};

pub use error::{Error, ErrorAction, ErrorCode, Result};

pub use metrics::Metrics;

pub use model::{
    DockSpec, DockType, ProfileSpec, ResourceKind, ResourceSpec, ResourceStatus,
    StoragePoolSpec, StorageType,
};

pub use placement::{FilterRequest, PlacementRequest, PoolSelector, Predicate};

pub use store::MemoryStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
