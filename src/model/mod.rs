//! Data Model
//!
//! Records shared by discovery, selection and provisioning: pools, docks,
//! profiles and the provisioned resources themselves.

pub mod dock;
pub mod pool;
pub mod profile;
pub mod resource;

pub use dock::*;
pub use pool::*;
pub use profile::*;
pub use resource::*;
