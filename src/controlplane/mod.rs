//! Control Plane Module
//!
//! Provisioning side of the service: profile resolution, the provision
//! controller, storage drivers and the REST API.

pub mod api;
pub mod backends;
pub mod controller;
pub mod profile;

pub use api::*;
pub use backends::*;
pub use controller::*;
pub use profile::*;
