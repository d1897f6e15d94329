//! Dock and Pool Discovery
//!
//! Periodically asks every configured backend for its pools and keeps the
//! store's dock and pool records current.

pub mod discoverer;
pub mod identity;
pub mod register;

pub use discoverer::{
    discovery_and_report, DiscovererConstructor, DiscovererDeps, DiscovererRegistry,
    DiscoveryContext, DockDiscoverer, ProvisionDockDiscoverer,
};
pub use register::{DockRegister, Registrable};
