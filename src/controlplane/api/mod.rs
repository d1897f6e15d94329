//! API Module
//!
//! REST surface over the provision controller and the record store.

pub mod rest;
pub mod server;

pub use rest::*;
pub use server::*;
