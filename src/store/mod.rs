//! Record Store
//!
//! Adapters for the persistence port.

pub mod memory;

pub use memory::MemoryStore;
