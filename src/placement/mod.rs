//! Pool Placement
//!
//! Decides which storage pool a new volume or file share lands in:
//! - Typed predicates over pool fields and vendor attributes
//! - Filter requests built from a profile and a resource request
//! - First-fit pool selection preserving candidate order

pub mod predicate;
pub mod request;
pub mod selector;

pub use predicate::{
    DataStorageField, FieldPath, FieldValue, IoConnectivityField, Operand, Operator, Predicate,
};
pub use request::{FilterRequest, PlacementRequest};
pub use selector::PoolSelector;
