//! Local state for the service broker client.
//!
//! Brokers do not echo back the service and plan an instance was created
//! from, so the client remembers them here, keyed by broker endpoint. The
//! store is loaded at start, updated after each successful lifecycle call,
//! and written back once.

pub mod records;
mod serde_helpers;
pub mod store;

pub use records::{BindingLookup, BindingRecord, BrokerRecord, InstanceRecord};
pub use store::{normalize_broker_url, StateStore};
