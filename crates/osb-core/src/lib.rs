//! Caller-side control flow for the broker client.
//!
//! A lifecycle call resolves the service and plan (from the local store,
//! explicit overrides or the catalog), performs the remote operation,
//! records the result in the store and persists it.

pub mod manager;

pub use manager::{LifecycleManager, Overrides, Report};
