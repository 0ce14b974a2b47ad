//! Client for brokers speaking the Open Service Broker HTTP/JSON protocol.
//!
//! The client fetches the catalog and runs the four lifecycle operations.
//! It never touches local state: every call returns facts for the caller to
//! record.

pub mod catalog;
pub mod client;
pub mod lifecycle;

pub use client::{BrokerClient, API_VERSION_HEADER};
pub use lifecycle::{UNKNOWN_PLAN_ID, UNKNOWN_SERVICE_ID};
