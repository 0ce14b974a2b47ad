//! Shared types for the service broker client.
//!
//! - `errors`: the error enum every crate reports through
//! - `catalog`: services, plans and plan resolution
//! - `lifecycle`: request bodies and typed outcomes for the four operations
//! - `id`: random identifiers for caller-omitted IDs

pub mod catalog;
pub mod errors;
pub mod id;
pub mod lifecycle;

pub use catalog::*;
pub use errors::{OsbError, Result};
pub use id::*;
pub use lifecycle::*;
