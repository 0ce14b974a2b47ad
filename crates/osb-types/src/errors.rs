//! Error types shared by the broker client and the local state store.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OsbError>;

/// Description used when a broker rejects a request without saying why.
pub const UNKNOWN_ERROR_DESCRIPTION: &str = "an unknown error has occurred";

#[derive(Error, Debug)]
pub enum OsbError {
	/// A required identifier was not supplied by the caller.
	#[error("{0}")]
	Validation(String),

	/// The broker answered with a status outside the set the operation accepts.
	#[error("{description} (HTTP {status})")]
	Remote { description: String, status: String },

	/// The local state store has no record for the requested key.
	#[error("{0}")]
	NotFound(String),

	/// A response body or the persisted state document could not be decoded.
	#[error("Parse error: {0}")]
	Parse(String),

	/// DNS, TLS, connection and timeout failures. Never retried.
	#[error("Transport error: {0}")]
	Transport(String),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

impl OsbError {
	/// Builds a remote error, substituting the generic description when the
	/// broker left it out.
	pub fn remote(description: Option<String>, status: impl Into<String>) -> Self {
		let description = description
			.filter(|d| !d.is_empty())
			.unwrap_or_else(|| UNKNOWN_ERROR_DESCRIPTION.to_string());
		OsbError::Remote {
			description,
			status: status.into(),
		}
	}

	/// Only a missing local mapping is recoverable: callers fall back to the
	/// catalog or to explicit overrides.
	pub fn is_recoverable(&self) -> bool {
		matches!(self, OsbError::NotFound(_))
	}
}
