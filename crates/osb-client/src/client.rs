//! HTTP plumbing shared by every broker call.

use osb_config::BrokerConfig;
use osb_types::{OsbError, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};

pub const API_VERSION_HEADER: &str = "X-Broker-API-Version";

/// A client bound to one broker endpoint and one set of credentials.
///
/// Requests are issued one at a time and never retried.
#[derive(Debug, Clone)]
pub struct BrokerClient {
	http: reqwest::Client,
	endpoint: String,
	username: String,
	password: String,
}

/// Status and raw body of a broker response.
#[derive(Debug)]
pub(crate) struct BrokerResponse {
	pub status: StatusCode,
	pub body: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
	#[serde(default)]
	description: Option<String>,
}

fn transport(e: reqwest::Error) -> OsbError {
	OsbError::Transport(e.to_string())
}

impl BrokerClient {
	pub fn new(config: &BrokerConfig) -> Result<Self> {
		let mut headers = HeaderMap::new();
		let version = HeaderValue::from_str(&config.api_version).map_err(|e| {
			OsbError::Validation(format!("invalid API version '{}': {}", config.api_version, e))
		})?;
		headers.insert(API_VERSION_HEADER, version);

		let mut builder = reqwest::Client::builder()
			.danger_accept_invalid_certs(config.skip_verify)
			.default_headers(headers);
		// Zero means no timeout.
		if config.timeout_secs > 0 {
			builder = builder.timeout(Duration::from_secs(config.timeout_secs));
		}
		let http = builder.build().map_err(transport)?;

		Ok(Self {
			http,
			endpoint: config.endpoint.clone(),
			username: config.username.clone(),
			password: config.password.clone(),
		})
	}

	/// The endpoint as configured, used to key local state.
	pub fn endpoint(&self) -> &str {
		&self.endpoint
	}

	fn url(&self, path: &str) -> String {
		let base = self.endpoint.strip_suffix('/').unwrap_or(&self.endpoint);
		format!("{}/{}", base, path.trim_start_matches('/'))
	}

	fn request(&self, method: Method, path: &str) -> RequestBuilder {
		self.http
			.request(method, self.url(path))
			.basic_auth(&self.username, Some(&self.password))
	}

	async fn send(&self, method: Method, path: &str, builder: RequestBuilder) -> Result<BrokerResponse> {
		debug!("{} {}", method, self.url(path));

		let response = builder.send().await.map_err(transport)?;
		let status = response.status();
		let body = response.text().await.map_err(transport)?;

		debug!("{} {} -> {}", method, path, status);
		trace!("response body: {}", body);

		Ok(BrokerResponse { status, body })
	}

	pub(crate) async fn get(&self, path: &str) -> Result<BrokerResponse> {
		let builder = self.request(Method::GET, path);
		self.send(Method::GET, path, builder).await
	}

	pub(crate) async fn put<T: Serialize>(&self, path: &str, body: &T) -> Result<BrokerResponse> {
		let json = serde_json::to_string(body).map_err(|e| OsbError::Parse(e.to_string()))?;
		trace!("request body: {}", json);

		let builder = self
			.request(Method::PUT, path)
			.header(reqwest::header::CONTENT_TYPE, "application/json")
			.body(json);
		self.send(Method::PUT, path, builder).await
	}

	pub(crate) async fn delete(&self, path: &str, query: &[(&str, &str)]) -> Result<BrokerResponse> {
		let builder = self.request(Method::DELETE, path).query(query);
		self.send(Method::DELETE, path, builder).await
	}
}

impl BrokerResponse {
	/// Decodes a success body. An empty body decodes as `T::default()`.
	pub fn parse<T: DeserializeOwned + Default>(&self) -> Result<T> {
		if self.body.trim().is_empty() {
			return Ok(T::default());
		}
		serde_json::from_str(&self.body).map_err(|e| {
			OsbError::Parse(format!(
				"invalid response body (HTTP {}): {}",
				self.status, e
			))
		})
	}

	/// Turns an unexpected status into a remote error. The body is read
	/// leniently; whatever it holds, the status line is kept.
	pub fn into_error(self) -> OsbError {
		let description = serde_json::from_str::<ErrorBody>(&self.body)
			.ok()
			.and_then(|b| b.description);
		OsbError::remote(description, self.status.to_string())
	}
}
