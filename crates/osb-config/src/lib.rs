// osb-config/src/lib.rs

//! Configuration for talking to a service broker.
//!
//! Values are layered: an optional TOML file, then `OSB_*` environment
//! variables, then whatever the binary applies from its command line. The
//! result is a plain value handed to every component that needs it.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_API_VERSION: &str = "2.14";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_ENV_PREFIX: &str = "OSB_";

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Where the broker lives and how to authenticate against it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BrokerConfig {
	/// Base URL of the broker.
	pub endpoint: String,
	pub username: String,
	pub password: String,
	/// Skip X.509 certificate validation.
	pub skip_verify: bool,
	/// Per-request timeout.
	pub timeout_secs: u64,
	/// Value of the `X-Broker-API-Version` header.
	pub api_version: String,
}

impl Default for BrokerConfig {
	fn default() -> Self {
		Self {
			endpoint: String::new(),
			username: String::new(),
			password: String::new(),
			skip_verify: false,
			timeout_secs: DEFAULT_TIMEOUT_SECS,
			api_version: DEFAULT_API_VERSION.to_string(),
		}
	}
}

impl BrokerConfig {
	/// Checks that everything needed to contact the broker is present.
	pub fn validate_connection(&self) -> Result<(), ConfigError> {
		let required = [
			(&self.endpoint, "--endpoint", "OSB_URL"),
			(&self.username, "--username", "OSB_USERNAME"),
			(&self.password, "--password", "OSB_PASSWORD"),
		];
		for (value, flag, var) in required {
			if value.is_empty() {
				return Err(ConfigError::ValidationError(format!(
					"missing required {} flag or ${} environment variable",
					flag, var
				)));
			}
		}
		Ok(())
	}
}

/// Complete configuration for one invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OsbConfig {
	pub broker: BrokerConfig,
	/// File that mirrors provisioned instances and bindings.
	pub data_path: PathBuf,
	/// Log full HTTP exchanges.
	pub trace: bool,
}

impl Default for OsbConfig {
	fn default() -> Self {
		Self {
			broker: BrokerConfig::default(),
			data_path: default_data_path(),
			trace: false,
		}
	}
}

/// `$HOME/.osbrc`, or `.osbrc` in the working directory without a home.
pub fn default_data_path() -> PathBuf {
	match env::var_os("HOME") {
		Some(home) => PathBuf::from(home).join(".osbrc"),
		None => PathBuf::from(".osbrc"),
	}
}

/// Configuration loader with environment variable overrides
pub struct ConfigLoader {
	file_path: Option<PathBuf>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: DEFAULT_ENV_PREFIX.to_string(),
		}
	}

	/// Reads `path` as the base layer. A named file that does not exist is an
	/// error.
	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_path_buf());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	/// Loads from the file (if any) and the process environment.
	pub async fn load(&self) -> Result<OsbConfig, ConfigError> {
		self.load_with(|key| env::var(key).ok()).await
	}

	/// Like [`load`](Self::load), with environment lookups going through
	/// `lookup` instead of the process environment.
	pub async fn load_with<F>(&self, lookup: F) -> Result<OsbConfig, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut config = match &self.file_path {
			Some(path) => self.load_from_file(path).await?,
			None => OsbConfig::default(),
		};

		self.apply_env_overrides(&mut config, lookup)?;

		Ok(config)
	}

	async fn load_from_file(&self, path: &Path) -> Result<OsbConfig, ConfigError> {
		let content = match tokio::fs::read_to_string(path).await {
			Ok(content) => content,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				return Err(ConfigError::FileNotFound(path.display().to_string()));
			}
			Err(e) => return Err(e.into()),
		};

		debug!("Loaded configuration file {:?}", path);
		toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
	}

	fn apply_env_overrides<F>(&self, config: &mut OsbConfig, lookup: F) -> Result<(), ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let var = |name: &str| lookup(&format!("{}{}", self.env_prefix, name));

		if let Some(url) = var("URL") {
			config.broker.endpoint = url;
		}
		if let Some(username) = var("USERNAME") {
			config.broker.username = username;
		}
		if let Some(password) = var("PASSWORD") {
			config.broker.password = password;
		}
		if let Some(skip) = var("SKIP_VERIFY") {
			config.broker.skip_verify = parse_bool("SKIP_VERIFY", &skip)?;
		}
		if let Some(timeout) = var("TIMEOUT") {
			config.broker.timeout_secs = timeout.trim().parse().map_err(|e| {
				ConfigError::ValidationError(format!("Invalid timeout '{}': {}", timeout, e))
			})?;
		}
		if let Some(version) = var("API_VERSION") {
			config.broker.api_version = version;
		}
		if let Some(data) = var("DATA") {
			if !data.is_empty() {
				config.data_path = PathBuf::from(data);
			}
		}
		if let Some(trace) = var("TRACE") {
			config.trace = parse_bool("TRACE", &trace)?;
		}

		Ok(())
	}
}

/// Accepts the usual spellings of yes and no. An empty value means no.
pub fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
	match value.trim().to_ascii_lowercase().as_str() {
		"y" | "yes" | "true" | "1" | "on" => Ok(true),
		"n" | "no" | "false" | "0" | "off" | "" => Ok(false),
		other => Err(ConfigError::ValidationError(format!(
			"Invalid boolean for {}: '{}'",
			name, other
		))),
	}
}
