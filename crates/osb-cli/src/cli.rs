//! Command-line interface definitions.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use osb_config::OsbConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "osb")]
#[command(about = "Command-line client for Open Service Broker APIs", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
	/// Trace HTTP requests and responses as they happen ($OSB_TRACE)
	#[arg(short = 'T', long, global = true)]
	pub trace: bool,

	/// File storing the instance and binding details later commands need ($OSB_DATA)
	#[arg(long, value_name = "FILE", global = true)]
	pub data: Option<PathBuf>,

	/// URL of the service broker ($OSB_URL)
	#[arg(short = 'e', long, global = true)]
	pub endpoint: Option<String>,

	/// Username for HTTP basic auth ($OSB_USERNAME)
	#[arg(short = 'U', long, global = true)]
	pub username: Option<String>,

	/// Password for HTTP basic auth ($OSB_PASSWORD)
	#[arg(short = 'P', long, global = true)]
	pub password: Option<String>,

	/// Do not validate X.509 TLS certificates ($OSB_SKIP_VERIFY)
	#[arg(short = 'k', long, global = true)]
	pub skip_verify: bool,

	/// Timeout in seconds for HTTP requests ($OSB_TIMEOUT)
	#[arg(short = 't', long, value_name = "SECONDS", global = true)]
	pub timeout: Option<u64>,

	/// Value of the X-Broker-API-Version header ($OSB_API_VERSION)
	#[arg(long, global = true)]
	pub api_version: Option<String>,

	/// TOML configuration file
	#[arg(long, value_name = "FILE", env = "OSB_CONFIG", global = true)]
	pub config: Option<PathBuf>,

	/// Log level (trace, debug, info, warn, error)
	#[arg(long, env = "OSB_LOG_LEVEL", default_value = "warn", global = true)]
	pub log_level: String,

	/// Emit JSON and nothing else
	#[arg(long, global = true)]
	pub json: bool,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// List known instance and binding details from the data file
	#[command(visible_alias = "ls")]
	List,

	/// Dump the environment variables osb cares about
	Env,

	/// Retrieve the service catalog from the broker
	Catalog,

	/// Provision a new instance of a service/plan
	#[command(visible_aliases = ["prov", "create"])]
	Provision {
		/// ID for the new instance; a random UUID if omitted
		#[arg(short = 'i', long = "id")]
		id: Option<String>,

		/// Service and plan, each by name or ID
		#[arg(value_name = "SERVICE/PLAN")]
		target: String,
	},

	/// Bind a provisioned instance to get credentials
	Bind {
		/// Service the instance came from, if the data file does not know
		#[arg(short = 's', long)]
		service: Option<String>,

		/// Plan the instance came from, if the data file does not know
		#[arg(short = 'p', long)]
		plan: Option<String>,

		/// ID for the new binding; a random UUID if omitted
		#[arg(short = 'i', long = "id")]
		id: Option<String>,

		instance: String,
	},

	/// Unbind an instance, releasing bound credentials
	Unbind {
		/// Service the instance came from, if the data file does not know
		#[arg(short = 's', long)]
		service: Option<String>,

		/// Plan the instance came from, if the data file does not know
		#[arg(short = 'p', long)]
		plan: Option<String>,

		/// Instance the binding belongs to, if the data file does not know
		#[arg(short = 'i', long, alias = "id")]
		instance: Option<String>,

		binding: String,
	},

	/// Remove a provisioned instance
	#[command(visible_aliases = ["deprov", "rm"])]
	Deprovision {
		/// Service the instance came from, if the data file does not know
		#[arg(short = 's', long)]
		service: Option<String>,

		/// Plan the instance came from, if the data file does not know
		#[arg(short = 'p', long)]
		plan: Option<String>,

		instance: String,
	},
}

impl Args {
	/// Applies flags on top of file and environment configuration.
	pub fn apply_to(&self, config: &mut OsbConfig) {
		if let Some(endpoint) = &self.endpoint {
			config.broker.endpoint = endpoint.clone();
		}
		if let Some(username) = &self.username {
			config.broker.username = username.clone();
		}
		if let Some(password) = &self.password {
			config.broker.password = password.clone();
		}
		if self.skip_verify {
			config.broker.skip_verify = true;
		}
		if let Some(timeout) = self.timeout {
			config.broker.timeout_secs = timeout;
		}
		if let Some(version) = &self.api_version {
			config.broker.api_version = version.clone();
		}
		if let Some(data) = &self.data {
			config.data_path = data.clone();
		}
		if self.trace {
			config.trace = true;
		}
	}
}

/// Splits `SERVICE/PLAN` at its first slash.
pub fn split_target(target: &str) -> Result<(&str, &str)> {
	match target.split_once('/') {
		Some((service, plan)) if !service.is_empty() && !plan.is_empty() => Ok((service, plan)),
		_ => bail!("expected SERVICE/PLAN, got '{}' (missing the /plan bits?)", target),
	}
}
