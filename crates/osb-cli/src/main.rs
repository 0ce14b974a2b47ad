use anyhow::{Context, Result};
use clap::Parser;
use osb_config::{ConfigLoader, OsbConfig};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod output;

use cli::Args;

#[tokio::main]
async fn main() {
	let args = Args::parse();

	if let Err(e) = run(args).await {
		eprintln!("!!! {:#}", e);
		std::process::exit(1);
	}
}

async fn run(args: Args) -> Result<()> {
	let config = load_config(&args).await?;

	// Initialize tracing
	setup_tracing(&args.log_level, config.trace)?;
	debug!("Using data file {:?}", config.data_path);

	commands::run(&args, &config).await
}

/// File, then `OSB_*` environment, then flags.
async fn load_config(args: &Args) -> Result<OsbConfig> {
	let mut loader = ConfigLoader::new();
	if let Some(path) = &args.config {
		loader = loader.with_file(path);
	}

	let mut config = loader
		.load()
		.await
		.context("Failed to load configuration")?;
	args.apply_to(&mut config);

	Ok(config)
}

/// Logs go to stderr so `--json` output stays clean. `trace` lets the HTTP
/// exchange dumps through regardless of the level.
fn setup_tracing(log_level: &str, trace: bool) -> Result<()> {
	let mut env_filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(log_level))
		.with_context(|| format!("Invalid log level '{}'", log_level))?;
	if trace {
		env_filter = env_filter.add_directive("osb_client=trace".parse()?);
	}

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	Ok(())
}
