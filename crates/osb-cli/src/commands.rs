//! Command handlers.

use crate::cli::{split_target, Args, Command};
use crate::output;
use anyhow::{Context, Result};
use osb_client::BrokerClient;
use osb_config::OsbConfig;
use osb_core::{LifecycleManager, Overrides};
use osb_storage::StateStore;
use tracing::info;

pub async fn run(args: &Args, config: &OsbConfig) -> Result<()> {
	let json = args.json;

	match &args.command {
		Command::List => list(config, json).await,
		Command::Env => output::print_env(config, json),
		Command::Catalog => catalog(config, json).await,
		Command::Provision { id, target } => {
			let (service, plan) = split_target(target)?;
			let mut manager = connect(config).await?;
			let report = manager.provision(id.as_deref(), service, plan).await?;
			output::print_report(&report, json)
		}
		Command::Bind {
			service,
			plan,
			id,
			instance,
		} => {
			let overrides = Overrides {
				instance: None,
				service: service.clone(),
				plan: plan.clone(),
			};
			let mut manager = connect(config).await?;
			let report = manager.bind(instance, id.as_deref(), &overrides).await?;
			output::print_report(&report, json)
		}
		Command::Unbind {
			service,
			plan,
			instance,
			binding,
		} => {
			let overrides = Overrides {
				instance: instance.clone(),
				service: service.clone(),
				plan: plan.clone(),
			};
			let mut manager = connect(config).await?;
			let report = manager.unbind(binding, &overrides).await?;
			output::print_report(&report, json)
		}
		Command::Deprovision {
			service,
			plan,
			instance,
		} => {
			let overrides = Overrides {
				instance: None,
				service: service.clone(),
				plan: plan.clone(),
			};
			let mut manager = connect(config).await?;
			let report = manager.deprovision(instance, &overrides).await?;
			output::print_report(&report, json)
		}
	}
}

async fn connect(config: &OsbConfig) -> Result<LifecycleManager> {
	config.broker.validate_connection()?;
	info!("Connecting to {}", config.broker.endpoint);

	LifecycleManager::from_config(config)
		.await
		.context("Failed to set up the broker client")
}

async fn list(config: &OsbConfig, json: bool) -> Result<()> {
	let store = StateStore::load(&config.data_path)
		.await
		.with_context(|| format!("Failed to load state from {:?}", config.data_path))?;

	if json {
		return output::print_json(&store);
	}
	print!("{}", output::store_table(&store).render());
	Ok(())
}

async fn catalog(config: &OsbConfig, json: bool) -> Result<()> {
	config.broker.validate_connection()?;
	let client = BrokerClient::new(&config.broker)?;
	let catalog = client.fetch_catalog().await?;

	if json {
		return output::print_json(&catalog);
	}
	print!("{}", output::catalog_table(&catalog).render());
	Ok(())
}
