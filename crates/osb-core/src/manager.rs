// osb-core/src/manager.rs

use osb_client::BrokerClient;
use osb_config::OsbConfig;
use osb_storage::StateStore;
use osb_types::{
	BindSpec, BindStatus, DeprovisionSpec, DeprovisionStatus, OsbError, ProvisionSpec,
	ProvisionStatus, ResolvedPlan, Result, UnbindSpec, UnbindStatus,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Values the caller supplies for mappings the store may not hold.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
	pub instance: Option<String>,
	pub service: Option<String>,
	pub plan: Option<String>,
}

impl Overrides {
	fn instance(&self) -> Option<&str> {
		self.instance.as_deref().filter(|s| !s.is_empty())
	}

	fn service(&self) -> Option<&str> {
		self.service.as_deref().filter(|s| !s.is_empty())
	}

	fn plan(&self) -> Option<&str> {
		self.plan.as_deref().filter(|s| !s.is_empty())
	}
}

/// Result of a lifecycle call. A remote success whose local record could
/// not be saved is still a success; `persist_warning` says what went wrong.
#[derive(Debug, Clone, Serialize)]
pub struct Report<T> {
	#[serde(flatten)]
	pub status: T,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub persist_warning: Option<String>,
}

/// Runs lifecycle operations against one broker and keeps the local store
/// in step with their outcomes.
pub struct LifecycleManager {
	client: BrokerClient,
	store: StateStore,
	data_path: PathBuf,
}

fn missing_flag(flag: &str) -> OsbError {
	OsbError::Validation(format!("missing required {} flag", flag))
}

fn require(value: &str, what: &str) -> Result<()> {
	if value.is_empty() {
		return Err(OsbError::Validation(format!("{} is required", what)));
	}
	Ok(())
}

impl LifecycleManager {
	pub fn new(client: BrokerClient, store: StateStore, data_path: impl Into<PathBuf>) -> Self {
		Self {
			client,
			store,
			data_path: data_path.into(),
		}
	}

	/// Builds the client from `config.broker` and loads the store from
	/// `config.data_path`.
	pub async fn from_config(config: &OsbConfig) -> Result<Self> {
		let client = BrokerClient::new(&config.broker)?;
		let store = StateStore::load(&config.data_path).await?;
		Ok(Self::new(client, store, &config.data_path))
	}

	pub fn store(&self) -> &StateStore {
		&self.store
	}

	/// Resolves `service_ref`/`plan_ref` through the catalog, provisions and
	/// records the instance.
	pub async fn provision(
		&mut self,
		instance_id: Option<&str>,
		service_ref: &str,
		plan_ref: &str,
	) -> Result<Report<ProvisionStatus>> {
		let plan = self.client.resolve_plan(service_ref, plan_ref).await?;
		let spec = ProvisionSpec {
			service_id: plan.service_id.clone(),
			plan_id: plan.plan_id.clone(),
			..Default::default()
		};

		let status = self.client.provision(instance_id, &spec).await?;

		self.store.add_instance(
			self.client.endpoint(),
			&status.instance_id,
			&plan.service_id,
			&plan.plan_id,
		);

		Ok(self.report(status).await)
	}

	/// Binds an instance and records the binding with whatever credentials
	/// the broker returned, including on an accepted (202) outcome.
	pub async fn bind(
		&mut self,
		instance_id: &str,
		binding_id: Option<&str>,
		overrides: &Overrides,
	) -> Result<Report<BindStatus>> {
		require(instance_id, "instance ID for binding")?;
		let plan = self.instance_plan(instance_id, overrides).await?;
		let spec = BindSpec {
			service_id: plan.service_id,
			plan_id: plan.plan_id,
			..Default::default()
		};

		let status = self.client.bind(instance_id, binding_id, &spec).await?;

		self.store.add_binding(
			self.client.endpoint(),
			instance_id,
			&status.binding_id,
			status.details.credentials.clone(),
		);

		Ok(self.report(status).await)
	}

	/// Unbinds a binding known only by its ID. The store supplies the owning
	/// instance; otherwise `overrides.instance` must.
	pub async fn unbind(
		&mut self,
		binding_id: &str,
		overrides: &Overrides,
	) -> Result<Report<UnbindStatus>> {
		require(binding_id, "binding ID for unbinding")?;

		let found = self.store.lookup_binding(self.client.endpoint(), binding_id);
		let (instance_id, plan) = match found {
			Ok(found) => (
				found.instance_id,
				ResolvedPlan {
					service_id: found.service_id,
					plan_id: found.plan_id,
				},
			),
			Err(e) if e.is_recoverable() => {
				debug!("{}; falling back to overrides", e);
				let instance_id = overrides
					.instance()
					.ok_or_else(|| missing_flag("--instance"))?
					.to_string();
				let plan = self.instance_plan(&instance_id, overrides).await?;
				(instance_id, plan)
			}
			Err(e) => return Err(e),
		};

		let spec = UnbindSpec {
			service_id: plan.service_id,
			plan_id: plan.plan_id,
		};
		let status = self.client.unbind(&instance_id, binding_id, &spec).await?;

		self.store
			.remove_binding(self.client.endpoint(), &instance_id, binding_id);

		Ok(self.report(status).await)
	}

	/// Deprovisions an instance and forgets it.
	pub async fn deprovision(
		&mut self,
		instance_id: &str,
		overrides: &Overrides,
	) -> Result<Report<DeprovisionStatus>> {
		require(instance_id, "instance ID for deprovisioning")?;

		let plan = self.instance_plan(instance_id, overrides).await?;
		let spec = DeprovisionSpec {
			service_id: plan.service_id,
			plan_id: plan.plan_id,
		};

		let status = self.client.deprovision(instance_id, &spec).await?;

		self.store.remove_instance(self.client.endpoint(), instance_id);

		Ok(self.report(status).await)
	}

	/// Service and plan of an instance: from the store, else from the
	/// overrides resolved through the catalog.
	async fn instance_plan(&self, instance_id: &str, overrides: &Overrides) -> Result<ResolvedPlan> {
		match self.store.lookup_instance(self.client.endpoint(), instance_id) {
			Ok(plan) => Ok(plan),
			Err(e) if e.is_recoverable() => {
				debug!("{}; falling back to overrides", e);
				self.resolve_overrides(overrides).await
			}
			Err(e) => Err(e),
		}
	}

	async fn resolve_overrides(&self, overrides: &Overrides) -> Result<ResolvedPlan> {
		let service = overrides.service().ok_or_else(|| missing_flag("--service"))?;
		let plan = overrides.plan().ok_or_else(|| missing_flag("--plan"))?;
		self.client.resolve_plan(service, plan).await
	}

	async fn report<T>(&self, status: T) -> Report<T> {
		Report {
			status,
			persist_warning: self.persist().await,
		}
	}

	/// Saves the store. Failure is reported, never raised.
	async fn persist(&self) -> Option<String> {
		match self.store.save(&self.data_path).await {
			Ok(()) => {
				info!("State saved to {:?}", self.data_path);
				None
			}
			Err(e) => {
				let message = format!(
					"failed to save state to {}: {}",
					self.data_path.display(),
					e
				);
				warn!("{}", message);
				Some(message)
			}
		}
	}
}
