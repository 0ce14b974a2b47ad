//! Provision, bind, unbind and deprovision.
//!
//! Each call is one request. The response status is classified into the
//! operation's outcome enum; any status outside that set is a remote error.
//! Accepted (202) outcomes are returned as-is with their operation token.

use crate::client::BrokerClient;
use osb_types::{
	id_or_generate, BindOutcome, BindSpec, BindStatus, BindingDetails, DeprovisionOutcome,
	DeprovisionSpec, DeprovisionStatus, OperationBody, OsbError, ProvisionBody, ProvisionOutcome,
	ProvisionSpec, ProvisionStatus, Result, UnbindOutcome, UnbindSpec, UnbindStatus,
};
use tracing::info;

/// Sent when the caller does not know the service an instance came from.
pub const UNKNOWN_SERVICE_ID: &str = "oops-unknown-service-id";
/// Sent when the caller does not know the plan an instance came from.
pub const UNKNOWN_PLAN_ID: &str = "oops-unknown-plan-id";

fn instance_path(instance_id: &str) -> String {
	format!("/v2/service_instances/{}", instance_id)
}

fn binding_path(instance_id: &str, binding_id: &str) -> String {
	format!(
		"/v2/service_instances/{}/service_bindings/{}",
		instance_id, binding_id
	)
}

fn require(value: &str, what: &str) -> Result<()> {
	if value.is_empty() {
		return Err(OsbError::Validation(format!("{} is required", what)));
	}
	Ok(())
}

impl BrokerClient {
	/// Creates (or replays the creation of) an instance. A missing or empty
	/// `instance_id` is replaced with a random one.
	pub async fn provision(
		&self,
		instance_id: Option<&str>,
		spec: &ProvisionSpec,
	) -> Result<ProvisionStatus> {
		let instance_id = id_or_generate(instance_id);

		let response = self.put(&instance_path(&instance_id), spec).await?;
		let Some(outcome) = ProvisionOutcome::from_status(response.status.as_u16()) else {
			return Err(response.into_error());
		};
		let body: ProvisionBody = response.parse()?;

		info!("Instance {}: {}", instance_id, outcome);
		Ok(ProvisionStatus {
			instance_id,
			status: outcome,
			dashboard_url: body.dashboard_url.filter(|u| !u.is_empty()),
			operation: body.operation.filter(|o| !o.is_empty()),
		})
	}

	/// Binds an instance. A missing or empty `binding_id` is replaced with a
	/// random one.
	pub async fn bind(
		&self,
		instance_id: &str,
		binding_id: Option<&str>,
		spec: &BindSpec,
	) -> Result<BindStatus> {
		require(instance_id, "instance ID for binding")?;
		let binding_id = id_or_generate(binding_id);

		let response = self
			.put(&binding_path(instance_id, &binding_id), spec)
			.await?;
		let Some(outcome) = BindOutcome::from_status(response.status.as_u16()) else {
			return Err(response.into_error());
		};
		let mut details: BindingDetails = response.parse()?;
		details.operation = details.operation.filter(|o| !o.is_empty());

		info!("Binding {} of instance {}: {}", binding_id, instance_id, outcome);
		Ok(BindStatus {
			instance_id: instance_id.to_string(),
			binding_id,
			status: outcome,
			details,
		})
	}

	pub async fn unbind(
		&self,
		instance_id: &str,
		binding_id: &str,
		spec: &UnbindSpec,
	) -> Result<UnbindStatus> {
		require(instance_id, "instance ID for unbinding")?;
		require(binding_id, "binding ID for unbinding")?;

		let mut query = Vec::new();
		if !spec.service_id.is_empty() {
			query.push(("service_id", spec.service_id.as_str()));
		}
		if !spec.plan_id.is_empty() {
			query.push(("plan_id", spec.plan_id.as_str()));
		}

		let response = self
			.delete(&binding_path(instance_id, binding_id), &query)
			.await?;
		let Some(outcome) = UnbindOutcome::from_status(response.status.as_u16()) else {
			return Err(response.into_error());
		};
		let body: OperationBody = response.parse()?;

		info!("Binding {} of instance {}: {}", binding_id, instance_id, outcome);
		Ok(UnbindStatus {
			instance_id: instance_id.to_string(),
			binding_id: binding_id.to_string(),
			status: outcome,
			operation: body.operation.filter(|o| !o.is_empty()),
		})
	}

	pub async fn deprovision(
		&self,
		instance_id: &str,
		spec: &DeprovisionSpec,
	) -> Result<DeprovisionStatus> {
		require(instance_id, "instance ID for deprovisioning")?;

		let service_id = match spec.service_id.as_str() {
			"" => UNKNOWN_SERVICE_ID,
			id => id,
		};
		let plan_id = match spec.plan_id.as_str() {
			"" => UNKNOWN_PLAN_ID,
			id => id,
		};

		let response = self
			.delete(
				&instance_path(instance_id),
				&[("service_id", service_id), ("plan_id", plan_id)],
			)
			.await?;
		let Some(outcome) = DeprovisionOutcome::from_status(response.status.as_u16()) else {
			return Err(response.into_error());
		};

		// 200 and 410 need not carry a body.
		let operation = match outcome {
			DeprovisionOutcome::Deprovisioned => None,
			DeprovisionOutcome::Accepted => response.parse::<OperationBody>()?.operation,
		};

		info!("Instance {}: {}", instance_id, outcome);
		Ok(DeprovisionStatus {
			instance_id: instance_id.to_string(),
			status: outcome,
			operation: operation.filter(|o| !o.is_empty()),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_paths() {
		assert_eq!(instance_path("i1"), "/v2/service_instances/i1");
		assert_eq!(
			binding_path("i1", "b1"),
			"/v2/service_instances/i1/service_bindings/b1"
		);
	}

	#[test]
	fn test_require_rejects_empty() {
		let err = require("", "instance ID for unbinding").unwrap_err();
		assert!(matches!(err, OsbError::Validation(_)));
		assert_eq!(err.to_string(), "instance ID for unbinding is required");
		assert!(require("i1", "instance ID").is_ok());
	}
}
