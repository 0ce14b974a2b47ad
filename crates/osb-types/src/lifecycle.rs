//! Request bodies and typed outcomes for provision, bind, unbind and
//! deprovision.
//!
//! Each operation classifies the broker's status code into an outcome enum;
//! the serialized form of an outcome is the human status label printed by
//! the CLI ("provisioned", "binding", ...).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque JSON object: credentials, context, parameters, mount config.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Body of `PUT /v2/service_instances/{instance_id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvisionSpec {
	pub service_id: String,
	pub plan_id: String,

	#[serde(default)]
	pub context: JsonMap,
	#[serde(default)]
	pub organization_guid: String,
	#[serde(default)]
	pub space_guid: String,

	#[serde(default)]
	pub parameters: JsonMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProvisionOutcome {
	/// 200: the broker already holds an identical instance.
	#[serde(rename = "already existed")]
	AlreadyExists,
	/// 201
	#[serde(rename = "provisioned")]
	Created,
	/// 202: provisioning continues in the background.
	#[serde(rename = "provisioning")]
	Accepted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionStatus {
	pub instance_id: String,
	pub status: ProvisionOutcome,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub dashboard_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub operation: Option<String>,
}

/// Body of `PUT /v2/service_instances/{instance_id}/service_bindings/{binding_id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BindSpec {
	#[serde(default)]
	pub context: JsonMap,
	pub service_id: String,
	pub plan_id: String,
	#[serde(default)]
	pub parameters: JsonMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindOutcome {
	#[serde(rename = "already bound")]
	AlreadyBound,
	#[serde(rename = "bound")]
	Bound,
	#[serde(rename = "binding")]
	Accepted,
}

/// Everything a broker may return in a bind response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindingDetails {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub operation: Option<String>,
	#[serde(default)]
	pub credentials: JsonMap,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub syslog_drain_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub route_service_url: Option<String>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub volume_mounts: Vec<VolumeMount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeMount {
	#[serde(default)]
	pub driver: String,
	#[serde(default)]
	pub container_dir: String,
	#[serde(default)]
	pub mode: String,
	#[serde(default)]
	pub device_type: String,
	#[serde(default)]
	pub device: VolumeDevice,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeDevice {
	#[serde(default)]
	pub volume_id: String,
	#[serde(default)]
	pub mount_config: JsonMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindStatus {
	pub instance_id: String,
	pub binding_id: String,
	pub status: BindOutcome,
	#[serde(flatten)]
	pub details: BindingDetails,
}

/// Identifies the service and plan for an unbind; sent as query parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnbindSpec {
	#[serde(default)]
	pub service_id: String,
	#[serde(default)]
	pub plan_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnbindOutcome {
	#[serde(rename = "already unbound")]
	AlreadyUnbound,
	/// 201 is unusual for a DELETE but brokers send it.
	#[serde(rename = "unbound")]
	Unbound,
	#[serde(rename = "unbinding")]
	Accepted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnbindStatus {
	pub instance_id: String,
	pub binding_id: String,
	pub status: UnbindOutcome,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub operation: Option<String>,
}

/// Service and plan for a deprovision; sent as query parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeprovisionSpec {
	#[serde(default)]
	pub service_id: String,
	#[serde(default)]
	pub plan_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeprovisionOutcome {
	/// 200 or 410.
	#[serde(rename = "deprovisioned")]
	Deprovisioned,
	#[serde(rename = "deprovisioning")]
	Accepted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeprovisionStatus {
	pub instance_id: String,
	pub status: DeprovisionOutcome,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub operation: Option<String>,
}

/// Async-operation body shared by unbind and deprovision responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationBody {
	#[serde(default)]
	pub operation: Option<String>,
}

/// Provision response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvisionBody {
	#[serde(default)]
	pub dashboard_url: Option<String>,
	#[serde(default)]
	pub operation: Option<String>,
}

macro_rules! impl_label {
	($ty:ty { $($variant:ident => $label:literal),+ $(,)? }) => {
		impl $ty {
			pub fn label(&self) -> &'static str {
				match self {
					$(Self::$variant => $label),+
				}
			}
		}

		impl fmt::Display for $ty {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(self.label())
			}
		}
	};
}

impl ProvisionOutcome {
	pub fn from_status(status: u16) -> Option<Self> {
		match status {
			200 => Some(Self::AlreadyExists),
			201 => Some(Self::Created),
			202 => Some(Self::Accepted),
			_ => None,
		}
	}
}

impl BindOutcome {
	pub fn from_status(status: u16) -> Option<Self> {
		match status {
			200 => Some(Self::AlreadyBound),
			201 => Some(Self::Bound),
			202 => Some(Self::Accepted),
			_ => None,
		}
	}
}

impl UnbindOutcome {
	pub fn from_status(status: u16) -> Option<Self> {
		match status {
			200 => Some(Self::AlreadyUnbound),
			201 => Some(Self::Unbound),
			202 => Some(Self::Accepted),
			_ => None,
		}
	}
}

impl DeprovisionOutcome {
	/// 410 Gone is as final as 200 for a deletion.
	pub fn from_status(status: u16) -> Option<Self> {
		match status {
			200 | 410 => Some(Self::Deprovisioned),
			202 => Some(Self::Accepted),
			_ => None,
		}
	}
}

impl_label!(ProvisionOutcome {
	AlreadyExists => "already existed",
	Created => "provisioned",
	Accepted => "provisioning",
});

impl_label!(BindOutcome {
	AlreadyBound => "already bound",
	Bound => "bound",
	Accepted => "binding",
});

impl_label!(UnbindOutcome {
	AlreadyUnbound => "already unbound",
	Unbound => "unbound",
	Accepted => "unbinding",
});

impl_label!(DeprovisionOutcome {
	Deprovisioned => "deprovisioned",
	Accepted => "deprovisioning",
});

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_outcome_labels_match_serialized_form() {
		assert_eq!(
			serde_json::to_value(ProvisionOutcome::Created).unwrap(),
			json!(ProvisionOutcome::Created.label())
		);
		assert_eq!(
			serde_json::to_value(BindOutcome::Accepted).unwrap(),
			json!("binding")
		);
		assert_eq!(UnbindOutcome::AlreadyUnbound.to_string(), "already unbound");
		assert_eq!(DeprovisionOutcome::Deprovisioned.to_string(), "deprovisioned");
	}

	#[test]
	fn test_status_classification() {
		assert_eq!(ProvisionOutcome::from_status(200), Some(ProvisionOutcome::AlreadyExists));
		assert_eq!(ProvisionOutcome::from_status(201), Some(ProvisionOutcome::Created));
		assert_eq!(ProvisionOutcome::from_status(202), Some(ProvisionOutcome::Accepted));
		assert_eq!(ProvisionOutcome::from_status(410), None);

		assert_eq!(BindOutcome::from_status(200), Some(BindOutcome::AlreadyBound));
		assert_eq!(BindOutcome::from_status(201), Some(BindOutcome::Bound));
		assert_eq!(BindOutcome::from_status(202), Some(BindOutcome::Accepted));
		assert_eq!(BindOutcome::from_status(204), None);

		assert_eq!(UnbindOutcome::from_status(200), Some(UnbindOutcome::AlreadyUnbound));
		assert_eq!(UnbindOutcome::from_status(201), Some(UnbindOutcome::Unbound));
		assert_eq!(UnbindOutcome::from_status(202), Some(UnbindOutcome::Accepted));
		assert_eq!(UnbindOutcome::from_status(410), None);

		assert_eq!(DeprovisionOutcome::from_status(200), Some(DeprovisionOutcome::Deprovisioned));
		assert_eq!(DeprovisionOutcome::from_status(410), Some(DeprovisionOutcome::Deprovisioned));
		assert_eq!(DeprovisionOutcome::from_status(202), Some(DeprovisionOutcome::Accepted));
		assert_eq!(DeprovisionOutcome::from_status(201), None);
		assert_eq!(DeprovisionOutcome::from_status(404), None);
	}

	#[test]
	fn test_bind_details_parse_volume_mounts() {
		let details: BindingDetails = serde_json::from_value(json!({
			"credentials": { "uri": "redis://x" },
			"syslog_drain_url": "syslog://drain",
			"volume_mounts": [{
				"driver": "nfs",
				"container_dir": "/data",
				"mode": "rw",
				"device_type": "shared",
				"device": {
					"volume_id": "vol-1",
					"mount_config": { "source": "nfs://host/share" }
				}
			}]
		}))
		.unwrap();

		assert_eq!(details.credentials["uri"], json!("redis://x"));
		assert_eq!(details.syslog_drain_url.as_deref(), Some("syslog://drain"));
		assert!(details.route_service_url.is_none());
		assert_eq!(details.volume_mounts.len(), 1);
		let mount = &details.volume_mounts[0];
		assert_eq!(mount.driver, "nfs");
		assert_eq!(mount.device.volume_id, "vol-1");
		assert_eq!(mount.device.mount_config["source"], json!("nfs://host/share"));
	}

	#[test]
	fn test_bind_status_serializes_flat() {
		let status = BindStatus {
			instance_id: "i1".into(),
			binding_id: "b1".into(),
			status: BindOutcome::Bound,
			details: BindingDetails::default(),
		};
		let value = serde_json::to_value(&status).unwrap();
		assert_eq!(value["status"], json!("bound"));
		assert_eq!(value["credentials"], json!({}));
		assert!(value.get("operation").is_none());
	}
}
