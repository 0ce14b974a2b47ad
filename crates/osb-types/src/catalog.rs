//! # Catalog
//!
//! The broker-published list of offerable services and their plans, plus the
//! name/ID resolution used to turn human references into canonical IDs.

use crate::errors::{OsbError, Result};
use serde::{Deserialize, Serialize};

/// A boolean that a plan may leave unset so it inherits from its service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum Flag {
	#[default]
	Unset,
	True,
	False,
}

impl Flag {
	pub fn is_unset(&self) -> bool {
		matches!(self, Flag::Unset)
	}

	/// The flag's own value if set, otherwise `default`.
	pub fn resolve(self, default: bool) -> bool {
		match self {
			Flag::True => true,
			Flag::False => false,
			Flag::Unset => default,
		}
	}
}

impl From<Option<bool>> for Flag {
	fn from(value: Option<bool>) -> Self {
		match value {
			Some(true) => Flag::True,
			Some(false) => Flag::False,
			None => Flag::Unset,
		}
	}
}

impl From<Flag> for Option<bool> {
	fn from(flag: Flag) -> Self {
		match flag {
			Flag::True => Some(true),
			Flag::False => Some(false),
			Flag::Unset => None,
		}
	}
}

/// Response body of `GET /v2/catalog`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub services: Vec<Service>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Service {
	pub id: String,
	pub name: String,
	#[serde(default)]
	pub description: String,

	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub tags: Vec<String>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub requires: Vec<String>,

	/// Service-level default for plans that leave `bindable` unset.
	#[serde(default)]
	pub bindable: bool,
	#[serde(default)]
	pub instances_retrievable: bool,
	#[serde(default)]
	pub bindings_retrievable: bool,
	#[serde(default)]
	pub plan_updateable: bool,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metadata: Option<serde_json::Value>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub dashboard_client: Option<DashboardClient>,

	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub plans: Vec<Plan>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardClient {
	pub id: String,
	pub secret: String,
	pub redirect_uri: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
	pub id: String,
	pub name: String,
	#[serde(default)]
	pub description: String,

	#[serde(default, skip_serializing_if = "Flag::is_unset")]
	pub free: Flag,
	#[serde(default, skip_serializing_if = "Flag::is_unset")]
	pub bindable: Flag,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metadata: Option<serde_json::Value>,

	/// Parameter schemas for instance create/update and binding create, kept
	/// as raw JSON.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub schemas: Option<serde_json::Value>,
}

impl Plan {
	pub fn is_free(&self) -> bool {
		self.free.resolve(false)
	}
}

impl Service {
	/// Whether `plan` can be bound: the plan's own flag if set, otherwise
	/// this service's default.
	pub fn plan_is_bindable(&self, plan: &Plan) -> bool {
		plan.bindable.resolve(self.bindable)
	}
}

/// Canonical identifiers for a service/plan pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlan {
	pub service_id: String,
	pub plan_id: String,
}

impl Catalog {
	/// Resolves a service and a plan reference, each given either by ID or by
	/// name, to canonical IDs.
	///
	/// An exact ID match takes precedence over a name match. Among equal
	/// candidates, catalog order decides.
	pub fn resolve_plan(&self, service_ref: &str, plan_ref: &str) -> Result<ResolvedPlan> {
		let service = self
			.services
			.iter()
			.find(|s| s.id == service_ref)
			.or_else(|| self.services.iter().find(|s| s.name == service_ref))
			.ok_or_else(|| OsbError::NotFound(format!("no such service: {}", service_ref)))?;

		let plan = service
			.plans
			.iter()
			.find(|p| p.id == plan_ref)
			.or_else(|| service.plans.iter().find(|p| p.name == plan_ref))
			.ok_or_else(|| {
				OsbError::NotFound(format!("no such plan: {} / {}", service_ref, plan_ref))
			})?;

		Ok(ResolvedPlan {
			service_id: service.id.clone(),
			plan_id: plan.id.clone(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_catalog() -> Catalog {
		serde_json::from_str(
			r#"{
				"services": [
					{
						"id": "svc-redis",
						"name": "redis",
						"bindable": true,
						"tags": ["cache"],
						"plans": [
							{ "id": "plan-small", "name": "small", "free": true },
							{ "id": "plan-large", "name": "large", "bindable": false }
						]
					},
					{
						"id": "svc-pg",
						"name": "postgres",
						"plans": [
							{ "id": "plan-pg-small", "name": "small", "bindable": true },
							{ "id": "plan-pg-huge", "name": "huge" }
						]
					}
				]
			}"#,
		)
		.unwrap()
	}

	#[test]
	fn test_resolve_by_id_and_name_agree() {
		let catalog = sample_catalog();
		for service in &catalog.services {
			for plan in &service.plans {
				let by_id = catalog.resolve_plan(&service.id, &plan.id).unwrap();
				let by_name = catalog.resolve_plan(&service.name, &plan.name).unwrap();
				assert_eq!(by_id, by_name);
				assert_eq!(by_id.service_id, service.id);
				assert_eq!(by_id.plan_id, plan.id);
			}
		}
	}

	#[test]
	fn test_id_match_wins_over_name_match() {
		let mut catalog = sample_catalog();
		catalog.services.push(Service {
			id: "redis".into(),
			name: "redis-by-id".into(),
			plans: vec![Plan {
				id: "plan-odd".into(),
				name: "odd".into(),
				..Default::default()
			}],
			..Default::default()
		});

		let resolved = catalog.resolve_plan("redis", "odd").unwrap();
		assert_eq!(resolved.service_id, "redis");
		assert_eq!(resolved.plan_id, "plan-odd");

		assert!(catalog.resolve_plan("redis", "small").is_err());
	}

	#[test]
	fn test_first_name_match_wins() {
		let mut catalog = sample_catalog();
		catalog.services.push(Service {
			id: "svc-pg-2".into(),
			name: "postgres".into(),
			plans: vec![Plan {
				id: "plan-other".into(),
				name: "small".into(),
				..Default::default()
			}],
			..Default::default()
		});

		let resolved = catalog.resolve_plan("postgres", "small").unwrap();
		assert_eq!(resolved.service_id, "svc-pg");
		assert_eq!(resolved.plan_id, "plan-pg-small");
	}

	#[test]
	fn test_unknown_service_and_plan() {
		let catalog = sample_catalog();

		let err = catalog.resolve_plan("mysql", "small").unwrap_err();
		assert!(matches!(err, OsbError::NotFound(_)));
		assert_eq!(err.to_string(), "no such service: mysql");

		let err = catalog.resolve_plan("postgres", "tiny").unwrap_err();
		assert!(matches!(err, OsbError::NotFound(_)));
		assert_eq!(err.to_string(), "no such plan: postgres / tiny");
	}

	#[test]
	fn test_tri_state_flags_inherit() {
		let catalog = sample_catalog();
		let redis = &catalog.services[0];
		let pg = &catalog.services[1];

		assert_eq!(redis.plans[0].bindable, Flag::Unset);
		assert!(redis.plan_is_bindable(&redis.plans[0]));
		assert!(!redis.plan_is_bindable(&redis.plans[1]));

		assert!(pg.plan_is_bindable(&pg.plans[0]));
		assert!(!pg.plan_is_bindable(&pg.plans[1]));

		assert!(redis.plans[0].is_free());
		assert!(!redis.plans[1].is_free());
	}

	#[test]
	fn test_unset_flags_are_not_serialized() {
		let plan = Plan {
			id: "p".into(),
			name: "p".into(),
			free: Flag::False,
			..Default::default()
		};
		let json = serde_json::to_value(&plan).unwrap();
		assert_eq!(json["free"], serde_json::json!(false));
		assert!(json.get("bindable").is_none());
	}

	#[test]
	fn test_null_flag_is_unset() {
		let plan: Plan =
			serde_json::from_str(r#"{"id":"p","name":"p","free":null}"#).unwrap();
		assert_eq!(plan.free, Flag::Unset);
	}
}
