//! Records persisted in the state document.

use crate::serde_helpers::null_as_default;
use osb_types::JsonMap;
use serde::{Deserialize, Serialize};

/// All instances known for one broker endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrokerRecord {
	/// Endpoint URL, stored without its trailing slash.
	pub broker: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub instances: Vec<InstanceRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
	pub id: String,
	pub service_id: String,
	pub plan_id: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub bindings: Vec<BindingRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindingRecord {
	pub id: String,
	/// Stored exactly as the broker returned it.
	#[serde(default, deserialize_with = "null_as_default")]
	pub credentials: JsonMap,
}

/// What the store knows about a binding, found by binding ID alone.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingLookup {
	pub instance_id: String,
	pub service_id: String,
	pub plan_id: String,
	pub credentials: JsonMap,
}
