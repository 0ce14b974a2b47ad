//! The local mirror of broker → instance → binding records.
//!
//! The whole document is read once, mutated in memory and written back in
//! one piece. Nothing guards the file against a concurrent writer; the last
//! `save` wins.

use crate::records::{BindingLookup, BindingRecord, BrokerRecord, InstanceRecord};
use crate::serde_helpers::null_as_default;
use osb_types::{JsonMap, OsbError, ResolvedPlan, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};

/// Strips exactly one trailing slash. No other normalization is applied.
pub fn normalize_broker_url(url: &str) -> &str {
	url.strip_suffix('/').unwrap_or(url)
}

impl BrokerRecord {
	/// Whether this bucket holds records for `url`.
	pub fn serves(&self, url: &str) -> bool {
		normalize_broker_url(&self.broker) == normalize_broker_url(url)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateStore {
	#[serde(default, deserialize_with = "null_as_default")]
	data: Vec<BrokerRecord>,
}

impl StateStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Reads the store from `path`. A missing file is a first run and yields
	/// an empty store.
	pub async fn load(path: &Path) -> Result<Self> {
		let bytes = match fs::read(path).await {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				debug!("No state file at {:?}, starting empty", path);
				return Ok(Self::default());
			}
			Err(e) => return Err(e.into()),
		};

		let content = String::from_utf8(bytes)
			.map_err(|e| OsbError::Parse(format!("{}: {}", path.display(), e)))?;
		let store = Self::from_yaml(&content)
			.map_err(|e| OsbError::Parse(format!("{}: {}", path.display(), e)))?;
		debug!("Loaded {} broker(s) from {:?}", store.data.len(), path);
		Ok(store)
	}

	/// Writes the entire store to `path`, creating parent directories.
	pub async fn save(&self, path: &Path) -> Result<()> {
		let content = serde_yaml::to_string(self).map_err(|e| OsbError::Parse(e.to_string()))?;

		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).await?;
		}
		fs::write(path, content).await?;

		debug!("Saved state to {:?}", path);
		Ok(())
	}

	fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
		if content.trim().is_empty() {
			return Ok(Self::default());
		}
		serde_yaml::from_str(content)
	}

	/// All broker buckets, in insertion order.
	pub fn brokers(&self) -> &[BrokerRecord] {
		&self.data
	}

	pub fn is_empty(&self) -> bool {
		self.data.iter().all(|b| b.instances.is_empty())
	}

	fn find_instance(&self, url: &str, id: &str) -> Option<&InstanceRecord> {
		self.data
			.iter()
			.filter(|b| b.serves(url))
			.flat_map(|b| b.instances.iter())
			.find(|i| i.id == id)
	}

	fn find_instance_mut(&mut self, url: &str, id: &str) -> Option<&mut InstanceRecord> {
		self.data
			.iter_mut()
			.filter(|b| b.serves(url))
			.flat_map(|b| b.instances.iter_mut())
			.find(|i| i.id == id)
	}

	/// Appends an instance under `broker_url`, creating the bucket on first
	/// use. Duplicate IDs are not checked; lookups return the first.
	pub fn add_instance(&mut self, broker_url: &str, id: &str, service_id: &str, plan_id: &str) {
		let instance = InstanceRecord {
			id: id.to_string(),
			service_id: service_id.to_string(),
			plan_id: plan_id.to_string(),
			bindings: Vec::new(),
		};

		match self.data.iter().position(|b| b.serves(broker_url)) {
			Some(pos) => self.data[pos].instances.push(instance),
			None => self.data.push(BrokerRecord {
				broker: normalize_broker_url(broker_url).to_string(),
				instances: vec![instance],
			}),
		}
	}

	/// Removes the first instance with this ID. Returns whether one was found.
	pub fn remove_instance(&mut self, broker_url: &str, id: &str) -> bool {
		for bucket in self.data.iter_mut().filter(|b| b.serves(broker_url)) {
			if let Some(pos) = bucket.instances.iter().position(|i| i.id == id) {
				bucket.instances.remove(pos);
				return true;
			}
		}
		false
	}

	/// The service and plan an instance was provisioned from.
	pub fn lookup_instance(&self, broker_url: &str, id: &str) -> Result<ResolvedPlan> {
		self.find_instance(broker_url, id)
			.map(|i| ResolvedPlan {
				service_id: i.service_id.clone(),
				plan_id: i.plan_id.clone(),
			})
			.ok_or_else(|| OsbError::NotFound(format!("service instance '{}' not found", id)))
	}

	/// Appends a binding under an instance already in the store. Returns
	/// `false`, leaving the store untouched, when the instance is unknown.
	pub fn add_binding(
		&mut self,
		broker_url: &str,
		instance_id: &str,
		binding_id: &str,
		credentials: JsonMap,
	) -> bool {
		match self.find_instance_mut(broker_url, instance_id) {
			Some(instance) => {
				instance.bindings.push(BindingRecord {
					id: binding_id.to_string(),
					credentials,
				});
				true
			}
			None => {
				warn!(
					"Not recording binding {}: instance {} is not in the local store",
					binding_id, instance_id
				);
				false
			}
		}
	}

	/// Removes the first matching binding under the instance. Siblings are
	/// left alone.
	pub fn remove_binding(&mut self, broker_url: &str, instance_id: &str, binding_id: &str) -> bool {
		let Some(instance) = self.find_instance_mut(broker_url, instance_id) else {
			return false;
		};
		match instance.bindings.iter().position(|b| b.id == binding_id) {
			Some(pos) => {
				instance.bindings.remove(pos);
				true
			}
			None => false,
		}
	}

	/// Finds a binding by its ID alone, scanning instances in order.
	pub fn lookup_binding(&self, broker_url: &str, binding_id: &str) -> Result<BindingLookup> {
		self.data
			.iter()
			.filter(|b| b.serves(broker_url))
			.flat_map(|b| b.instances.iter())
			.find_map(|i| {
				i.bindings
					.iter()
					.find(|b| b.id == binding_id)
					.map(|b| BindingLookup {
						instance_id: i.id.clone(),
						service_id: i.service_id.clone(),
						plan_id: i.plan_id.clone(),
						credentials: b.credentials.clone(),
					})
			})
			.ok_or_else(|| {
				OsbError::NotFound(format!(
					"service instance binding '{}' not found",
					binding_id
				))
			})
	}

	/// Finds a binding under a specific instance.
	pub fn lookup_binding_in(
		&self,
		broker_url: &str,
		instance_id: &str,
		binding_id: &str,
	) -> Result<&BindingRecord> {
		self.find_instance(broker_url, instance_id)
			.and_then(|i| i.bindings.iter().find(|b| b.id == binding_id))
			.ok_or_else(|| {
				OsbError::NotFound(format!(
					"service instance binding '{}' not found under instance '{}'",
					binding_id, instance_id
				))
			})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use tempfile::TempDir;

	const BROKER: &str = "https://broker.example.com";

	fn creds(value: serde_json::Value) -> JsonMap {
		value.as_object().cloned().unwrap()
	}

	#[test]
	fn test_normalize_strips_one_slash_only() {
		assert_eq!(normalize_broker_url("http://b/"), "http://b");
		assert_eq!(normalize_broker_url("http://b//"), "http://b/");
		assert_eq!(normalize_broker_url("http://b"), "http://b");
		assert_eq!(normalize_broker_url("HTTP://B"), "HTTP://B");
	}

	#[test]
	fn test_instance_lifecycle() {
		let mut store = StateStore::new();
		assert!(store.lookup_instance(BROKER, "i1").is_err());

		store.add_instance(BROKER, "i1", "s1", "p1");
		let plan = store.lookup_instance(BROKER, "i1").unwrap();
		assert_eq!(plan.service_id, "s1");
		assert_eq!(plan.plan_id, "p1");

		assert!(store.remove_instance(BROKER, "i1"));
		let err = store.lookup_instance(BROKER, "i1").unwrap_err();
		assert!(matches!(err, OsbError::NotFound(_)));
		assert!(err.is_recoverable());

		// Removing again is a no-op; the empty bucket stays.
		assert!(!store.remove_instance(BROKER, "i1"));
		assert_eq!(store.brokers().len(), 1);
		assert!(store.is_empty());
	}

	#[test]
	fn test_trailing_slash_is_ignored_both_ways() {
		let mut store = StateStore::new();
		store.add_instance("http://b/", "i1", "s1", "p1");
		store.add_binding("http://b", "i1", "b1", JsonMap::new());

		assert_eq!(store.brokers()[0].broker, "http://b");
		assert!(store.lookup_instance("http://b", "i1").is_ok());
		assert!(store.lookup_instance("http://b/", "i1").is_ok());
		assert!(store.lookup_binding("http://b/", "b1").is_ok());
		assert!(store.lookup_binding_in("http://b", "i1", "b1").is_ok());

		// No other normalization.
		assert!(store.lookup_instance("http://B", "i1").is_err());
		assert!(store.lookup_instance("http://b:80", "i1").is_err());
	}

	#[test]
	fn test_brokers_are_kept_apart() {
		let mut store = StateStore::new();
		store.add_instance("http://one", "i1", "s1", "p1");
		store.add_instance("http://two", "i1", "s2", "p2");

		assert_eq!(store.lookup_instance("http://one", "i1").unwrap().service_id, "s1");
		assert_eq!(store.lookup_instance("http://two", "i1").unwrap().service_id, "s2");
		assert!(store.lookup_instance("http://three", "i1").is_err());

		store.remove_instance("http://two", "i1");
		assert!(store.lookup_instance("http://one", "i1").is_ok());
	}

	#[test]
	fn test_duplicate_instances_first_wins() {
		let mut store = StateStore::new();
		store.add_instance(BROKER, "i1", "s1", "p1");
		store.add_instance(BROKER, "i1", "s2", "p2");
		assert_eq!(store.brokers()[0].instances.len(), 2);
		assert_eq!(store.lookup_instance(BROKER, "i1").unwrap().service_id, "s1");

		store.remove_instance(BROKER, "i1");
		assert_eq!(store.lookup_instance(BROKER, "i1").unwrap().service_id, "s2");
	}

	#[test]
	fn test_binding_removal_leaves_siblings() {
		let mut store = StateStore::new();
		store.add_instance(BROKER, "i1", "s1", "p1");
		assert!(store.add_binding(BROKER, "i1", "b1", creds(json!({"user": "a"}))));
		assert!(store.add_binding(BROKER, "i1", "b2", creds(json!({"user": "b"}))));
		assert!(store.add_binding(BROKER, "i1", "b3", JsonMap::new()));

		assert!(store.remove_binding(BROKER, "i1", "b2"));

		let ids: Vec<_> = store.brokers()[0].instances[0]
			.bindings
			.iter()
			.map(|b| b.id.as_str())
			.collect();
		assert_eq!(ids, vec!["b1", "b3"]);
		assert!(store.lookup_binding(BROKER, "b2").is_err());
		assert!(!store.remove_binding(BROKER, "i1", "b2"));
		assert!(!store.remove_binding(BROKER, "nope", "b1"));
	}

	#[test]
	fn test_lookup_binding_reports_owning_instance() {
		let mut store = StateStore::new();
		store.add_instance(BROKER, "i1", "s1", "p1");
		store.add_instance(BROKER, "i2", "s2", "p2");
		store.add_binding(BROKER, "i2", "b9", creds(json!({"password": "x"})));

		let found = store.lookup_binding(BROKER, "b9").unwrap();
		assert_eq!(found.instance_id, "i2");
		assert_eq!(found.service_id, "s2");
		assert_eq!(found.plan_id, "p2");
		assert_eq!(found.credentials["password"], json!("x"));

		let err = store.lookup_binding_in(BROKER, "i1", "b9").unwrap_err();
		assert!(matches!(err, OsbError::NotFound(_)));
	}

	#[test]
	fn test_binding_for_unknown_instance_is_not_recorded() {
		let mut store = StateStore::new();
		assert!(!store.add_binding(BROKER, "ghost", "b1", JsonMap::new()));
		assert!(store.brokers().is_empty());
	}

	#[tokio::test]
	async fn test_missing_file_is_empty_store() {
		let dir = TempDir::new().unwrap();
		let store = StateStore::load(&dir.path().join("absent.yml")).await.unwrap();
		assert_eq!(store, StateStore::default());
	}

	#[tokio::test]
	async fn test_invalid_file_is_parse_error() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("osbrc");
		std::fs::write(&path, "data: [ {broker: \"x\", instances: 12 ").unwrap();

		let err = StateStore::load(&path).await.unwrap_err();
		assert!(matches!(err, OsbError::Parse(_)));
	}

	#[tokio::test]
	async fn test_non_utf8_file_is_parse_error() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("osbrc");
		std::fs::write(&path, b"data:\n- broker: \xff\xfe\n").unwrap();

		let err = StateStore::load(&path).await.unwrap_err();
		assert!(matches!(err, OsbError::Parse(_)));
	}

	#[tokio::test]
	async fn test_empty_file_is_empty_store() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("osbrc");
		std::fs::write(&path, "\n").unwrap();
		assert!(StateStore::load(&path).await.unwrap().brokers().is_empty());
	}

	#[tokio::test]
	async fn test_save_and_reload() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("nested").join("osbrc");

		let mut store = StateStore::new();
		store.add_instance(BROKER, "i1", "s1", "p1");
		store.add_binding(
			BROKER,
			"i1",
			"b1",
			creds(json!({"uri": "redis://h:6379", "port": 6379, "tls": true})),
		);
		store.save(&path).await.unwrap();

		let reloaded = StateStore::load(&path).await.unwrap();
		assert_eq!(reloaded, store);

		let instance = &reloaded.brokers()[0].instances[0];
		assert_eq!(instance.id, "i1");
		assert_eq!(instance.service_id, "s1");
		assert_eq!(instance.plan_id, "p1");
	}

	#[tokio::test]
	async fn test_reads_documents_with_null_collections() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("osbrc");
		std::fs::write(
			&path,
			r#"data:
- broker: https://broker.example.com/
  instances:
  - id: i1
    service_id: s1
    plan_id: p1
    bindings:
    - id: b1
      credentials: null
  - id: i2
    service_id: s2
    plan_id: p2
    bindings: null
"#,
		)
		.unwrap();

		let store = StateStore::load(&path).await.unwrap();
		assert!(store.lookup_instance(BROKER, "i2").is_ok());
		let found = store.lookup_binding(BROKER, "b1").unwrap();
		assert!(found.credentials.is_empty());
	}
}
