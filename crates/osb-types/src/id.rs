//! Identifiers for instances and bindings the caller did not name.

use uuid::Uuid;

/// A random (v4) UUID in its hyphenated form.
pub fn generate_id() -> String {
	Uuid::new_v4().to_string()
}

/// `id` unless it is absent or empty, in which case a fresh one.
pub fn id_or_generate(id: Option<&str>) -> String {
	match id {
		Some(id) if !id.is_empty() => id.to_string(),
		_ => generate_id(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_generated_ids_are_uuids_and_distinct() {
		let a = generate_id();
		let b = generate_id();
		assert_ne!(a, b);
		assert!(Uuid::parse_str(&a).is_ok());
	}

	#[test]
	fn test_supplied_id_is_kept() {
		assert_eq!(id_or_generate(Some("i1")), "i1");
		assert_ne!(id_or_generate(Some("")), "");
		assert_ne!(id_or_generate(None), "");
	}
}
