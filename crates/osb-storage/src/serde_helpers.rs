//! Serde helpers for the state document

use serde::{Deserialize, Deserializer};

/// Deserializes an explicit `null` (as older writers emit for empty
/// sequences and maps) the same as a missing field.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de> + Default,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
