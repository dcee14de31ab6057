/// Persisted preference record
///
/// Exactly two fields on disk: `dismissed` and `alternatives`.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// User preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Recommendation ids the user never wants to see again
    #[serde(default, deserialize_with = "null_as_default")]
    pub dismissed: BTreeSet<String>,
    /// Suggested tool -> tool the user chose instead
    #[serde(default, deserialize_with = "null_as_default")]
    pub alternatives: BTreeMap<String, String>,
}

impl Preferences {
    pub fn is_dismissed(&self, id: &str) -> bool {
        self.dismissed.contains(id)
    }

    /// The tool the user picked in place of `tool`, if any
    pub fn alternative_for(&self, tool: &str) -> Option<&str> {
        self.alternatives.get(tool).map(String::as_str)
    }

    /// Returns true when the id was newly added
    pub fn dismiss(&mut self, id: &str) -> bool {
        self.dismissed.insert(id.to_string())
    }

    /// Returns true when the id was present
    pub fn undismiss(&mut self, id: &str) -> bool {
        self.dismissed.remove(id)
    }

    /// Overwrites any previous mapping for `from`
    pub fn set_alternative(&mut self, from: &str, to: &str) {
        self.alternatives.insert(from.to_string(), to.to_string());
    }

    pub fn clear(&mut self) {
        self.dismissed.clear();
        self.alternatives.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.dismissed.is_empty() && self.alternatives.is_empty()
    }
}

/// Treat an explicit `null` like a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
