//! Parameter keys: the composite identifier shared by the catalog, the
//! image store, the carousel and the navigation fragment.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between the panel, group and parameter ids.
pub const KEY_SEPARATOR: char = '-';

/// Composite identifier `panelId-groupId-paramId`.
///
/// Ids may themselves contain the separator (`pole-scaling`), so a key
/// string cannot be split back into its parts; resolve it against the
/// catalog instead (see [`crate::catalog::Catalog::lookup`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterKey(String);

impl ParameterKey {
    /// Build a key from its three parts.
    pub fn new(panel_id: &str, group_id: &str, param_id: &str) -> Self {
        Self(format!(
            "{panel_id}{KEY_SEPARATOR}{group_id}{KEY_SEPARATOR}{param_id}"
        ))
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ParameterKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ParameterKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        let key = ParameterKey::new("impostor", "distribution", "azimuth");
        assert_eq!(key.as_str(), "impostor-distribution-azimuth");
        assert_eq!(key.to_string(), "impostor-distribution-azimuth");
    }

    #[test]
    fn test_borrow_as_str_lookup() {
        let mut map = std::collections::HashMap::new();
        map.insert(ParameterKey::new("a", "b", "c"), 1);
        assert_eq!(map.get("a-b-c"), Some(&1));
    }
}
