//! The static content catalog: panels, their groups and the documented
//! parameters inside each group.
//!
//! The catalog is read-only input. It defines every valid [`ParameterKey`]
//! and the optional default image each parameter starts with.

use serde::{Deserialize, Serialize};

use crate::model::{ImageEntry, ParameterKey};

/// Catalog bundled with the site.
const BUNDLED_CATALOG: &str = include_str!("../assets/catalog.json");

/// Top-level catalog definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Panels in display order
    pub panels: Vec<Panel>,
}

/// A top-level documentation section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Panel {
    /// Stable identifier, also the section's fragment id
    pub id: String,
    /// Display name
    pub name: String,
    /// Subtitle shown under the panel heading
    #[serde(default)]
    pub description: String,
    /// Optional icon reference for the navigation entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Parameter groups in display order
    #[serde(default)]
    pub groups: Vec<Group>,
}

/// A group of related parameters inside a panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Identifier, unique within its panel
    pub id: String,
    /// Display name
    pub name: String,
    /// Group description
    #[serde(default)]
    pub description: String,
    /// Parameters in display order
    #[serde(default)]
    pub params: Vec<Param>,
}

/// A single documented parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    /// Identifier, unique within its group
    pub id: String,
    /// Display name
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub desc: String,
    /// Default image reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A parameter together with the ids that locate it.
#[derive(Debug, Clone, Copy)]
pub struct ParamRef<'a> {
    pub panel: &'a Panel,
    pub group: &'a Group,
    pub param: &'a Param,
}

impl ParamRef<'_> {
    /// Composite key for this parameter.
    pub fn key(&self) -> ParameterKey {
        ParameterKey::new(&self.panel.id, &self.group.id, &self.param.id)
    }

    /// Catalog default image, if one is declared and not blank.
    pub fn default_image(&self) -> Option<ImageEntry> {
        self.param.image.as_deref().and_then(ImageEntry::new)
    }
}

impl Catalog {
    /// Parse a catalog from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The catalog shipped with the site.
    pub fn bundled() -> Result<Self, serde_json::Error> {
        Self::from_json(BUNDLED_CATALOG)
    }

    /// Iterate every parameter in display order.
    pub fn params(&self) -> impl Iterator<Item = ParamRef<'_>> {
        self.panels.iter().flat_map(|panel| {
            panel.groups.iter().flat_map(move |group| {
                group
                    .params
                    .iter()
                    .map(move |param| ParamRef { panel, group, param })
            })
        })
    }

    /// Every parameter key, in display order.
    pub fn keys(&self) -> Vec<ParameterKey> {
        self.params().map(|p| p.key()).collect()
    }

    /// Number of documented parameters.
    pub fn len(&self) -> usize {
        self.panels
            .iter()
            .flat_map(|p| &p.groups)
            .map(|g| g.params.len())
            .sum()
    }

    /// Whether the catalog documents no parameters at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find a panel by id.
    pub fn panel(&self, id: &str) -> Option<&Panel> {
        self.panels.iter().find(|p| p.id == id)
    }

    /// Resolve a key string to a known parameter.
    pub fn lookup(&self, key: &str) -> Option<ParamRef<'_>> {
        self.params().find(|p| p.key().as_str() == key)
    }

    /// The parameter a key names.
    pub fn param(&self, key: &str) -> Option<&Param> {
        self.lookup(key).map(|p| p.param)
    }

    /// Whether the key names a documented parameter.
    pub fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Declared default image for a key.
    pub fn default_image(&self, key: &str) -> Option<ImageEntry> {
        self.lookup(key).and_then(|p| p.default_image())
    }

    /// Keys of the parameters under one panel, in display order.
    pub fn panel_keys(&self, panel_id: &str) -> Vec<ParameterKey> {
        self.panel(panel_id)
            .map(|panel| {
                panel
                    .groups
                    .iter()
                    .flat_map(|group| {
                        group
                            .params
                            .iter()
                            .map(move |param| ParameterKey::new(&panel.id, &group.id, &param.id))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::sample_catalog;
    use super::*;

    #[test]
    fn test_keys_in_display_order() {
        let catalog = sample_catalog();
        let keys: Vec<String> = catalog.keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(
            keys,
            vec![
                "impostor-distribution-azimuth",
                "impostor-distribution-pole-scaling",
                "capture-shading-translucency",
                "capture-shading-capture-shadows",
            ]
        );
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn test_blank_default_image_is_absent() {
        let catalog = sample_catalog();
        assert!(catalog.default_image("impostor-distribution-pole-scaling").is_none());
        assert!(catalog.default_image("capture-shading-capture-shadows").is_none());
        assert_eq!(
            catalog
                .default_image("impostor-distribution-azimuth")
                .map(|e| e.to_string()),
            Some("azimuth.svg".to_string())
        );
    }

    #[test]
    fn test_lookup_unknown_key() {
        let catalog = sample_catalog();
        assert!(!catalog.contains("impostor-distribution"));
        assert!(catalog.lookup("nope").is_none());
        assert!(catalog.param("nope").is_none());
        assert_eq!(
            catalog
                .param("capture-shading-capture-shadows")
                .map(|p| p.name.as_str()),
            Some("Capture Shadows")
        );
    }

    #[test]
    fn test_panel_keys() {
        let catalog = sample_catalog();
        assert_eq!(catalog.panel_keys("capture").len(), 2);
        assert!(catalog.panel_keys("missing").is_empty());
    }

    #[test]
    fn test_hyphenated_panel_ids_resolve_by_lookup() {
        let catalog = Catalog::bundled().unwrap();
        let key = "channel-packing-pbrmap-pbrmap-channels";
        let found = catalog.lookup(key).unwrap();
        assert_eq!(found.panel.id, "channel-packing");
        assert_eq!(found.group.id, "pbrmap");
        assert_eq!(found.param.id, "pbrmap-channels");
        assert_eq!(found.key().as_str(), key);
        assert!(catalog.panel_keys("channel").is_empty());
        assert!(
            catalog
                .panel_keys("channel-packing")
                .iter()
                .any(|k| k.as_str() == key)
        );
    }

    #[test]
    fn test_bundled_catalog_parses() {
        let catalog = Catalog::bundled().unwrap();
        assert!(catalog.panel("impostor").is_some());
        assert!(catalog.contains("capture-shading-translucency"));
        assert_eq!(
            catalog
                .default_image("impostor-distribution-azimuth")
                .map(|e| e.to_string()),
            Some("images/params/azimuth.svg".to_string())
        );
    }
}
