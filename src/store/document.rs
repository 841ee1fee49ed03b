//! The flat JSON document shared by persistence, import and export:
//! `{ "<panel>-<group>-<param>": ["<image ref>", ...], ... }`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;
use crate::model::ImageEntry;

/// Default file name offered when exporting.
pub const EXPORT_FILENAME: &str = "rawteous-images.json";

/// Key → image references, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageDocument {
    entries: BTreeMap<String, Vec<String>>,
}

impl ImageDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse document text. Anything other than an object of string arrays
    /// is rejected; blank references inside an array are dropped.
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let mut doc: Self = serde_json::from_str(text)?;
        for refs in doc.entries.values_mut() {
            refs.retain(|r| ImageEntry::new(r).is_some());
        }
        Ok(doc)
    }

    /// Compact JSON, used for the persisted record.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Indented JSON, used for export files.
    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Set the references for a key, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, entries: Vec<ImageEntry>) {
        self.entries.insert(
            key.into(),
            entries.into_iter().map(ImageEntry::into_string).collect(),
        );
    }

    /// Raw references for a key.
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Iterate keys with their references as validated entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Vec<ImageEntry>)> {
        self.entries.iter().map(|(key, refs)| {
            (
                key.as_str(),
                refs.iter().filter_map(|r| ImageEntry::new(r)).collect(),
            )
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flat_object() {
        let raw = r#"{"capture-shading-translucency": ["a.png", "b.png"]}"#;
        let doc = ImageDocument::parse(raw).unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(
            doc.get("capture-shading-translucency").unwrap(),
            &["a.png".to_string(), "b.png".to_string()]
        );
    }

    #[test]
    fn test_parse_drops_blank_refs() {
        let doc = ImageDocument::parse(r#"{"k": ["", "  ", "x.png"]}"#).unwrap();
        assert_eq!(doc.get("k").unwrap(), &["x.png".to_string()]);
    }

    #[test]
    fn test_parse_rejects_wrong_shapes() {
        assert!(ImageDocument::parse("not json").is_err());
        assert!(ImageDocument::parse("[]").is_err());
        assert!(ImageDocument::parse(r#"{"k": "a.png"}"#).is_err());
        assert!(ImageDocument::parse(r#"{"k": [1, 2]}"#).is_err());
    }

    #[test]
    fn test_pretty_output_is_parseable() {
        let mut doc = ImageDocument::new();
        doc.insert("b", vec![ImageEntry::new("2.png").unwrap()]);
        doc.insert("a", vec![]);
        let text = doc.to_json_pretty().unwrap();
        assert!(text.find("\"a\"").unwrap() < text.find("\"b\"").unwrap());
        assert_eq!(ImageDocument::parse(&text).unwrap(), doc);
    }
}
