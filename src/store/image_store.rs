//! Per-parameter image lists with synchronous persistence.
//!
//! The store is seeded from the catalog's default images, then overridden
//! by whatever a previous session persisted for the same keys. Every
//! mutation writes the whole store back before returning.

use std::collections::BTreeMap;

use crate::catalog::Catalog;
use crate::model::{ImageEntry, ParameterKey};
use crate::store::document::ImageDocument;
use crate::store::storage::Storage;

/// Namespace of the persisted record.
pub const DEFAULT_STORAGE_KEY: &str = "rawteous_images";

/// What a mutation changed. Handed to every view that mirrors the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    /// An entry was appended to `key`; the list now has `len` entries.
    Appended { key: ParameterKey, len: usize },
    /// The entry at `index` was removed from `key`.
    Removed {
        key: ParameterKey,
        index: usize,
        len: usize,
    },
    /// A bulk import replaced the lists of these keys.
    Imported { keys: Vec<ParameterKey> },
}

impl StoreChange {
    /// Keys whose list changed shape.
    pub fn keys(&self) -> Vec<&ParameterKey> {
        match self {
            StoreChange::Appended { key, .. } | StoreChange::Removed { key, .. } => vec![key],
            StoreChange::Imported { keys } => keys.iter().collect(),
        }
    }
}

/// Keyed image store, the single source of truth for which images each
/// parameter has.
pub struct ImageStore<S: Storage> {
    images: BTreeMap<ParameterKey, Vec<ImageEntry>>,
    /// Persisted lists for keys the current catalog does not know.
    /// Written back untouched so a later catalog can reclaim them.
    dormant: BTreeMap<String, Vec<ImageEntry>>,
    storage: S,
    storage_key: String,
}

impl<S: Storage> ImageStore<S> {
    /// Build the store from catalog defaults merged with the persisted record.
    pub fn load(catalog: &Catalog, storage: S, storage_key: &str) -> Self {
        let mut images: BTreeMap<ParameterKey, Vec<ImageEntry>> = catalog
            .params()
            .map(|p| (p.key(), p.default_image().into_iter().collect()))
            .collect();
        let mut dormant = BTreeMap::new();

        match storage.get_item(storage_key) {
            Ok(Some(text)) => match ImageDocument::parse(&text) {
                Ok(doc) => {
                    let mut restored = 0;
                    for (key, entries) in doc.iter() {
                        if let Some(list) = images.get_mut(key) {
                            *list = entries;
                            restored += 1;
                        } else {
                            dormant.insert(key.to_string(), entries);
                        }
                    }
                    log::info!(
                        "Restored images for {} parameters ({} unknown keys kept aside)",
                        restored,
                        dormant.len()
                    );
                }
                Err(e) => log::warn!("Ignoring unreadable image record '{}': {}", storage_key, e),
            },
            Ok(None) => log::debug!("No persisted image record '{}'", storage_key),
            Err(e) => log::warn!("Failed to read image record '{}': {}", storage_key, e),
        }

        Self {
            images,
            dormant,
            storage,
            storage_key: storage_key.to_string(),
        }
    }

    /// Images for a key; empty for unknown keys.
    pub fn get(&self, key: &str) -> &[ImageEntry] {
        self.images.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of images for a key.
    pub fn count(&self, key: &str) -> usize {
        self.get(key).len()
    }

    /// Whether the store holds a list for this key.
    pub fn contains(&self, key: &str) -> bool {
        self.images.contains_key(key)
    }

    /// Keys with a list, ordered by key.
    pub fn keys(&self) -> impl Iterator<Item = &ParameterKey> {
        self.images.keys()
    }

    /// Append an entry, creating the list if needed.
    pub fn append(&mut self, key: &ParameterKey, entry: ImageEntry) -> StoreChange {
        log::debug!("Appending {} to {}", entry.summary(), key);
        let list = self.images.entry(key.clone()).or_default();
        list.push(entry);
        let len = list.len();
        self.persist();
        StoreChange::Appended {
            key: key.clone(),
            len,
        }
    }

    /// Remove the entry at `index`. Unknown keys and stale indices are no-ops.
    pub fn remove_at(&mut self, key: &str, index: usize) -> Option<StoreChange> {
        let (key, list) = self.images.get_key_value(key)?;
        if index >= list.len() {
            log::debug!(
                "Ignoring removal of index {} from {} ({} images)",
                index,
                key,
                list.len()
            );
            return None;
        }
        let key = key.clone();
        let list = self.images.get_mut(&key)?;
        let removed = list.remove(index);
        let len = list.len();
        log::debug!("Removed {} from {}", removed.summary(), key);
        self.persist();
        Some(StoreChange::Removed { key, index, len })
    }

    /// Merge a document: listed keys are overwritten, all others untouched.
    /// Keys the catalog does not know are kept aside like on load.
    pub fn replace_all(&mut self, doc: &ImageDocument) -> StoreChange {
        let mut keys = Vec::new();
        for (key, entries) in doc.iter() {
            match self.images.get_key_value(key) {
                Some((known, _)) => {
                    let known = known.clone();
                    self.images.insert(known.clone(), entries);
                    keys.push(known);
                }
                None => {
                    log::debug!("Import key '{}' is not in the catalog, keeping aside", key);
                    self.dormant.insert(key.to_string(), entries);
                }
            }
        }
        log::info!("Imported images for {} parameters", keys.len());
        self.persist();
        StoreChange::Imported { keys }
    }

    /// Full dump of the visible store.
    pub fn export(&self) -> ImageDocument {
        let mut doc = ImageDocument::new();
        for (key, entries) in &self.images {
            doc.insert(key.as_str(), entries.clone());
        }
        doc
    }

    /// Number of persisted keys the catalog does not know.
    pub fn dormant_count(&self) -> usize {
        self.dormant.len()
    }

    /// The persistence backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Write the whole store, dormant keys included. Failures are logged;
    /// the in-memory state stays authoritative.
    fn persist(&mut self) {
        let mut doc = self.export();
        for (key, entries) in &self.dormant {
            doc.insert(key.as_str(), entries.clone());
        }
        let json = match doc.to_json() {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to serialize image store: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set_item(&self.storage_key, &json) {
            log::warn!("Failed to persist image store: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::sample_catalog;
    use crate::store::storage::MemoryStorage;

    fn entry(s: &str) -> ImageEntry {
        ImageEntry::new(s).unwrap()
    }

    fn azimuth() -> ParameterKey {
        ParameterKey::new("impostor", "distribution", "azimuth")
    }

    fn fresh_store() -> ImageStore<MemoryStorage> {
        ImageStore::load(&sample_catalog(), MemoryStorage::new(), DEFAULT_STORAGE_KEY)
    }

    fn persisted(store: &ImageStore<MemoryStorage>) -> ImageDocument {
        let text = store
            .storage()
            .get_item(DEFAULT_STORAGE_KEY)
            .unwrap()
            .expect("store was persisted");
        ImageDocument::parse(&text).unwrap()
    }

    #[test]
    fn test_seeded_from_catalog_defaults() {
        let store = fresh_store();
        assert_eq!(store.get("impostor-distribution-azimuth"), &[entry("azimuth.svg")]);
        assert!(store.get("impostor-distribution-pole-scaling").is_empty());
        assert!(store.contains("impostor-distribution-pole-scaling"));
        assert!(store.get("unknown").is_empty());
    }

    #[test]
    fn test_persisted_overrides_default() {
        let storage = MemoryStorage::new().with_item(
            DEFAULT_STORAGE_KEY,
            r#"{"impostor-distribution-azimuth": ["mine.png"], "retired-key": ["x.png"]}"#,
        );
        let store = ImageStore::load(&sample_catalog(), storage, DEFAULT_STORAGE_KEY);
        assert_eq!(store.get("impostor-distribution-azimuth"), &[entry("mine.png")]);
        assert!(store.get("retired-key").is_empty());
        assert!(!store.contains("retired-key"));
        assert_eq!(store.dormant_count(), 1);
        assert_eq!(store.get("capture-shading-translucency"), &[entry("translucency.svg")]);
    }

    #[test]
    fn test_corrupt_record_falls_back_to_defaults() {
        let storage = MemoryStorage::new().with_item(DEFAULT_STORAGE_KEY, "{oops");
        let store = ImageStore::load(&sample_catalog(), storage, DEFAULT_STORAGE_KEY);
        assert_eq!(store.get("impostor-distribution-azimuth"), &[entry("azimuth.svg")]);
    }

    #[test]
    fn test_append_persists() {
        let mut store = fresh_store();
        let change = store.append(&azimuth(), entry("http://x/img.png"));
        assert_eq!(
            change,
            StoreChange::Appended {
                key: azimuth(),
                len: 2
            }
        );
        assert_eq!(
            persisted(&store).get("impostor-distribution-azimuth").unwrap(),
            &["azimuth.svg".to_string(), "http://x/img.png".to_string()]
        );
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let mut store = fresh_store();
        assert!(store.remove_at("impostor-distribution-azimuth", 1).is_none());
        assert!(store.remove_at("unknown", 0).is_none());
        assert_eq!(store.count("impostor-distribution-azimuth"), 1);
        // No-ops do not write.
        assert!(store.storage().get_item(DEFAULT_STORAGE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_remove_at() {
        let mut store = fresh_store();
        store.append(&azimuth(), entry("b.png"));
        let change = store.remove_at("impostor-distribution-azimuth", 0).unwrap();
        assert_eq!(
            change,
            StoreChange::Removed {
                key: azimuth(),
                index: 0,
                len: 1
            }
        );
        assert_eq!(store.get("impostor-distribution-azimuth"), &[entry("b.png")]);
    }

    #[test]
    fn test_dormant_keys_survive_saves() {
        let storage =
            MemoryStorage::new().with_item(DEFAULT_STORAGE_KEY, r#"{"retired-key": ["x.png"]}"#);
        let mut store = ImageStore::load(&sample_catalog(), storage, DEFAULT_STORAGE_KEY);
        store.append(&azimuth(), entry("y.png"));

        assert_eq!(persisted(&store).get("retired-key").unwrap(), &["x.png".to_string()]);
        assert!(store.export().get("retired-key").is_none());
    }

    #[test]
    fn test_replace_all_merges() {
        let mut store = fresh_store();
        let doc = ImageDocument::parse(
            r#"{"capture-shading-translucency": ["a.png", "b.png"], "not-in-catalog": ["z.png"]}"#,
        )
        .unwrap();
        let change = store.replace_all(&doc);
        assert_eq!(
            change,
            StoreChange::Imported {
                keys: vec![ParameterKey::new("capture", "shading", "translucency")]
            }
        );
        assert_eq!(
            store.get("capture-shading-translucency"),
            &[entry("a.png"), entry("b.png")]
        );
        assert_eq!(store.get("impostor-distribution-azimuth"), &[entry("azimuth.svg")]);
        assert!(!store.contains("not-in-catalog"));
        assert_eq!(store.dormant_count(), 1);
    }

    #[test]
    fn test_export_round_trip() {
        let mut store = fresh_store();
        store.append(&azimuth(), entry("data:image/png;base64,AAAA"));
        let before = store.export();
        store.replace_all(&before);
        assert_eq!(store.export(), before);
    }
}
