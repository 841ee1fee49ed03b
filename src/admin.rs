//! Authoring panel over the image store: add by URL or file, delete,
//! bulk import and export, plus the view models the admin page draws.

use crate::catalog::Catalog;
use crate::error::{DocsError, DocumentError};
use crate::model::{ImageEntry, ParameterKey};
use crate::store::{EXPORT_FILENAME, ImageDocument, ImageStore, Storage, StoreChange};
use crate::upload::{CompletedRead, UploadQueue};

pub const MSG_IMAGE_ADDED: &str = "Image added!";
pub const MSG_IMAGE_REMOVED: &str = "Image removed";
pub const MSG_IMPORTED: &str = "Imported successfully!";
pub const MSG_EXPORTED: &str = "Exported!";
pub const MSG_INVALID_IMPORT: &str = "Invalid JSON file";

/// Confirmation text for a successful mutation.
pub fn confirmation(change: &StoreChange) -> &'static str {
    match change {
        StoreChange::Appended { .. } => MSG_IMAGE_ADDED,
        StoreChange::Removed { .. } => MSG_IMAGE_REMOVED,
        StoreChange::Imported { .. } => MSG_IMPORTED,
    }
}

/// A thumbnail with the index its delete button removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub index: usize,
    pub src: String,
}

/// One parameter's card in the admin panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCardView {
    pub key: ParameterKey,
    pub name: String,
    pub thumbnails: Vec<Thumbnail>,
}

impl AdminCardView {
    pub fn count_label(&self) -> String {
        format!("{} images", self.thumbnails.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminGroupView {
    pub name: String,
    pub cards: Vec<AdminCardView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPanelView {
    pub panel_id: String,
    pub name: String,
    pub active: bool,
    pub groups: Vec<AdminGroupView>,
}

/// The whole admin area: category tabs and one panel per catalog panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminView {
    pub panels: Vec<AdminPanelView>,
}

impl AdminView {
    pub fn active_panel(&self) -> Option<&AdminPanelView> {
        self.panels.iter().find(|p| p.active)
    }
}

/// A serialized export, ready for a save-as collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub contents: String,
}

/// Where exports go: a browser download, a file on disk, ...
pub trait FileSink {
    fn save(&mut self, file: &ExportFile) -> Result<(), DocsError>;
}

/// Writes exports into a directory, or to one explicit path.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct DiskSink {
    target: std::path::PathBuf,
    is_dir: bool,
}

#[cfg(not(target_arch = "wasm32"))]
impl DiskSink {
    /// Save under `dir` using the export's own file name.
    pub fn in_dir(dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            target: dir.into(),
            is_dir: true,
        }
    }

    /// Save to exactly `path`.
    pub fn at_path(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            target: path.into(),
            is_dir: false,
        }
    }

    /// Path the next export lands at.
    pub fn path_for(&self, file: &ExportFile) -> std::path::PathBuf {
        if self.is_dir {
            self.target.join(&file.filename)
        } else {
            self.target.clone()
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl FileSink for DiskSink {
    fn save(&mut self, file: &ExportFile) -> Result<(), DocsError> {
        let path = self.path_for(file);
        std::fs::write(&path, &file.contents)
            .map_err(|e| DocsError::Export(format!("{}: {}", path.display(), e)))?;
        log::info!("Exported image document to {:?}", path);
        Ok(())
    }
}

/// Admin panel state: the active category tab and pending uploads.
#[derive(Debug, Clone, Default)]
pub struct AdminPanel {
    active_tab: Option<String>,
    uploads: UploadQueue,
}

impl AdminPanel {
    /// Panel with the first catalog panel's tab active.
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            active_tab: catalog.panels.first().map(|p| p.id.clone()),
            uploads: UploadQueue::new(),
        }
    }

    pub fn active_tab(&self) -> Option<&str> {
        self.active_tab.as_deref()
    }

    /// Switch category tab. Unknown panels are ignored.
    pub fn activate_tab(&mut self, catalog: &Catalog, panel_id: &str) -> bool {
        if catalog.panel(panel_id).is_none() {
            log::debug!("Ignoring unknown admin tab '{}'", panel_id);
            return false;
        }
        self.active_tab = Some(panel_id.to_string());
        true
    }

    /// Handle to the completion queue, for readers that finish later.
    pub fn upload_queue(&self) -> UploadQueue {
        self.uploads.clone()
    }

    /// Add an image by URL. Blank input changes nothing and says nothing.
    pub fn add_by_url<S: Storage>(
        &self,
        store: &mut ImageStore<S>,
        key: &ParameterKey,
        url: &str,
    ) -> Option<StoreChange> {
        let entry = ImageEntry::new(url)?;
        Some(store.append(key, entry))
    }

    /// Apply every file read completed so far. Failed reads are logged
    /// and skipped.
    pub fn drain_uploads<S: Storage>(&self, store: &mut ImageStore<S>) -> Vec<StoreChange> {
        self.uploads
            .drain()
            .into_iter()
            .filter_map(|CompletedRead { key, name, result }| match result {
                Ok(entry) => Some(store.append(&key, entry)),
                Err(e) => {
                    log::warn!("Skipping upload {}: {}", name, e);
                    None
                }
            })
            .collect()
    }

    /// Delete the image at `index`; stale indices are ignored.
    pub fn delete_at<S: Storage>(
        &self,
        store: &mut ImageStore<S>,
        key: &str,
        index: usize,
    ) -> Option<StoreChange> {
        store.remove_at(key, index)
    }

    /// Parse and merge an import document. On error nothing changes.
    pub fn import_document<S: Storage>(
        &self,
        store: &mut ImageStore<S>,
        raw: &str,
    ) -> Result<StoreChange, DocumentError> {
        let doc = ImageDocument::parse(raw)?;
        Ok(store.replace_all(&doc))
    }

    /// Serialize the whole store for download.
    pub fn export_document<S: Storage>(
        &self,
        store: &ImageStore<S>,
    ) -> Result<ExportFile, DocumentError> {
        Ok(ExportFile {
            filename: EXPORT_FILENAME.to_string(),
            contents: store.export().to_json_pretty()?,
        })
    }

    /// View of one parameter's admin card.
    pub fn card_view<S: Storage>(
        &self,
        catalog: &Catalog,
        store: &ImageStore<S>,
        key: &ParameterKey,
    ) -> AdminCardView {
        let name = catalog
            .param(key.as_str())
            .map(|p| p.name.clone())
            .unwrap_or_else(|| key.to_string());
        AdminCardView {
            key: key.clone(),
            name,
            thumbnails: store
                .get(key.as_str())
                .iter()
                .enumerate()
                .map(|(index, entry)| Thumbnail {
                    index,
                    src: entry.to_string(),
                })
                .collect(),
        }
    }

    /// View of the whole admin area.
    pub fn view<S: Storage>(&self, catalog: &Catalog, store: &ImageStore<S>) -> AdminView {
        let panels = catalog
            .panels
            .iter()
            .map(|panel| AdminPanelView {
                panel_id: panel.id.clone(),
                name: panel.name.clone(),
                active: self.active_tab.as_deref() == Some(panel.id.as_str()),
                groups: panel
                    .groups
                    .iter()
                    .map(|group| AdminGroupView {
                        name: group.name.clone(),
                        cards: group
                            .params
                            .iter()
                            .map(|param| {
                                let key = ParameterKey::new(&panel.id, &group.id, &param.id);
                                self.card_view(catalog, store, &key)
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        AdminView { panels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::sample_catalog;
    use crate::error::UploadError;
    use crate::store::{DEFAULT_STORAGE_KEY, MemoryStorage};
    use crate::upload::encode_data_url;

    fn setup() -> (Catalog, ImageStore<MemoryStorage>, AdminPanel) {
        let catalog = sample_catalog();
        let store = ImageStore::load(&catalog, MemoryStorage::new(), DEFAULT_STORAGE_KEY);
        let admin = AdminPanel::new(&catalog);
        (catalog, store, admin)
    }

    fn azimuth() -> ParameterKey {
        ParameterKey::new("impostor", "distribution", "azimuth")
    }

    #[test]
    fn test_first_tab_active() {
        let (catalog, store, mut admin) = setup();
        assert_eq!(admin.active_tab(), Some("impostor"));
        assert!(admin.activate_tab(&catalog, "capture"));
        assert!(!admin.activate_tab(&catalog, "missing"));
        assert_eq!(
            admin.view(&catalog, &store).active_panel().unwrap().panel_id,
            "capture"
        );
    }

    #[test]
    fn test_add_by_url_ignores_blank() {
        let (_, mut store, admin) = setup();
        assert!(admin.add_by_url(&mut store, &azimuth(), "   ").is_none());
        assert_eq!(store.count("impostor-distribution-azimuth"), 1);
    }

    #[test]
    fn test_add_then_delete_restores_length() {
        let (_, mut store, admin) = setup();
        let change = admin
            .add_by_url(&mut store, &azimuth(), "http://x/img.png")
            .unwrap();
        assert_eq!(confirmation(&change), MSG_IMAGE_ADDED);
        assert_eq!(store.count("impostor-distribution-azimuth"), 2);

        let change = admin
            .delete_at(&mut store, "impostor-distribution-azimuth", 0)
            .unwrap();
        assert_eq!(confirmation(&change), MSG_IMAGE_REMOVED);
        assert_eq!(store.count("impostor-distribution-azimuth"), 1);
        assert!(admin.delete_at(&mut store, "impostor-distribution-azimuth", 7).is_none());
    }

    #[test]
    fn test_drain_uploads_skips_failures() {
        let (_, mut store, admin) = setup();
        let queue = admin.upload_queue();
        queue.push(CompletedRead {
            key: azimuth(),
            name: "ok.svg".to_string(),
            result: encode_data_url("ok.svg", b"<svg/>"),
        });
        queue.push(CompletedRead {
            key: azimuth(),
            name: "broken.png".to_string(),
            result: Err(UploadError::Empty {
                name: "broken.png".to_string(),
            }),
        });

        let changes = admin.drain_uploads(&mut store);
        assert_eq!(changes.len(), 1);
        assert_eq!(store.count("impostor-distribution-azimuth"), 2);
        assert!(admin.drain_uploads(&mut store).is_empty());
    }

    #[test]
    fn test_invalid_import_changes_nothing() {
        let (_, mut store, admin) = setup();
        let before = store.export();
        assert!(admin.import_document(&mut store, "{not json").is_err());
        assert!(admin.import_document(&mut store, r#"["a.png"]"#).is_err());
        assert_eq!(store.export(), before);
    }

    #[test]
    fn test_export_round_trips_through_import() {
        let (_, mut store, admin) = setup();
        admin.add_by_url(&mut store, &azimuth(), "http://x/2.png");
        let file = admin.export_document(&store).unwrap();
        assert_eq!(file.filename, "rawteous-images.json");

        let before = store.export();
        admin.import_document(&mut store, &file.contents).unwrap();
        assert_eq!(store.export(), before);
    }

    #[test]
    fn test_card_view() {
        let (catalog, mut store, admin) = setup();
        admin.add_by_url(&mut store, &azimuth(), "http://x/2.png");
        let card = admin.card_view(&catalog, &store, &azimuth());
        assert_eq!(card.name, "Azimuth");
        assert_eq!(card.count_label(), "2 images");
        assert_eq!(card.thumbnails[1].index, 1);
        assert_eq!(card.thumbnails[1].src, "http://x/2.png");
    }

    #[test]
    fn test_disk_sink() {
        let dir = tempfile::tempdir().unwrap();
        let file = ExportFile {
            filename: EXPORT_FILENAME.to_string(),
            contents: "{}".to_string(),
        };
        let mut sink = DiskSink::in_dir(dir.path());
        sink.save(&file).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join(EXPORT_FILENAME)).unwrap(),
            "{}"
        );

        let explicit = dir.path().join("custom.json");
        DiskSink::at_path(&explicit).save(&file).unwrap();
        assert!(explicit.exists());
    }
}
