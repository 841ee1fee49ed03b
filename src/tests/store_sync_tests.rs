//! Store changes fanning out to the carousel, admin view and notifier.

use std::time::Duration;

use super::*;
use crate::admin::{self, ExportFile, FileSink};
use crate::error::{DocsError, UploadError};
use crate::message::Message;
use crate::model::ImageEntry;
use crate::store::{DEFAULT_STORAGE_KEY, EXPORT_FILENAME, ImageDocument, Storage};
use crate::upload::CompletedRead;

fn three_image_site() -> TestSite {
    let storage = MemoryStorage::new().with_item(
        DEFAULT_STORAGE_KEY,
        r#"{"impostor-distribution-azimuth": ["a.png", "b.png", "c.png"], "old-key": ["x.png"]}"#,
    );
    site_with(storage, rendered_page())
}

fn notified(site: &TestSite) -> Option<&str> {
    site.notifier().current().map(|n| n.message.as_str())
}

#[derive(Default)]
struct RecordingSink {
    saved: Vec<ExportFile>,
    fail: bool,
}

impl FileSink for RecordingSink {
    fn save(&mut self, file: &ExportFile) -> Result<(), DocsError> {
        if self.fail {
            return Err(DocsError::Export("disk full".to_string()));
        }
        self.saved.push(file.clone());
        Ok(())
    }
}

#[test]
fn test_add_resets_cursor_and_refreshes_views() {
    let mut site = three_image_site();
    let azimuth = key(&site, AZIMUTH);
    site.update(Message::NextImage(azimuth.clone()));
    site.update(Message::NextImage(azimuth.clone()));
    assert_eq!(site.carousel().index(AZIMUTH), 2);
    site.page_mut().clear_events();

    site.update(Message::AddImageUrl {
        key: azimuth.clone(),
        url: " d.png ".to_string(),
    });

    assert_eq!(site.carousel().index(AZIMUTH), 0);
    assert_eq!(images(&site, AZIMUTH), vec!["a.png", "b.png", "c.png", "d.png"]);
    let events = site.page().events();
    assert!(matches!(
        &events[0],
        PageEvent::CardRedrawn(view) if view.index == 0 && view.count == 4
    ));
    assert!(matches!(
        &events[1],
        PageEvent::AdminCardRefreshed(card) if card.count_label() == "4 images"
    ));
    assert!(matches!(
        &events[2],
        PageEvent::Notified(Some(n)) if n.message == admin::MSG_IMAGE_ADDED
    ));
}

#[test]
fn test_mutations_persist_with_unknown_keys_kept() {
    let mut site = three_image_site();
    let azimuth = key(&site, AZIMUTH);
    site.update(Message::DeleteImage {
        key: azimuth,
        index: 1,
    });

    let raw = site
        .store()
        .storage()
        .get_item(DEFAULT_STORAGE_KEY)
        .unwrap()
        .unwrap();
    let doc = ImageDocument::parse(&raw).unwrap();
    assert_eq!(
        doc.get(AZIMUTH),
        Some(&["a.png".to_string(), "c.png".to_string()][..])
    );
    assert_eq!(doc.get("old-key"), Some(&["x.png".to_string()][..]));
    assert_eq!(notified(&site), Some(admin::MSG_IMAGE_REMOVED));
}

#[test]
fn test_stale_delete_index_is_ignored() {
    let mut site = three_image_site();
    let azimuth = key(&site, AZIMUTH);
    site.update(Message::DeleteImage {
        key: azimuth,
        index: 3,
    });

    assert_eq!(site.store().count(AZIMUTH), 3);
    assert!(site.page().events().is_empty());
    assert_eq!(notified(&site), None);
}

#[test]
fn test_notification_dismisses_after_duration() {
    let mut site = rendered_site();
    let azimuth = key(&site, AZIMUTH);
    site.update(Message::AddImageUrl {
        key: azimuth,
        url: "http://x/1.png".to_string(),
    });

    site.run_for(Duration::from_millis(2499));
    assert_eq!(notified(&site), Some(admin::MSG_IMAGE_ADDED));

    site.run_for(Duration::from_millis(1));
    assert_eq!(notified(&site), None);
    assert_eq!(site.page().events().last(), Some(&PageEvent::Notified(None)));
}

#[test]
fn test_replaced_notification_outlives_old_timer() {
    let mut site = rendered_site();
    let azimuth = key(&site, AZIMUTH);
    site.update(Message::AddImageUrl {
        key: azimuth.clone(),
        url: "http://x/1.png".to_string(),
    });
    site.run_for(Duration::from_millis(1000));
    site.update(Message::DeleteImage {
        key: azimuth,
        index: 0,
    });

    // First timer fires at 2500 and finds a newer notification.
    site.run_for(Duration::from_millis(1500));
    assert_eq!(notified(&site), Some(admin::MSG_IMAGE_REMOVED));

    site.run_for(Duration::from_millis(1000));
    assert_eq!(notified(&site), None);
}

#[test]
fn test_invalid_import_reports_error_and_keeps_store() {
    let mut site = three_image_site();
    let before = site.store().export();

    site.update(Message::ImportDocument("{not json".to_string()));

    assert_eq!(site.store().export(), before);
    let current = site.notifier().current().unwrap();
    assert!(current.is_error());
    assert_eq!(current.message, admin::MSG_INVALID_IMPORT);
    assert_eq!(
        count_events(&site, |e| matches!(e, PageEvent::AdminRendered(_))),
        0
    );
}

#[test]
fn test_import_keeps_active_tab() {
    let mut site = rendered_site();
    site.update(Message::TabSelected("capture".to_string()));
    site.update(Message::ImportDocument(
        r#"{"impostor-distribution-azimuth": ["n.png"]}"#.to_string(),
    ));

    let last_render = site.page().events().iter().rev().find_map(|e| match e {
        PageEvent::AdminRendered(view) => Some(view.clone()),
        _ => None,
    });
    let view = last_render.unwrap();
    assert_eq!(
        view.active_panel().map(|p| p.panel_id.as_str()),
        Some("capture")
    );
    assert_eq!(site.carousel().index(AZIMUTH), 0);
}

#[test]
fn test_unknown_tab_is_ignored() {
    let mut site = rendered_site();
    site.update(Message::TabSelected("nope".to_string()));
    assert_eq!(site.admin().active_tab(), Some("impostor"));
    assert!(site.page().events().is_empty());
}

#[test]
fn test_failed_upload_reads_are_skipped() {
    let mut site = rendered_site();
    let shadows = key(&site, SHADOWS);
    let queue = site.admin().upload_queue();
    queue.push(CompletedRead {
        key: shadows.clone(),
        name: "broken.png".to_string(),
        result: Err(UploadError::Empty {
            name: "broken.png".to_string(),
        }),
    });
    queue.push(CompletedRead {
        key: shadows,
        name: "ok.png".to_string(),
        result: Ok(ImageEntry::new("data:image/png;base64,AAAA").unwrap()),
    });

    site.update(Message::UploadsCompleted);

    assert!(queue.is_empty());
    assert_eq!(images(&site, SHADOWS), vec!["data:image/png;base64,AAAA"]);
    assert_eq!(
        count_events(&site, |e| matches!(e, PageEvent::Notified(Some(_)))),
        1
    );
}

#[test]
fn test_export_hands_document_to_sink() {
    let mut site = three_image_site();
    let mut sink = RecordingSink::default();

    site.export(&mut sink).unwrap();

    assert_eq!(sink.saved.len(), 1);
    assert_eq!(sink.saved[0].filename, EXPORT_FILENAME);
    let doc = ImageDocument::parse(&sink.saved[0].contents).unwrap();
    assert_eq!(doc, site.store().export());
    assert!(doc.get("old-key").is_none());
    assert_eq!(notified(&site), Some(admin::MSG_EXPORTED));
}

#[test]
fn test_failed_export_is_reported_to_caller() {
    let mut site = rendered_site();
    let mut sink = RecordingSink {
        fail: true,
        ..Default::default()
    };

    assert!(matches!(site.export(&mut sink), Err(DocsError::Export(_))));
    assert_eq!(notified(&site), None);
}
