//! Opening card images full size.

use super::*;
use crate::message::Message;

fn lightbox_events(site: &TestSite) -> Vec<Option<String>> {
    site.page()
        .events()
        .iter()
        .filter_map(|e| match e {
            PageEvent::LightboxShown(view) => Some(view.as_ref().map(|v| v.caption.clone())),
            _ => None,
        })
        .collect()
}

#[test]
fn test_image_click_opens_current_image() {
    let mut site = rendered_site();
    let azimuth = key(&site, AZIMUTH);
    site.update(Message::AddImageUrl {
        key: azimuth.clone(),
        url: "https://example.com/second.png".to_string(),
    });
    site.update(Message::NextImage(azimuth.clone()));

    site.update(Message::ImageClicked(azimuth));

    let open = site.lightbox().current().unwrap();
    assert_eq!(open.src.as_str(), "https://example.com/second.png");
    assert_eq!(open.alt, "Azimuth");
    assert_eq!(open.caption, "Azimuth (azimuth)");
    assert_eq!(lightbox_events(&site), vec![Some("Azimuth (azimuth)".to_string())]);
}

#[test]
fn test_close_only_when_open() {
    let mut site = rendered_site();
    site.update(Message::LightboxClosed);
    assert!(lightbox_events(&site).is_empty());

    let azimuth = key(&site, AZIMUTH);
    site.update(Message::ImageClicked(azimuth));
    site.update(Message::LightboxClosed);
    site.update(Message::LightboxClosed);

    assert!(!site.lightbox().is_open());
    assert_eq!(lightbox_events(&site), vec![Some("Azimuth (azimuth)".to_string()), None]);
}

#[test]
fn test_card_without_image_has_nothing_to_open() {
    let mut site = rendered_site();
    let shadows = key(&site, SHADOWS);

    site.update(Message::ImageClicked(shadows));

    assert!(!site.lightbox().is_open());
    assert!(lightbox_events(&site).is_empty());
}

#[test]
fn test_redrawn_card_carries_parameter_name() {
    let mut site = rendered_site();
    let azimuth = key(&site, AZIMUTH);
    site.update(Message::AddImageUrl {
        key: azimuth.clone(),
        url: "b.png".to_string(),
    });
    site.page_mut().clear_events();

    site.update(Message::NextImage(azimuth));

    assert!(site.page().events().iter().any(|e| matches!(
        e,
        PageEvent::CardRedrawn(view) if view.name == "Azimuth" && view.index == 1
    )));
}
