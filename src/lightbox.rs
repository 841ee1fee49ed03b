//! Enlarged view of the image a card is showing.

use crate::carousel::CardView;
use crate::catalog::Catalog;
use crate::model::{ImageEntry, ParameterKey};

/// What the open lightbox displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightboxView {
    pub key: ParameterKey,
    pub src: ImageEntry,
    pub alt: String,
    /// `Name (id)` of the parameter
    pub caption: String,
}

/// Modal image viewer. At most one image is open at a time.
#[derive(Debug, Clone, Default)]
pub struct Lightbox {
    open: Option<LightboxView>,
}

impl Lightbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&LightboxView> {
        self.open.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Open on the card's current image, replacing whatever was open.
    /// A card without an image leaves the lightbox as it was.
    pub fn open(&mut self, catalog: &Catalog, card: &CardView) -> Option<&LightboxView> {
        let src = card.image.clone()?;
        let caption = match catalog.param(card.key.as_str()) {
            Some(param) => format!("{} ({})", param.name, param.id),
            None => card.key.to_string(),
        };
        log::debug!("Lightbox open on {}", card.key);
        self.open = Some(LightboxView {
            key: card.key.clone(),
            src,
            alt: card.name.clone(),
            caption,
        });
        self.open.as_ref()
    }

    /// Close the lightbox. Returns `false` when it was not open.
    pub fn close(&mut self) -> bool {
        self.open.take().is_some()
    }
}
