//! Per-card image carousel and the card view model it drives.

use std::collections::HashMap;

use crate::catalog::Catalog;
use crate::model::{ImageEntry, ParameterKey};
use crate::store::{ImageStore, Storage, StoreChange};

/// Carousel step direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

impl Direction {
    /// Signed step, -1 or +1.
    pub fn delta(self) -> isize {
        match self {
            Direction::Prev => -1,
            Direction::Next => 1,
        }
    }
}

/// Everything a parameter card needs to draw its image area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub key: ParameterKey,
    /// Parameter display name, used as the image's alternative text
    pub name: String,
    /// Image currently shown, `None` when the parameter has no images
    pub image: Option<ImageEntry>,
    /// Zero-based index of `image`
    pub index: usize,
    /// Number of images for the parameter
    pub count: usize,
}

impl CardView {
    pub fn has_images(&self) -> bool {
        self.count > 0
    }

    /// Prev/next buttons and the counter only make sense with 2+ images.
    pub fn show_controls(&self) -> bool {
        self.count > 1
    }

    /// Counter text, `current/total`. An empty card still reads `1/1`.
    pub fn counter_label(&self) -> String {
        format!("{}/{}", self.index + 1, self.count.max(1))
    }
}

/// Current display index per parameter. Transient, never persisted.
#[derive(Debug, Clone, Default)]
pub struct Carousel {
    cursors: HashMap<ParameterKey, usize>,
    names: HashMap<ParameterKey, String>,
}

impl Carousel {
    /// Cursor map with every catalog key at index 0.
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            cursors: catalog.keys().into_iter().map(|k| (k, 0)).collect(),
            names: catalog
                .params()
                .map(|p| (p.key(), p.param.name.clone()))
                .collect(),
        }
    }

    /// Raw cursor for a key; unknown keys read as 0.
    pub fn index(&self, key: &str) -> usize {
        self.cursors.get(key).copied().unwrap_or(0)
    }

    /// Compute the view of one card from the store.
    pub fn render<S: Storage>(&self, store: &ImageStore<S>, key: &ParameterKey) -> CardView {
        let images = store.get(key.as_str());
        let index = match images.len() {
            0 => 0,
            n => self.index(key.as_str()).min(n - 1),
        };
        CardView {
            key: key.clone(),
            name: self.names.get(key).cloned().unwrap_or_default(),
            image: images.get(index).cloned(),
            index,
            count: images.len(),
        }
    }

    /// Step the cursor circularly. Returns the card to redraw, or `None`
    /// when the card has fewer than two images and nothing moves.
    pub fn advance<S: Storage>(
        &mut self,
        store: &ImageStore<S>,
        key: &ParameterKey,
        direction: Direction,
    ) -> Option<CardView> {
        let count = store.count(key.as_str());
        if count <= 1 {
            return None;
        }
        let current = self.index(key.as_str()) % count;
        let next = (current + count).saturating_add_signed(direction.delta()) % count;
        self.cursors.insert(key.clone(), next);
        log::trace!("Carousel {} -> {}/{}", key, next + 1, count);
        Some(self.render(store, key))
    }

    /// Structural changes invalidate the cursor of every affected key.
    pub fn on_store_change(&mut self, change: &StoreChange) {
        for key in change.keys() {
            self.cursors.insert(key.clone(), 0);
        }
    }
}
