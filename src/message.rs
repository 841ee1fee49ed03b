//! Site message types.
//!
//! All UI events are represented as messages in the Elm architecture
//! style; deferred work comes back as [`Task`]s.

use crate::model::ParameterKey;
use crate::navigation::NavTask;
use crate::page::NavEntryKind;

/// Events that update site state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Lifecycle
    /// Initial DOM is ready and the content has been rendered
    DomReady,
    /// Window finished loading
    WindowLoaded,
    /// The address fragment changed (back/forward, link, typed)
    FragmentChanged,

    // Navigation clicks
    /// A sidebar entry was clicked
    NavEntryClicked { kind: NavEntryKind, target: String },
    /// A panel section's background was clicked
    SectionClicked(String),
    /// A parameter card (outside its image and buttons) was clicked
    CardClicked(ParameterKey),
    /// A panel section scrolled into the reading band
    SectionInView(String),

    // Lightbox
    /// A card's loaded image was clicked
    ImageClicked(ParameterKey),
    /// Lightbox close button, backdrop or Escape
    LightboxClosed,

    // Carousel
    /// Show the previous image of a card
    PrevImage(ParameterKey),
    /// Show the next image of a card
    NextImage(ParameterKey),

    // Admin
    /// Admin category tab selected
    TabSelected(String),
    /// "Add URL" pressed with the input's text
    AddImageUrl { key: ParameterKey, url: String },
    /// One or more file reads finished
    UploadsCompleted,
    /// Thumbnail delete pressed
    DeleteImage { key: ParameterKey, index: usize },
    /// Import file read, raw text
    ImportDocument(String),
}

/// Deferred work scheduled by the site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Run the deep-link resolver for the current fragment again
    TriggerNavigation,
    /// Resolver retry or settle
    Nav(NavTask),
    /// Hide the notification of this generation
    DismissNotification(u64),
}
