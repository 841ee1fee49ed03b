//! The rendered page as seen by the core: the content tree produced by the
//! content renderer, plus the effects the core requests on it.
//!
//! The browser build implements these traits over the live DOM
//! (`crate::web`); [`StaticPage`] is an in-memory page built from the
//! catalog, used natively and in tests, that records every effect.

use crate::admin::{AdminCardView, AdminView};
use crate::carousel::CardView;
use crate::catalog::Catalog;
use crate::lightbox::LightboxView;
use crate::notify::Notification;

/// What a located element is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// A whole panel section (`.panel-section`)
    PanelSection,
    /// A single parameter card (`.param-card`)
    ParameterCard,
    /// Anything else carrying the identity
    Other,
}

impl ElementKind {
    /// Class the content renderer gives elements of this kind.
    pub fn class(self) -> Option<&'static str> {
        match self {
            ElementKind::PanelSection => Some("panel-section"),
            ElementKind::ParameterCard => Some("param-card"),
            ElementKind::Other => None,
        }
    }
}

/// Class carried by the emphasized element.
pub const HIGHLIGHT_CLASS: &str = "highlight";

/// Selector for every element that may currently carry the emphasis
/// marker. Only sections and cards are emphasized, so other elements
/// styled with the same class are left alone.
pub fn highlighted_selector() -> String {
    [ElementKind::PanelSection, ElementKind::ParameterCard]
        .into_iter()
        .filter_map(ElementKind::class)
        .map(|class| format!(".{class}.{HIGHLIGHT_CLASS}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The `active` flag of each navigation entry after activating `target`,
/// or `None` when no entry matches and nothing should change.
pub fn nav_activation<'a>(
    entries: impl IntoIterator<Item = Option<&'a str>>,
    target: &str,
) -> Option<Vec<bool>> {
    let flags: Vec<bool> = entries.into_iter().map(|e| e == Some(target)).collect();
    flags.contains(&true).then_some(flags)
}

/// Handle to an element in the content tree, identified by its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef {
    pub id: String,
    pub kind: ElementKind,
}

impl ElementRef {
    pub fn new(id: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

/// Vertical alignment requested when scrolling an element into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAlign {
    Start,
    Center,
}

/// Which navigation list an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEntryKind {
    /// Panel links (`.nav-panel-link[data-target]`)
    Panel,
    /// Parameter links (`.nav-param-link[data-key]`)
    Param,
}

/// Read access to the rendered content.
pub trait ContentTree {
    /// Whether the content wrapper has been constructed at all.
    fn has_content_wrapper(&self) -> bool;

    /// Element whose id is exactly `id`.
    fn element_by_id(&self, id: &str) -> Option<ElementRef>;

    /// Parameter card carrying `key` as its data key.
    fn card_by_key(&self, key: &str) -> Option<ElementRef>;

    /// Ids of every rendered panel section, for diagnostics.
    fn section_ids(&self) -> Vec<String>;
}

/// Scrolling, history and navigation-menu effects.
pub trait PageEffects {
    /// Fragment currently in the address, without `#`.
    fn current_fragment(&self) -> Option<String>;

    /// Record a new fragment without triggering navigation.
    fn push_fragment(&mut self, fragment: &str);

    /// Jump to the top, cancelling any scroll the browser started itself.
    fn scroll_to_top(&mut self);

    /// Smooth-scroll an element into view. Fire-and-forget.
    fn scroll_into_view(&mut self, element: &ElementRef, align: ScrollAlign);

    /// Mark the entry for `target` active and clear the others of its kind.
    /// Returns `false` when no such entry exists (nothing changes then).
    fn set_active_nav(&mut self, kind: NavEntryKind, target: &str) -> bool;
}

/// The transient emphasis marker.
pub trait HighlightSurface {
    /// Elements currently carrying the marker.
    fn highlighted(&self) -> Vec<ElementRef>;

    fn remove_highlight(&mut self, element: &ElementRef);

    /// Force a style recalculation so re-adding the marker restarts its
    /// transition.
    fn force_reflow(&mut self, element: &ElementRef);

    fn add_highlight(&mut self, element: &ElementRef);
}

/// Drawing of the views derived from the image store.
pub trait ViewSurface {
    /// Redraw one card's image element and counter, nothing else.
    fn redraw_card(&mut self, view: &CardView);

    /// Redraw one admin card (count label and thumbnails).
    fn refresh_admin_card(&mut self, view: &AdminCardView);

    /// Redraw the whole admin area.
    fn render_admin(&mut self, view: &AdminView);

    /// Show a notification, or hide it with `None`.
    fn show_notification(&mut self, notification: Option<&Notification>);

    /// Open the lightbox on an image, or close it with `None`.
    fn show_lightbox(&mut self, view: Option<&LightboxView>);
}

/// Everything the site needs from its page.
pub trait Page: ContentTree + PageEffects + HighlightSurface + ViewSurface {}

impl<T: ContentTree + PageEffects + HighlightSurface + ViewSurface> Page for T {}

/// Effect recorded by [`StaticPage`].
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    FragmentPushed(String),
    ScrolledToTop,
    ScrolledIntoView { id: String, align: ScrollAlign },
    NavActivated { kind: NavEntryKind, target: String },
    HighlightRemoved(String),
    Reflowed(String),
    HighlightAdded(String),
    CardRedrawn(CardView),
    AdminCardRefreshed(AdminCardView),
    AdminRendered(AdminView),
    Notified(Option<Notification>),
    LightboxShown(Option<LightboxView>),
}

/// In-memory page mirroring what the content renderer produces for a
/// catalog: one section per panel, one card per parameter, one navigation
/// entry for each.
#[derive(Debug, Clone, Default)]
pub struct StaticPage {
    wrapper: bool,
    sections: Vec<String>,
    cards: Vec<String>,
    nav_panels: Vec<String>,
    nav_params: Vec<String>,
    active_panel: Option<String>,
    active_param: Option<String>,
    highlighted: Vec<ElementRef>,
    fragment: Option<String>,
    events: Vec<PageEvent>,
}

impl StaticPage {
    /// A page whose content has not been rendered yet.
    pub fn unrendered() -> Self {
        Self::default()
    }

    /// A page with the catalog already rendered.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut page = Self::default();
        page.render_content(catalog);
        page
    }

    /// Build the content wrapper, sections, cards and nav entries.
    pub fn render_content(&mut self, catalog: &Catalog) {
        self.wrapper = true;
        self.sections = catalog.panels.iter().map(|p| p.id.clone()).collect();
        self.cards = catalog.keys().iter().map(|k| k.to_string()).collect();
        self.nav_panels = self.sections.clone();
        self.nav_params = self.cards.clone();
    }

    /// Set the address fragment, as a user typing or following a link would.
    pub fn set_fragment(&mut self, fragment: Option<&str>) {
        self.fragment = fragment.map(str::to_string);
    }

    /// Recorded effects, oldest first.
    pub fn events(&self) -> &[PageEvent] {
        &self.events
    }

    /// Forget the recorded effects.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Number of times an element received the emphasis marker.
    pub fn highlight_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, PageEvent::HighlightAdded(_)))
            .count()
    }

    /// Currently active entry of a navigation list.
    pub fn active_nav(&self, kind: NavEntryKind) -> Option<&str> {
        match kind {
            NavEntryKind::Panel => self.active_panel.as_deref(),
            NavEntryKind::Param => self.active_param.as_deref(),
        }
    }
}

impl ContentTree for StaticPage {
    fn has_content_wrapper(&self) -> bool {
        self.wrapper
    }

    fn element_by_id(&self, id: &str) -> Option<ElementRef> {
        if self.sections.iter().any(|s| s == id) {
            Some(ElementRef::new(id, ElementKind::PanelSection))
        } else if self.cards.iter().any(|c| c == id) {
            Some(ElementRef::new(id, ElementKind::ParameterCard))
        } else {
            None
        }
    }

    fn card_by_key(&self, key: &str) -> Option<ElementRef> {
        self.cards
            .iter()
            .find(|c| *c == key)
            .map(|c| ElementRef::new(c.as_str(), ElementKind::ParameterCard))
    }

    fn section_ids(&self) -> Vec<String> {
        self.sections.clone()
    }
}

impl PageEffects for StaticPage {
    fn current_fragment(&self) -> Option<String> {
        self.fragment.clone()
    }

    fn push_fragment(&mut self, fragment: &str) {
        self.fragment = Some(fragment.to_string());
        self.events.push(PageEvent::FragmentPushed(fragment.to_string()));
    }

    fn scroll_to_top(&mut self) {
        self.events.push(PageEvent::ScrolledToTop);
    }

    fn scroll_into_view(&mut self, element: &ElementRef, align: ScrollAlign) {
        self.events.push(PageEvent::ScrolledIntoView {
            id: element.id.clone(),
            align,
        });
    }

    fn set_active_nav(&mut self, kind: NavEntryKind, target: &str) -> bool {
        let (entries, active) = match kind {
            NavEntryKind::Panel => (&self.nav_panels, &mut self.active_panel),
            NavEntryKind::Param => (&self.nav_params, &mut self.active_param),
        };
        if nav_activation(entries.iter().map(|e| Some(e.as_str())), target).is_none() {
            return false;
        }
        *active = Some(target.to_string());
        self.events.push(PageEvent::NavActivated {
            kind,
            target: target.to_string(),
        });
        true
    }
}

impl HighlightSurface for StaticPage {
    fn highlighted(&self) -> Vec<ElementRef> {
        self.highlighted.clone()
    }

    fn remove_highlight(&mut self, element: &ElementRef) {
        self.highlighted.retain(|e| e != element);
        self.events.push(PageEvent::HighlightRemoved(element.id.clone()));
    }

    fn force_reflow(&mut self, element: &ElementRef) {
        self.events.push(PageEvent::Reflowed(element.id.clone()));
    }

    fn add_highlight(&mut self, element: &ElementRef) {
        if !self.highlighted.contains(element) {
            self.highlighted.push(element.clone());
        }
        self.events.push(PageEvent::HighlightAdded(element.id.clone()));
    }
}

impl ViewSurface for StaticPage {
    fn redraw_card(&mut self, view: &CardView) {
        self.events.push(PageEvent::CardRedrawn(view.clone()));
    }

    fn refresh_admin_card(&mut self, view: &AdminCardView) {
        self.events.push(PageEvent::AdminCardRefreshed(view.clone()));
    }

    fn render_admin(&mut self, view: &AdminView) {
        self.events.push(PageEvent::AdminRendered(view.clone()));
    }

    fn show_notification(&mut self, notification: Option<&Notification>) {
        self.events.push(PageEvent::Notified(notification.cloned()));
    }

    fn show_lightbox(&mut self, view: Option<&LightboxView>) {
        self.events.push(PageEvent::LightboxShown(view.cloned()));
    }
}
