//! Browser bindings: the live DOM as a [`Page`](crate::page::Page), a
//! `setTimeout` scheduler, Blob downloads and `FileReader` uploads.

use std::time::Duration;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Blob, BlobPropertyBag, Document, Element, File, FileReader, HtmlAnchorElement, HtmlElement,
    IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit, ScrollBehavior,
    ScrollIntoViewOptions, ScrollLogicalPosition, Url, Window,
};

use crate::admin::{AdminCardView, AdminView, ExportFile, FileSink};
use crate::carousel::CardView;
use crate::error::{DocsError, UploadError};
use crate::lightbox::LightboxView;
use crate::message::Task;
use crate::model::{ImageEntry, ParameterKey};
use crate::navigation::parse_fragment;
use crate::notify::Notification;
use crate::page::{
    ContentTree, ElementKind, ElementRef, HIGHLIGHT_CLASS, HighlightSurface, NavEntryKind,
    PageEffects, ScrollAlign, ViewSurface, highlighted_selector, nav_activation,
};
use crate::scheduler::Scheduler;
use crate::upload::{CompletedRead, UploadQueue};


/// Band of the viewport in which a section counts as the one being read.
const SECTION_SPY_MARGIN: &str = "-20% 0px -70% 0px";

const LIGHTBOX_HTML: &str = r#"<div class="lightbox-backdrop"></div><div class="lightbox-content"><button class="lightbox-close" aria-label="Close lightbox"><svg width="24" height="24" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><line x1="18" y1="6" x2="6" y2="18"></line><line x1="6" y1="6" x2="18" y2="18"></line></svg></button><img src="" alt="" class="lightbox-image"><div class="lightbox-caption"></div></div>"#;

fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}

/// Quote a value for use inside a CSS attribute selector.
fn css_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Escape text for interpolation into markup.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn classify(element: &Element) -> ElementKind {
    let classes = element.class_list();
    [ElementKind::PanelSection, ElementKind::ParameterCard]
        .into_iter()
        .find(|kind| kind.class().is_some_and(|class| classes.contains(class)))
        .unwrap_or(ElementKind::Other)
}

/// The live document.
pub struct DomPage {
    window: Window,
    document: Document,
}

impl DomPage {
    pub fn new() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self { window, document })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    fn query(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_all(&self, selector: &str) -> Vec<Element> {
        let Ok(list) = self.document.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn card_element(&self, key: &str) -> Option<Element> {
        self.query(&format!(".param-card[data-key={}]", css_quote(key)))
    }

    /// Find the element behind a handle: by id, else a card by key.
    fn find(&self, element: &ElementRef) -> Option<Element> {
        self.document
            .get_element_by_id(&element.id)
            .or_else(|| self.card_element(&element.id))
    }

    /// The lightbox element, created on first use.
    fn lightbox_element(&self) -> Result<Element, JsValue> {
        if let Some(el) = self.query(".lightbox") {
            return Ok(el);
        }
        let body = self
            .document
            .body()
            .ok_or_else(|| JsValue::from_str("no body"))?;
        let el = self.document.create_element("div")?;
        el.set_class_name("lightbox");
        el.set_inner_html(LIGHTBOX_HTML);
        body.append_child(&el)?;
        Ok(el)
    }

    /// Lock or release page scrolling behind the lightbox.
    fn lock_scroll(&self, locked: bool) {
        let Some(body) = self.document.body() else {
            return;
        };
        let result = if locked {
            body.style().set_property("overflow", "hidden")
        } else {
            body.style().remove_property("overflow").map(|_| ())
        };
        if let Err(e) = result {
            log::warn!("Failed to update page scrolling: {}", js_message(&e));
        }
    }

    fn set_text(&self, root: &Element, selector: &str, text: &str) {
        if let Ok(Some(el)) = root.query_selector(selector) {
            el.set_text_content(Some(text));
        }
    }

    fn toggle_class(el: &Element, class: &str, on: bool) {
        if let Err(e) = el.class_list().toggle_with_force(class, on) {
            log::warn!("Failed to toggle class '{}': {}", class, js_message(&e));
        }
    }

    fn thumbnails_html(view: &AdminCardView) -> String {
        view.thumbnails
            .iter()
            .map(|thumb| {
                format!(
                    r#"<div class="admin-thumb"><img src="{}" alt=""><button class="delete-thumb" data-index="{}">×</button></div>"#,
                    escape_html(&thumb.src),
                    thumb.index
                )
            })
            .collect()
    }

    fn admin_card_html(view: &AdminCardView) -> String {
        format!(
            r#"<div class="param-card-admin" data-key="{key}">
<div class="param-card-admin-header"><span class="param-admin-name">{name}</span><span class="param-admin-count">{count}</span></div>
<div class="param-card-admin-images">{thumbs}</div>
<div class="param-card-admin-add"><input type="text" class="url-input" placeholder="Paste image URL..."><button class="btn-add-url">Add URL</button><span class="or-text">or</span><label class="btn-add-file">Upload<input type="file" accept="image/*" multiple></label></div>
</div>"#,
            key = escape_html(view.key.as_str()),
            name = escape_html(&view.name),
            count = view.count_label(),
            thumbs = Self::thumbnails_html(view),
        )
    }

    fn card_image_html(view: &CardView, src: &str) -> String {
        let hidden = if view.show_controls() { "" } else { " hidden" };
        format!(
            r#"<div class="param-card-image"><img src="{src}" alt="{alt}" class="loaded" onerror="this.classList.remove('loaded')"><div class="param-card-nav{hidden}"><button class="prev-btn" aria-label="Previous image">‹</button><button class="next-btn" aria-label="Next image">›</button></div><div class="param-card-counter{hidden}"><span class="current">{current}</span>/<span class="total">{total}</span></div></div>"#,
            src = escape_html(src),
            alt = escape_html(&view.name),
            current = view.index + 1,
            total = view.count.max(1),
        )
    }
}

impl ContentTree for DomPage {
    fn has_content_wrapper(&self) -> bool {
        self.query(".content-wrapper").is_some()
    }

    fn element_by_id(&self, id: &str) -> Option<ElementRef> {
        let el = self.document.get_element_by_id(id)?;
        Some(ElementRef::new(id, classify(&el)))
    }

    fn card_by_key(&self, key: &str) -> Option<ElementRef> {
        self.card_element(key)
            .map(|_| ElementRef::new(key, ElementKind::ParameterCard))
    }

    fn section_ids(&self) -> Vec<String> {
        self.query_all(".panel-section")
            .iter()
            .map(Element::id)
            .collect()
    }
}

impl PageEffects for DomPage {
    fn current_fragment(&self) -> Option<String> {
        let location = self.window.location();
        let hash = location.hash().unwrap_or_default();
        let href = location.href().unwrap_or_default();
        parse_fragment(&hash, &href)
    }

    fn push_fragment(&mut self, fragment: &str) {
        let result = self.window.history().and_then(|history| {
            history.push_state_with_url(&JsValue::NULL, "", Some(&format!("#{}", fragment)))
        });
        if let Err(e) = result {
            log::warn!("Failed to push fragment '{}': {}", fragment, js_message(&e));
        }
    }

    fn scroll_to_top(&mut self) {
        self.window.scroll_to_with_x_and_y(0.0, 0.0);
    }

    fn scroll_into_view(&mut self, element: &ElementRef, align: ScrollAlign) {
        let Some(el) = self.find(element) else {
            return;
        };
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        options.set_block(match align {
            ScrollAlign::Start => ScrollLogicalPosition::Start,
            ScrollAlign::Center => ScrollLogicalPosition::Center,
        });
        el.scroll_into_view_with_scroll_into_view_options(&options);
    }

    fn set_active_nav(&mut self, kind: NavEntryKind, target: &str) -> bool {
        let (selector, attribute) = match kind {
            NavEntryKind::Panel => (".nav-panel-link", "data-target"),
            NavEntryKind::Param => (".nav-param-link", "data-key"),
        };
        let links = self.query_all(selector);
        let values: Vec<Option<String>> =
            links.iter().map(|link| link.get_attribute(attribute)).collect();
        let Some(flags) = nav_activation(values.iter().map(Option::as_deref), target) else {
            return false;
        };
        for (link, active) in links.iter().zip(flags) {
            Self::toggle_class(link, "active", active);
        }
        true
    }
}

impl HighlightSurface for DomPage {
    fn highlighted(&self) -> Vec<ElementRef> {
        self.query_all(&highlighted_selector())
            .iter()
            .map(|el| {
                let id = el
                    .get_attribute("data-key")
                    .filter(|_| el.id().is_empty())
                    .unwrap_or_else(|| el.id());
                ElementRef::new(id, classify(el))
            })
            .collect()
    }

    fn remove_highlight(&mut self, element: &ElementRef) {
        if let Some(el) = self.find(element) {
            Self::toggle_class(&el, HIGHLIGHT_CLASS, false);
        }
    }

    fn force_reflow(&mut self, element: &ElementRef) {
        // Reading a layout property flushes pending style changes.
        if let Some(el) = self.find(element).and_then(|e| e.dyn_into::<HtmlElement>().ok()) {
            let _ = el.offset_width();
        }
    }

    fn add_highlight(&mut self, element: &ElementRef) {
        if let Some(el) = self.find(element) {
            Self::toggle_class(&el, HIGHLIGHT_CLASS, true);
        }
    }
}

impl ViewSurface for DomPage {
    fn redraw_card(&mut self, view: &CardView) {
        let Some(card) = self.card_element(view.key.as_str()) else {
            return;
        };
        Self::toggle_class(&card, "no-image", !view.has_images());

        let Some(image) = &view.image else {
            if let Ok(Some(block)) = card.query_selector(".param-card-image") {
                block.remove();
            }
            return;
        };

        let img = card.query_selector(".param-card-image img").ok().flatten();
        let Some(img) = img else {
            if let Err(e) =
                card.insert_adjacent_html("beforeend", &Self::card_image_html(view, image.as_str()))
            {
                log::warn!("Failed to add image block to {}: {}", view.key, js_message(&e));
            }
            return;
        };
        let attributes = [("src", image.as_str()), ("alt", view.name.as_str())];
        for (name, value) in attributes {
            if let Err(e) = img.set_attribute(name, value) {
                log::warn!("Failed to set {} for {}: {}", name, view.key, js_message(&e));
            }
        }
        Self::toggle_class(&img, "loaded", true);
        self.set_text(&card, ".current", &(view.index + 1).to_string());
        self.set_text(&card, ".total", &view.count.max(1).to_string());
        for selector in [".param-card-nav", ".param-card-counter"] {
            if let Ok(Some(el)) = card.query_selector(selector) {
                Self::toggle_class(&el, "hidden", !view.show_controls());
            }
        }
    }

    fn refresh_admin_card(&mut self, view: &AdminCardView) {
        let selector = format!(".param-card-admin[data-key={}]", css_quote(view.key.as_str()));
        let Some(card) = self.query(&selector) else {
            return;
        };
        self.set_text(&card, ".param-admin-count", &view.count_label());
        if let Ok(Some(images)) = card.query_selector(".param-card-admin-images") {
            images.set_inner_html(&Self::thumbnails_html(view));
        }
    }

    fn render_admin(&mut self, view: &AdminView) {
        if let Some(tabs) = self.document.get_element_by_id("panel-tabs") {
            let html: String = view
                .panels
                .iter()
                .map(|panel| {
                    format!(
                        r#"<button class="tab-btn{}" data-panel="{}">{}</button>"#,
                        if panel.active { " active" } else { "" },
                        escape_html(&panel.panel_id),
                        escape_html(&panel.name)
                    )
                })
                .collect();
            tabs.set_inner_html(&html);
        }

        if let Some(container) = self.document.get_element_by_id("admin-panels") {
            let html: String = view
                .panels
                .iter()
                .map(|panel| {
                    let groups: String = panel
                        .groups
                        .iter()
                        .map(|group| {
                            let cards: String =
                                group.cards.iter().map(Self::admin_card_html).collect();
                            format!(
                                r#"<div class="admin-group"><h3 class="admin-group-title">{}</h3><div class="param-cards-admin">{}</div></div>"#,
                                escape_html(&group.name),
                                cards
                            )
                        })
                        .collect();
                    format!(
                        r#"<div class="admin-panel{}" id="admin-{}">{}</div>"#,
                        if panel.active { " active" } else { "" },
                        escape_html(&panel.panel_id),
                        groups
                    )
                })
                .collect();
            container.set_inner_html(&html);
        }
    }

    fn show_notification(&mut self, notification: Option<&Notification>) {
        let Some(toast) = self.document.get_element_by_id("toast") else {
            return;
        };
        match notification {
            Some(n) => {
                toast.set_text_content(Some(&n.message));
                let class = if n.is_error() { "toast show error" } else { "toast show" };
                toast.set_class_name(class);
            }
            None => toast.set_class_name("toast"),
        }
    }

    fn show_lightbox(&mut self, view: Option<&LightboxView>) {
        let lightbox = match self.lightbox_element() {
            Ok(el) => el,
            Err(e) => {
                log::warn!("Lightbox unavailable: {}", js_message(&e));
                return;
            }
        };
        if let Some(view) = view {
            if let Ok(Some(img)) = lightbox.query_selector(".lightbox-image") {
                for (name, value) in [("src", view.src.as_str()), ("alt", view.alt.as_str())] {
                    if let Err(e) = img.set_attribute(name, value) {
                        log::warn!("Failed to set lightbox {}: {}", name, js_message(&e));
                    }
                }
            }
            self.set_text(&lightbox, ".lightbox-caption", &view.caption);
        }
        Self::toggle_class(&lightbox, "active", view.is_some());
        self.lock_scroll(view.is_some());
    }
}

/// Report the id of each panel section entering the reading band.
pub fn observe_sections(
    document: &Document,
    mut on_visible: impl FnMut(String) + 'static,
) -> Result<IntersectionObserver, JsValue> {
    let callback = Closure::wrap(Box::new(move |entries: js_sys::Array, _: IntersectionObserver| {
        for entry in entries.iter() {
            let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                continue;
            };
            if entry.is_intersecting() {
                on_visible(entry.target().id());
            }
        }
    }) as Box<dyn FnMut(js_sys::Array, IntersectionObserver)>);

    let options = IntersectionObserverInit::new();
    options.set_root_margin(SECTION_SPY_MARGIN);
    options.set_threshold(&JsValue::from_f64(0.0));
    let observer =
        IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options)?;
    callback.forget(); // The observer lives as long as the page

    let sections = document.query_selector_all(".panel-section")?;
    for i in 0..sections.length() {
        if let Some(section) = sections.get(i).and_then(|n| n.dyn_into::<Element>().ok()) {
            observer.observe(&section);
        }
    }
    Ok(observer)
}

/// Collects tasks for the event glue to hand to `setTimeout`.
#[derive(Debug, Default)]
pub struct BrowserScheduler {
    pending: Vec<(Duration, Task)>,
}

impl BrowserScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything scheduled since the last call.
    pub fn take(&mut self) -> Vec<(Duration, Task)> {
        std::mem::take(&mut self.pending)
    }
}

impl Scheduler<Task> for BrowserScheduler {
    fn schedule(&mut self, delay: Duration, task: Task) {
        self.pending.push((delay, task));
    }
}

/// Run `f` after `delay` on the event loop.
pub fn set_timeout(delay: Duration, f: impl FnOnce() + 'static) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let callback = Closure::once_into_js(f);
    let ms = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
    window.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), ms)?;
    Ok(())
}

/// Saves exports as a browser download through a temporary object URL.
#[derive(Debug, Default)]
pub struct DownloadSink;

impl DownloadSink {
    fn download(file: &ExportFile) -> Result<(), JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let parts = js_sys::Array::of1(&JsValue::from_str(&file.contents));
        let options = BlobPropertyBag::new();
        options.set_type("application/json");
        let blob = Blob::new_with_str_sequence_and_options(&parts, &options)?;
        let url = Url::create_object_url_with_blob(&blob)?;

        let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
        anchor.set_href(&url);
        anchor.set_download(&file.filename);
        anchor.click();

        Url::revoke_object_url(&url)
    }
}

impl FileSink for DownloadSink {
    fn save(&mut self, file: &ExportFile) -> Result<(), DocsError> {
        Self::download(file).map_err(|e| DocsError::Export(js_message(&e)))?;
        log::info!("Downloaded {}", file.filename);
        Ok(())
    }
}

/// Read `file` as a `data:` URL. The completion lands in `queue`, then
/// `on_done` runs.
pub fn read_as_data_url(
    file: &File,
    key: ParameterKey,
    queue: UploadQueue,
    on_done: impl Fn() + 'static,
) -> Result<(), JsValue> {
    let reader = FileReader::new()?;
    let name = file.name();
    log::debug!("Reading {} for {}", name, key);

    let target = reader.clone();
    let onloadend = Closure::once_into_js(move || {
        let result = target
            .result()
            .map_err(|e| UploadError::Reader {
                name: name.clone(),
                message: js_message(&e),
            })
            .and_then(|value| {
                value
                    .as_string()
                    .and_then(|s| ImageEntry::new(&s))
                    .ok_or_else(|| UploadError::Empty { name: name.clone() })
            });
        queue.push(CompletedRead { key, name, result });
        on_done();
    });
    reader.set_onloadend(Some(onloadend.unchecked_ref()));
    reader.read_as_data_url(file)
}

/// Read `file` as text and hand it to `on_text`.
pub fn read_as_text(file: &File, on_text: impl FnOnce(String) + 'static) -> Result<(), JsValue> {
    let reader = FileReader::new()?;
    let name = file.name();

    let target = reader.clone();
    let onloadend = Closure::once_into_js(move || match target.result() {
        Ok(value) => match value.as_string() {
            Some(text) => on_text(text),
            None => log::warn!("{} did not read as text", name),
        },
        Err(e) => log::warn!("Failed to read {}: {}", name, js_message(&e)),
    });
    reader.set_onloadend(Some(onloadend.unchecked_ref()));
    reader.read_as_text(file)
}
