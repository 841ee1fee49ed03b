use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, DocumentReadyState, Element, Event, HtmlInputElement, KeyboardEvent};

use crate::catalog::Catalog;
use crate::config::SiteConfig;
use crate::message::{Message, Task};
use crate::model::ParameterKey;
use crate::page::NavEntryKind;
use crate::site::DocsSite;
use crate::store::LocalStorage;
use crate::web::{self, BrowserScheduler, DomPage, DownloadSink};

type BrowserSite = DocsSite<LocalStorage, DomPage, BrowserScheduler>;
type SharedSite = Rc<RefCell<BrowserSite>>;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    let config = SiteConfig::load_from_local_storage();
    if let Err(e) = console_log::init_with_level(config.log_level.to_level()) {
        web_sys::console::log_1(&format!("Logger already set: {}", e).into());
    }

    if let Err(e) = run_site(&config) {
        log::error!("Site failed to start: {:?}", e);
    }
}

fn run_site(config: &SiteConfig) -> Result<(), JsValue> {
    let catalog = Catalog::bundled().map_err(|e| JsValue::from_str(&e.to_string()))?;
    let storage = LocalStorage::open().map_err(|e| JsValue::from_str(&e.to_string()))?;
    let page = DomPage::new().ok_or_else(|| JsValue::from_str("no document"))?;
    let document = page.document().clone();

    let site: SharedSite = Rc::new(RefCell::new(DocsSite::new(
        catalog,
        config,
        storage,
        page,
        BrowserScheduler::new(),
    )));

    install_listeners(&site, &document)?;

    match document.ready_state() {
        DocumentReadyState::Loading => {
            let s = site.clone();
            let d = document.clone();
            listen(&document, "DOMContentLoaded", move |_| on_dom_ready(&s, &d))?;
        }
        _ => on_dom_ready(&site, &document),
    }
    match document.ready_state() {
        DocumentReadyState::Complete => dispatch(&site, Message::WindowLoaded),
        _ => {
            let s = site.clone();
            let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
            listen(&window, "load", move |_| dispatch(&s, Message::WindowLoaded))?;
        }
    }
    Ok(())
}

fn on_dom_ready(site: &SharedSite, document: &Document) {
    dispatch(site, Message::DomReady);
    let s = site.clone();
    let on_visible = move |id| dispatch(&s, Message::SectionInView(id));
    if let Err(e) = web::observe_sections(document, on_visible) {
        log::warn!("Section tracking unavailable: {:?}", e);
    }
}

/// Send a message, then hand newly scheduled tasks to the event loop.
fn dispatch(site: &SharedSite, message: Message) {
    site.borrow_mut().update(message);
    flush(site);
}

fn run_task(site: &SharedSite, task: Task) {
    site.borrow_mut().handle_task(task);
    flush(site);
}

fn flush(site: &SharedSite) {
    let pending = site.borrow_mut().scheduler_mut().take();
    for (delay, task) in pending {
        let s = site.clone();
        if let Err(e) = web::set_timeout(delay, move || run_task(&s, task)) {
            log::error!("Failed to schedule task: {:?}", e);
        }
    }
}

fn listen(
    target: &web_sys::EventTarget,
    event: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget(); // Listeners live as long as the page
    Ok(())
}

fn closest(target: &Element, selector: &str) -> Option<Element> {
    target.closest(selector).ok().flatten()
}

/// The catalog key carried by an element's `data-key`.
fn data_key(site: &SharedSite, element: &Element) -> Option<ParameterKey> {
    let raw = element.get_attribute("data-key")?;
    site.borrow().key(&raw).ok()
}

fn install_listeners(site: &SharedSite, document: &Document) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;

    let s = site.clone();
    listen(&window, "hashchange", move |_| {
        dispatch(&s, Message::FragmentChanged)
    })?;

    let s = site.clone();
    listen(document, "click", move |event| {
        let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
            return;
        };
        if let Some(message) = click_message(&s, &target, &event) {
            dispatch(&s, message);
        }
        if closest(&target, "#export-btn").is_some() {
            if let Err(e) = s.borrow_mut().export(&mut DownloadSink) {
                log::error!("Export failed: {}", e);
            }
            flush(&s);
        }
    })?;

    let s = site.clone();
    listen(document, "keydown", move |event| {
        let is_escape = event
            .dyn_ref::<KeyboardEvent>()
            .is_some_and(|e| e.key() == "Escape");
        if is_escape && s.borrow().lightbox().is_open() {
            dispatch(&s, Message::LightboxClosed);
        }
    })?;

    let s = site.clone();
    listen(document, "change", move |event| {
        let Some(input) = event
            .target()
            .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
        else {
            return;
        };
        on_file_input(&s, &input);
    })?;

    Ok(())
}

/// Map a click to a site message, the way the page's delegated handlers
/// route it.
fn click_message(site: &SharedSite, target: &Element, event: &Event) -> Option<Message> {
    if closest(target, ".lightbox-close, .lightbox-backdrop").is_some() {
        return Some(Message::LightboxClosed);
    }
    if let Some(link) = closest(target, ".nav-panel-link[data-target]") {
        event.prevent_default();
        let target = link.get_attribute("data-target")?;
        return Some(Message::NavEntryClicked {
            kind: NavEntryKind::Panel,
            target,
        });
    }
    if let Some(link) = closest(target, ".nav-param-link[data-key]") {
        event.prevent_default();
        let target = link.get_attribute("data-key")?;
        return Some(Message::NavEntryClicked {
            kind: NavEntryKind::Param,
            target,
        });
    }
    if let Some(tab) = closest(target, ".tab-btn[data-panel]") {
        return tab.get_attribute("data-panel").map(Message::TabSelected);
    }
    if let Some(admin_card) = closest(target, ".param-card-admin") {
        let key = data_key(site, &admin_card)?;
        if target.class_list().contains("btn-add-url") {
            let input: HtmlInputElement = admin_card
                .query_selector(".url-input")
                .ok()
                .flatten()?
                .dyn_into()
                .ok()?;
            let url = input.value();
            input.set_value("");
            return Some(Message::AddImageUrl { key, url });
        }
        if target.class_list().contains("delete-thumb") {
            let index = target.get_attribute("data-index")?.parse().ok()?;
            return Some(Message::DeleteImage { key, index });
        }
        return None;
    }
    if let Some(card) = closest(target, ".param-card") {
        let key = data_key(site, &card)?;
        if closest(target, ".prev-btn").is_some() {
            return Some(Message::PrevImage(key));
        }
        if closest(target, ".next-btn").is_some() {
            return Some(Message::NextImage(key));
        }
        if let Some(img) = closest(target, ".param-card-image img") {
            // Images that failed to load drop the class.
            return img
                .class_list()
                .contains("loaded")
                .then_some(Message::ImageClicked(key));
        }
        return Some(Message::CardClicked(key));
    }
    if let Some(section) = closest(target, ".panel-section") {
        return Some(Message::SectionClicked(section.id()));
    }
    if closest(target, "#import-btn").is_some() {
        open_import_picker(target);
    }
    None
}

fn open_import_picker(from: &Element) {
    let input = from
        .owner_document()
        .and_then(|d| d.get_element_by_id("import-input"))
        .and_then(|e| e.dyn_into::<HtmlInputElement>().ok());
    match input {
        Some(input) => input.click(),
        None => log::warn!("No #import-input on this page"),
    }
}

fn on_file_input(site: &SharedSite, input: &HtmlInputElement) {
    let Some(files) = input.files() else {
        return;
    };

    if input.id() == "import-input" {
        if let Some(file) = files.get(0) {
            let s = site.clone();
            if let Err(e) = web::read_as_text(&file, move |text| {
                dispatch(&s, Message::ImportDocument(text))
            }) {
                log::error!("Failed to read import file: {:?}", e);
            }
        }
        input.set_value("");
        return;
    }

    let Some(key) =
        closest(input, ".param-card-admin").and_then(|card| data_key(site, &card))
    else {
        return;
    };
    let queue = site.borrow().admin().upload_queue();
    for i in 0..files.length() {
        let Some(file) = files.get(i) else {
            continue;
        };
        let s = site.clone();
        if let Err(e) = web::read_as_data_url(&file, key.clone(), queue.clone(), move || {
            dispatch(&s, Message::UploadsCompleted)
        }) {
            log::error!("Failed to read {}: {:?}", file.name(), e);
        }
    }
    input.set_value("");
}
