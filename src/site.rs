//! The documentation site: owns the store and every view over it, and
//! routes messages and deferred tasks between them.

use std::time::Duration;

use crate::admin::{self, AdminPanel, FileSink};
use crate::carousel::{CardView, Carousel, Direction};
use crate::catalog::Catalog;
use crate::config::SiteConfig;
use crate::error::DocsError;
use crate::lightbox::Lightbox;
use crate::message::{Message, Task};
use crate::model::ParameterKey;
use crate::navigation::{
    DeepLinkResolver, LookupStrategy, NavHighlighter, NavTask, NavigationTarget,
};
use crate::notify::{NotificationKind, Notifier};
use crate::page::{ElementKind, NavEntryKind, Page, ScrollAlign};
use crate::scheduler::{ManualScheduler, Scheduler};
use crate::store::{ImageStore, Storage, StoreChange};

/// Extra resolver triggers after DOM ready, in milliseconds. Content
/// rendering can race the first attempt on slow embedded browsers.
const DOM_READY_TRIGGERS_MS: [u64; 3] = [200, 600, 1000];

/// Extra resolver triggers after window load, in milliseconds.
const WINDOW_LOAD_TRIGGERS_MS: [u64; 2] = [200, 500];

/// Upper bound on tasks run by [`DocsSite::run_until_idle`].
const MAX_IDLE_TASKS: usize = 10_000;

/// The site: image store, carousel, admin panel, deep-link resolver and
/// highlighter over one page.
pub struct DocsSite<S: Storage, P: Page, T: Scheduler<Task>> {
    catalog: Catalog,
    store: ImageStore<S>,
    carousel: Carousel,
    admin: AdminPanel,
    resolver: DeepLinkResolver,
    highlighter: NavHighlighter,
    notifier: Notifier,
    lightbox: Lightbox,
    page: P,
    scheduler: T,
}

impl<S: Storage, P: Page, T: Scheduler<Task>> DocsSite<S, P, T> {
    /// Load the store and set up every view.
    pub fn new(catalog: Catalog, config: &SiteConfig, storage: S, page: P, scheduler: T) -> Self {
        let store = ImageStore::load(&catalog, storage, &config.storage_key);
        log::info!(
            "Site ready: {} panels, {} parameters",
            catalog.panels.len(),
            catalog.len()
        );
        Self {
            carousel: Carousel::new(&catalog),
            admin: AdminPanel::new(&catalog),
            resolver: DeepLinkResolver::new(config.navigation.clone()),
            highlighter: NavHighlighter::new(),
            notifier: Notifier::new(config.notification_duration()),
            lightbox: Lightbox::new(),
            catalog,
            store,
            page,
            scheduler,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &ImageStore<S> {
        &self.store
    }

    pub fn carousel(&self) -> &Carousel {
        &self.carousel
    }

    pub fn admin(&self) -> &AdminPanel {
        &self.admin
    }

    pub fn resolver(&self) -> &DeepLinkResolver {
        &self.resolver
    }

    pub fn highlighter(&self) -> &NavHighlighter {
        &self.highlighter
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn lightbox(&self) -> &Lightbox {
        &self.lightbox
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn scheduler(&self) -> &T {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut T {
        &mut self.scheduler
    }

    /// Current view of one card.
    pub fn card_view(&self, key: &ParameterKey) -> CardView {
        self.carousel.render(&self.store, key)
    }

    /// Resolve a key string against the catalog.
    pub fn key(&self, key: &str) -> Result<ParameterKey, DocsError> {
        self.catalog
            .lookup(key)
            .map(|p| p.key())
            .ok_or_else(|| DocsError::unknown_key(key))
    }

    /// Update site state in response to a message.
    pub fn update(&mut self, message: Message) {
        match message {
            Message::DomReady => {
                self.page.render_admin(&self.admin.view(&self.catalog, &self.store));
                if self.page.current_fragment().is_some() {
                    for ms in DOM_READY_TRIGGERS_MS {
                        self.scheduler.schedule(Duration::from_millis(ms), Task::TriggerNavigation);
                    }
                }
            }
            Message::WindowLoaded => {
                if self.page.current_fragment().is_some() {
                    self.trigger_navigation();
                    for ms in WINDOW_LOAD_TRIGGERS_MS {
                        self.scheduler.schedule(Duration::from_millis(ms), Task::TriggerNavigation);
                    }
                }
            }
            Message::FragmentChanged => self.trigger_navigation(),
            Message::NavEntryClicked { kind, target } => {
                let align = match kind {
                    NavEntryKind::Panel => ScrollAlign::Start,
                    NavEntryKind::Param => ScrollAlign::Center,
                };
                self.navigate_direct(kind, &target, align);
            }
            Message::SectionClicked(id) => {
                self.navigate_direct(NavEntryKind::Panel, &id, ScrollAlign::Center);
            }
            Message::CardClicked(key) => {
                self.navigate_direct(NavEntryKind::Param, key.as_str(), ScrollAlign::Center);
            }
            Message::SectionInView(id) => {
                let is_section = self
                    .page
                    .element_by_id(&id)
                    .is_some_and(|e| e.kind == ElementKind::PanelSection);
                if is_section {
                    self.page.set_active_nav(NavEntryKind::Panel, &id);
                }
            }
            Message::ImageClicked(key) => {
                let card = self.carousel.render(&self.store, &key);
                if let Some(view) = self.lightbox.open(&self.catalog, &card) {
                    self.page.show_lightbox(Some(view));
                }
            }
            Message::LightboxClosed => {
                if self.lightbox.close() {
                    self.page.show_lightbox(None);
                }
            }
            Message::PrevImage(key) => self.step_carousel(&key, Direction::Prev),
            Message::NextImage(key) => self.step_carousel(&key, Direction::Next),
            Message::TabSelected(panel_id) => {
                if self.admin.activate_tab(&self.catalog, &panel_id) {
                    self.page.render_admin(&self.admin.view(&self.catalog, &self.store));
                }
            }
            Message::AddImageUrl { key, url } => {
                if let Some(change) = self.admin.add_by_url(&mut self.store, &key, &url) {
                    self.apply_change(change);
                }
            }
            Message::UploadsCompleted => {
                for change in self.admin.drain_uploads(&mut self.store) {
                    self.apply_change(change);
                }
            }
            Message::DeleteImage { key, index } => {
                if let Some(change) = self.admin.delete_at(&mut self.store, key.as_str(), index) {
                    self.apply_change(change);
                }
            }
            Message::ImportDocument(raw) => {
                match self.admin.import_document(&mut self.store, &raw) {
                    Ok(change) => self.apply_change(change),
                    Err(e) => {
                        log::warn!("Import rejected: {}", e);
                        self.notify(admin::MSG_INVALID_IMPORT, NotificationKind::Error);
                    }
                }
            }
        }
    }

    /// Run a deferred task that came due.
    pub fn handle_task(&mut self, task: Task) {
        match task {
            Task::TriggerNavigation => self.trigger_navigation(),
            Task::Nav(NavTask::Retry { target, attempt }) => {
                let current = self.page.current_fragment();
                if let Some(followup) =
                    self.resolver.on_retry(&target, attempt, current.as_deref(), &self.page)
                {
                    self.scheduler.schedule(followup.delay, Task::Nav(followup.task));
                }
            }
            Task::Nav(NavTask::Settle(target)) => {
                let current = self.page.current_fragment();
                if self.resolver.should_settle(&target, current.as_deref()) {
                    self.land_on(&target);
                } else {
                    log::debug!("Dropping stale settle for '{}'", target.fragment);
                }
            }
            Task::DismissNotification(generation) => {
                if self.notifier.dismiss(generation) {
                    self.page.show_notification(None);
                }
            }
        }
    }

    /// Serialize the store and hand it to `sink`.
    pub fn export(&mut self, sink: &mut impl FileSink) -> Result<(), DocsError> {
        let file = self.admin.export_document(&self.store)?;
        sink.save(&file)?;
        self.notify(admin::MSG_EXPORTED, NotificationKind::Success);
        Ok(())
    }

    fn trigger_navigation(&mut self) {
        let fragment = self.page.current_fragment();
        if let Some(followup) = self.resolver.trigger(fragment.as_deref(), &self.page) {
            self.scheduler.schedule(followup.delay, Task::Nav(followup.task));
        }
    }

    /// Scroll to, activate and emphasize a resolved deep-link target.
    fn land_on(&mut self, target: &NavigationTarget) {
        self.page.scroll_to_top();
        self.page.scroll_into_view(&target.element, target.kind.scroll_align());
        self.page.set_active_nav(target.kind.nav_kind(), &target.fragment);
        self.highlighter.emphasize(&mut self.page, &target.element);
    }

    /// Navigation from a click: the element is on screen, no retries.
    fn navigate_direct(&mut self, kind: NavEntryKind, id: &str, align: ScrollAlign) {
        let element = match kind {
            NavEntryKind::Panel => self
                .page
                .element_by_id(id)
                .filter(|e| e.kind == ElementKind::PanelSection),
            NavEntryKind::Param => LookupStrategy::resolve(&self.page, id)
                .filter(|t| t.element.kind == ElementKind::ParameterCard)
                .map(|t| t.element),
        };

        if let Some(element) = &element {
            self.page.scroll_into_view(element, align);
            self.page.push_fragment(id);
            self.resolver.mark_resolved(id);
        }
        self.page.set_active_nav(kind, id);
        if let Some(element) = element {
            self.highlighter.emphasize(&mut self.page, &element);
        }
    }

    fn step_carousel(&mut self, key: &ParameterKey, direction: Direction) {
        if let Some(view) = self.carousel.advance(&self.store, key, direction) {
            self.page.redraw_card(&view);
        }
    }

    /// Fan a store change out to the carousel, the admin view and the
    /// notifier.
    fn apply_change(&mut self, change: StoreChange) {
        self.carousel.on_store_change(&change);
        for key in change.keys() {
            let view = self.carousel.render(&self.store, key);
            self.page.redraw_card(&view);
        }
        match &change {
            StoreChange::Appended { key, .. } | StoreChange::Removed { key, .. } => {
                let card = self.admin.card_view(&self.catalog, &self.store, key);
                self.page.refresh_admin_card(&card);
            }
            StoreChange::Imported { .. } => {
                self.page.render_admin(&self.admin.view(&self.catalog, &self.store));
            }
        }
        self.notify(admin::confirmation(&change), NotificationKind::Success);
    }

    fn notify(&mut self, message: &str, kind: NotificationKind) {
        let ticket = self.notifier.show(message, kind);
        self.page.show_notification(self.notifier.current());
        self.scheduler.schedule(ticket.delay, Task::DismissNotification(ticket.generation));
    }
}

impl<S: Storage, P: Page> DocsSite<S, P, ManualScheduler<Task>> {
    /// Advance the virtual clock by `duration`, running every task that
    /// comes due on the way.
    pub fn run_for(&mut self, duration: Duration) {
        let limit = self.scheduler.now() + duration;
        while let Some(task) = self.scheduler.pop_due(limit) {
            self.handle_task(task);
        }
        self.scheduler.advance_to(limit);
    }

    /// Run tasks until nothing is queued. Returns the number run.
    pub fn run_until_idle(&mut self) -> usize {
        let mut ran = 0;
        while ran < MAX_IDLE_TASKS {
            let Some(due) = self.scheduler.next_due() else {
                break;
            };
            if let Some(task) = self.scheduler.pop_due(due) {
                self.handle_task(task);
                ran += 1;
            }
        }
        ran
    }
}
