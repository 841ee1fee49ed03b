//! Behavior tests for the assembled site.
//!
//! These drive [`DocsSite`] end to end over an in-memory store, an
//! in-memory page and a virtual clock.

mod lightbox_tests;
mod store_sync_tests;

use crate::catalog::Catalog;
use crate::catalog::fixtures::sample_catalog;
use crate::config::SiteConfig;
use crate::message::Task;
use crate::model::ParameterKey;
use crate::page::{PageEvent, StaticPage};
use crate::scheduler::ManualScheduler;
use crate::site::DocsSite;
use crate::store::MemoryStorage;

pub(crate) type TestSite = DocsSite<MemoryStorage, StaticPage, ManualScheduler<Task>>;

pub(crate) const AZIMUTH: &str = "impostor-distribution-azimuth";
pub(crate) const POLE_SCALING: &str = "impostor-distribution-pole-scaling";
pub(crate) const TRANSLUCENCY: &str = "capture-shading-translucency";
pub(crate) const SHADOWS: &str = "capture-shading-capture-shadows";

pub(crate) fn site_with(storage: MemoryStorage, page: StaticPage) -> TestSite {
    DocsSite::new(
        sample_catalog(),
        &SiteConfig::default(),
        storage,
        page,
        ManualScheduler::new(),
    )
}

/// Site over an empty store with the content already rendered.
pub(crate) fn rendered_site() -> TestSite {
    site_with(MemoryStorage::new(), rendered_page())
}

pub(crate) fn rendered_page() -> StaticPage {
    StaticPage::from_catalog(&sample_catalog())
}

pub(crate) fn catalog() -> Catalog {
    sample_catalog()
}

pub(crate) fn key(site: &TestSite, raw: &str) -> ParameterKey {
    site.key(raw).unwrap()
}

pub(crate) fn count_events(site: &TestSite, pred: impl Fn(&PageEvent) -> bool) -> usize {
    site.page().events().iter().filter(|e| pred(e)).count()
}

pub(crate) fn images(site: &TestSite, key: &str) -> Vec<String> {
    site.store()
        .get(key)
        .iter()
        .map(|e| e.as_str().to_string())
        .collect()
}
