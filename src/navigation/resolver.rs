//! Deep-link resolution with bounded retries.
//!
//! The content tree is built by a separate renderer and may not exist yet
//! when a fragment arrives, so resolution is a small state machine:
//!
//! ```text
//! Idle --fragment--> Pending(id, 0) --found--> Resolved
//!                      |    ^
//!                      |    | retry (wrapper missing: short track,
//!                      v    |        lookup failed: long track)
//!                  Pending(id, n) --budget spent--> Exhausted
//! ```
//!
//! The resolver never sleeps. Each step returns the [`Followup`] the caller
//! must schedule; superseded retries are detected when they fire by
//! comparing the current fragment, not by cancellation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::page::{ContentTree, ElementKind, ElementRef, NavEntryKind, ScrollAlign};

/// Delays and budgets for resolution. Tuned for slow embedded browsers;
/// treat them as policy, not contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Delay between retries while the content wrapper is missing
    #[serde(default = "default_wrapper_delay_ms")]
    pub wrapper_delay_ms: u64,
    /// Retry budget while the content wrapper is missing
    #[serde(default = "default_wrapper_retries")]
    pub wrapper_retries: u32,
    /// Delay between retries while the target id is not found
    #[serde(default = "default_lookup_delay_ms")]
    pub lookup_delay_ms: u64,
    /// Retry budget while the target id is not found
    #[serde(default = "default_lookup_retries")]
    pub lookup_retries: u32,
    /// Layout settle time between finding the target and scrolling to it
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

fn default_wrapper_delay_ms() -> u64 {
    100
}

fn default_wrapper_retries() -> u32 {
    10
}

fn default_lookup_delay_ms() -> u64 {
    200
}

fn default_lookup_retries() -> u32 {
    15
}

fn default_settle_delay_ms() -> u64 {
    100
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            wrapper_delay_ms: default_wrapper_delay_ms(),
            wrapper_retries: default_wrapper_retries(),
            lookup_delay_ms: default_lookup_delay_ms(),
            lookup_retries: default_lookup_retries(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl RetryPolicy {
    pub fn wrapper_delay(&self) -> Duration {
        Duration::from_millis(self.wrapper_delay_ms)
    }

    pub fn lookup_delay(&self) -> Duration {
        Duration::from_millis(self.lookup_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Kind of element a fragment resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    PanelSection,
    ParameterCard,
}

impl TargetKind {
    /// Sections align to the top, cards to the center.
    pub fn scroll_align(self) -> ScrollAlign {
        match self {
            TargetKind::PanelSection => ScrollAlign::Start,
            TargetKind::ParameterCard => ScrollAlign::Center,
        }
    }

    /// Navigation list that has an entry for this kind.
    pub fn nav_kind(self) -> NavEntryKind {
        match self {
            TargetKind::PanelSection => NavEntryKind::Panel,
            TargetKind::ParameterCard => NavEntryKind::Param,
        }
    }
}

/// A fragment resolved against the live tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTarget {
    /// The fragment that was resolved
    pub fragment: String,
    pub kind: TargetKind,
    pub element: ElementRef,
}

/// One way of finding the element for a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStrategy {
    /// Element with that id that is a panel section
    SectionById,
    /// Element with that id that is a parameter card
    CardById,
    /// Parameter card carrying the fragment as its data key
    CardByKey,
}

impl LookupStrategy {
    /// Strategies in the order they are tried.
    pub const ORDER: [LookupStrategy; 3] = [
        LookupStrategy::SectionById,
        LookupStrategy::CardById,
        LookupStrategy::CardByKey,
    ];

    pub fn lookup(self, tree: &impl ContentTree, id: &str) -> Option<NavigationTarget> {
        let (element, kind) = match self {
            LookupStrategy::SectionById => tree
                .element_by_id(id)
                .filter(|e| e.kind == ElementKind::PanelSection)
                .map(|e| (e, TargetKind::PanelSection)),
            LookupStrategy::CardById => tree
                .element_by_id(id)
                .filter(|e| e.kind == ElementKind::ParameterCard)
                .map(|e| (e, TargetKind::ParameterCard)),
            LookupStrategy::CardByKey => tree
                .card_by_key(id)
                .filter(|e| e.kind == ElementKind::ParameterCard)
                .map(|e| (e, TargetKind::ParameterCard)),
        }?;
        Some(NavigationTarget {
            fragment: id.to_string(),
            kind,
            element,
        })
    }

    /// Try every strategy in order.
    pub fn resolve(tree: &impl ContentTree, id: &str) -> Option<NavigationTarget> {
        Self::ORDER.iter().find_map(|s| s.lookup(tree, id))
    }
}

/// Resolution state for the current fragment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResolverState {
    #[default]
    Idle,
    Pending { target: String, retries: u32 },
    Resolved { target: String },
    Exhausted { target: String },
}

/// Deferred work produced by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavTask {
    /// Look for `target` again; `attempt` is the retry number.
    Retry { target: String, attempt: u32 },
    /// Layout has settled: scroll to and emphasize the target.
    Settle(NavigationTarget),
}

/// A task the caller has to schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Followup {
    pub delay: Duration,
    pub task: NavTask,
}

/// Which backoff track a failed attempt falls on.
#[derive(Debug, Clone, Copy)]
enum RetryTrack {
    WrapperMissing,
    LookupFailed,
}

/// A resolution that ran out of retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavDiagnostic {
    pub target: String,
    pub retries: u32,
    /// Sections that were rendered when the budget ran out
    pub known_sections: Vec<String>,
}

/// Retry attempts at which the known section ids are logged.
const DIAGNOSTIC_ATTEMPTS: [u32; 2] = [0, 5];

/// Bounded-retry deep-link resolver.
#[derive(Debug, Clone, Default)]
pub struct DeepLinkResolver {
    policy: RetryPolicy,
    state: ResolverState,
    diagnostics: Vec<NavDiagnostic>,
    /// When the current pending resolution was triggered
    started: Option<Instant>,
}

impl DeepLinkResolver {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: ResolverState::Idle,
            diagnostics: Vec::new(),
            started: None,
        }
    }

    pub fn state(&self) -> &ResolverState {
        &self.state
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Exhausted resolutions, oldest first.
    pub fn diagnostics(&self) -> &[NavDiagnostic] {
        &self.diagnostics
    }

    /// A lifecycle signal (DOM ready, load, fragment change) asks for the
    /// fragment to be shown.
    ///
    /// Empty fragments are ignored. A fragment that is already resolved,
    /// or already pending, is a duplicate trigger and changes nothing.
    /// Anything else restarts the machine at `Pending(fragment, 0)`.
    pub fn trigger(&mut self, fragment: Option<&str>, tree: &impl ContentTree) -> Option<Followup> {
        let fragment = fragment.filter(|f| !f.is_empty())?;
        match &self.state {
            ResolverState::Resolved { target } | ResolverState::Pending { target, .. }
                if target == fragment =>
            {
                log::trace!("Duplicate navigation trigger for '{}'", fragment);
                return None;
            }
            _ => {}
        }
        log::info!("Navigating to fragment '{}'", fragment);
        self.state = ResolverState::Pending {
            target: fragment.to_string(),
            retries: 0,
        };
        self.started = Some(Instant::now());
        self.attempt(tree)
    }

    /// A scheduled retry fired.
    ///
    /// Does nothing when the address now shows another fragment or when
    /// the machine has moved on from this attempt.
    pub fn on_retry(
        &mut self,
        target: &str,
        attempt: u32,
        current_fragment: Option<&str>,
        tree: &impl ContentTree,
    ) -> Option<Followup> {
        if current_fragment != Some(target) {
            log::debug!(
                "Navigation to '{}' superseded by {:?}, dropping retry {}",
                target,
                current_fragment,
                attempt
            );
            return None;
        }
        match &self.state {
            ResolverState::Pending {
                target: pending,
                retries,
            } if pending == target && *retries == attempt => self.attempt(tree),
            _ => None,
        }
    }

    /// Whether a settle task still applies: its target is the resolved
    /// one and still the current fragment.
    pub fn should_settle(&self, target: &NavigationTarget, current_fragment: Option<&str>) -> bool {
        let resolved = matches!(
            &self.state,
            ResolverState::Resolved { target: t } if *t == target.fragment
        );
        resolved && current_fragment == Some(target.fragment.as_str())
    }

    /// Record a navigation that happened directly (a click), so later
    /// lifecycle triggers for the same fragment are no-ops.
    pub fn mark_resolved(&mut self, fragment: &str) {
        self.state = ResolverState::Resolved {
            target: fragment.to_string(),
        };
    }

    fn elapsed(&self) -> Duration {
        self.started.map(|t| t.elapsed()).unwrap_or_default()
    }

    fn attempt(&mut self, tree: &impl ContentTree) -> Option<Followup> {
        let ResolverState::Pending { target, retries } = self.state.clone() else {
            return None;
        };

        if !tree.has_content_wrapper() {
            log::trace!("Content not rendered yet (attempt {})", retries);
            return self.retry_or_exhaust(tree, target, retries, RetryTrack::WrapperMissing);
        }

        if let Some(found) = LookupStrategy::resolve(tree, &target) {
            log::debug!(
                "Found {:?} for '{}' after {} retries ({:?})",
                found.kind,
                target,
                retries,
                self.elapsed()
            );
            self.state = ResolverState::Resolved { target };
            return Some(Followup {
                delay: self.policy.settle_delay(),
                task: NavTask::Settle(found),
            });
        }

        if DIAGNOSTIC_ATTEMPTS.contains(&retries) {
            log::debug!(
                "No element for '{}' yet; rendered sections: {:?}",
                target,
                tree.section_ids()
            );
        }
        self.retry_or_exhaust(tree, target, retries, RetryTrack::LookupFailed)
    }

    fn retry_or_exhaust(
        &mut self,
        tree: &impl ContentTree,
        target: String,
        retries: u32,
        track: RetryTrack,
    ) -> Option<Followup> {
        let (delay, budget) = match track {
            RetryTrack::WrapperMissing => {
                (self.policy.wrapper_delay(), self.policy.wrapper_retries)
            }
            RetryTrack::LookupFailed => (self.policy.lookup_delay(), self.policy.lookup_retries),
        };

        if retries >= budget {
            log::warn!(
                "Failed to find element for fragment '{}' after {} retries ({:?}, {:?})",
                target,
                retries,
                track,
                self.elapsed()
            );
            self.diagnostics.push(NavDiagnostic {
                target: target.clone(),
                retries,
                known_sections: tree.section_ids(),
            });
            self.state = ResolverState::Exhausted { target };
            return None;
        }

        let attempt = retries + 1;
        self.state = ResolverState::Pending {
            target: target.clone(),
            retries: attempt,
        };
        Some(Followup {
            delay,
            task: NavTask::Retry { target, attempt },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::sample_catalog;
    use crate::page::{PageEffects, StaticPage};

    fn policy() -> RetryPolicy {
        RetryPolicy::default()
    }

    /// Drive retries until the machine stops asking for more.
    fn run(
        resolver: &mut DeepLinkResolver,
        page: &StaticPage,
        mut next: Option<Followup>,
    ) -> (Option<NavigationTarget>, u32) {
        let mut retries = 0;
        while let Some(followup) = next.take() {
            match followup.task {
                NavTask::Retry { target, attempt } => {
                    retries += 1;
                    let current = page.current_fragment();
                    next = resolver.on_retry(&target, attempt, current.as_deref(), page);
                }
                NavTask::Settle(found) => return (Some(found), retries),
            }
        }
        (None, retries)
    }

    #[test]
    fn test_section_resolves_immediately() {
        let mut page = StaticPage::from_catalog(&sample_catalog());
        page.set_fragment(Some("capture"));
        let mut resolver = DeepLinkResolver::new(policy());

        let followup = resolver.trigger(Some("capture"), &page).unwrap();
        assert_eq!(followup.delay, Duration::from_millis(100));
        let NavTask::Settle(found) = followup.task else {
            panic!("expected settle");
        };
        assert_eq!(found.kind, TargetKind::PanelSection);
        assert_eq!(found.kind.scroll_align(), ScrollAlign::Start);
        assert_eq!(
            resolver.state(),
            &ResolverState::Resolved {
                target: "capture".to_string()
            }
        );
    }

    #[test]
    fn test_card_resolves_with_center_alignment() {
        let page = StaticPage::from_catalog(&sample_catalog());
        let target = LookupStrategy::resolve(&page, "impostor-distribution-azimuth").unwrap();
        assert_eq!(target.kind, TargetKind::ParameterCard);
        assert_eq!(target.kind.scroll_align(), ScrollAlign::Center);
        assert_eq!(target.kind.nav_kind(), NavEntryKind::Param);
    }

    #[test]
    fn test_empty_fragment_is_noop() {
        let page = StaticPage::from_catalog(&sample_catalog());
        let mut resolver = DeepLinkResolver::new(policy());
        assert!(resolver.trigger(None, &page).is_none());
        assert!(resolver.trigger(Some(""), &page).is_none());
        assert_eq!(resolver.state(), &ResolverState::Idle);
    }

    #[test]
    fn test_missing_wrapper_uses_short_track() {
        let mut page = StaticPage::unrendered();
        page.set_fragment(Some("capture"));
        let mut resolver = DeepLinkResolver::new(policy());

        let followup = resolver.trigger(Some("capture"), &page).unwrap();
        assert_eq!(followup.delay, Duration::from_millis(100));
        assert_eq!(
            followup.task,
            NavTask::Retry {
                target: "capture".to_string(),
                attempt: 1
            }
        );

        let (found, retries) = run(&mut resolver, &page, Some(followup));
        assert!(found.is_none());
        assert_eq!(retries, 10);
        assert_eq!(
            resolver.state(),
            &ResolverState::Exhausted {
                target: "capture".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_target_uses_long_track_then_exhausts() {
        let mut page = StaticPage::from_catalog(&sample_catalog());
        page.set_fragment(Some("nowhere"));
        let mut resolver = DeepLinkResolver::new(policy());

        let followup = resolver.trigger(Some("nowhere"), &page).unwrap();
        assert_eq!(followup.delay, Duration::from_millis(200));
        let (found, retries) = run(&mut resolver, &page, Some(followup));
        assert!(found.is_none());
        assert_eq!(retries, 15);
        assert!(matches!(resolver.state(), ResolverState::Exhausted { .. }));
        let diagnostic = &resolver.diagnostics()[0];
        assert_eq!(diagnostic.target, "nowhere");
        assert_eq!(diagnostic.retries, 15);
        assert_eq!(diagnostic.known_sections, vec!["impostor", "capture"]);
    }

    #[test]
    fn test_late_render_resolves() {
        let catalog = sample_catalog();
        let mut page = StaticPage::unrendered();
        page.set_fragment(Some("impostor-distribution-azimuth"));
        let mut resolver = DeepLinkResolver::new(policy());

        let first = resolver
            .trigger(Some("impostor-distribution-azimuth"), &page)
            .unwrap();
        let NavTask::Retry { target, attempt } = first.task else {
            panic!("expected retry");
        };
        page.render_content(&catalog);
        let next = resolver.on_retry(
            &target,
            attempt,
            Some("impostor-distribution-azimuth"),
            &page,
        );
        assert!(matches!(
            next,
            Some(Followup {
                task: NavTask::Settle(_),
                ..
            })
        ));
    }

    #[test]
    fn test_superseded_retry_is_dropped() {
        let page = StaticPage::unrendered();
        let mut resolver = DeepLinkResolver::new(policy());
        let first = resolver.trigger(Some("capture"), &page).unwrap();
        let NavTask::Retry { target, attempt } = first.task else {
            panic!("expected retry");
        };

        // The address moved on to another fragment.
        let second = resolver.trigger(Some("impostor"), &page);
        assert!(second.is_some());
        assert!(resolver.on_retry(&target, attempt, Some("impostor"), &page).is_none());
        assert_eq!(
            resolver.state(),
            &ResolverState::Pending {
                target: "impostor".to_string(),
                retries: 1
            }
        );
    }

    #[test]
    fn test_duplicate_triggers_are_noops() {
        let page = StaticPage::from_catalog(&sample_catalog());
        let mut resolver = DeepLinkResolver::new(policy());
        assert!(resolver.trigger(Some("capture"), &page).is_some());
        assert!(resolver.trigger(Some("capture"), &page).is_none());

        let unrendered = StaticPage::unrendered();
        let mut resolver = DeepLinkResolver::new(policy());
        assert!(resolver.trigger(Some("capture"), &unrendered).is_some());
        assert!(resolver.trigger(Some("capture"), &unrendered).is_none());
    }

    #[test]
    fn test_exhausted_target_can_be_retriggered() {
        let mut page = StaticPage::unrendered();
        page.set_fragment(Some("capture"));
        let mut resolver = DeepLinkResolver::new(RetryPolicy {
            wrapper_retries: 0,
            ..policy()
        });
        assert!(resolver.trigger(Some("capture"), &page).is_none());
        assert!(matches!(resolver.state(), ResolverState::Exhausted { .. }));

        page.render_content(&sample_catalog());
        assert!(resolver.trigger(Some("capture"), &page).is_some());
    }

    #[test]
    fn test_should_settle_checks_fragment() {
        let page = StaticPage::from_catalog(&sample_catalog());
        let mut resolver = DeepLinkResolver::new(policy());
        let NavTask::Settle(found) = resolver.trigger(Some("capture"), &page).unwrap().task else {
            panic!("expected settle");
        };
        assert!(resolver.should_settle(&found, Some("capture")));
        assert!(!resolver.should_settle(&found, Some("impostor")));
    }
}
