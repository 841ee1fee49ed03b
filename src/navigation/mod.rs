//! Deep-link navigation: fragment parsing, bounded-retry resolution and
//! the emphasis applied to whatever navigation lands on.

mod fragment;
mod highlight;
mod resolver;

pub use fragment::parse_fragment;
pub use highlight::NavHighlighter;
pub use resolver::{
    DeepLinkResolver, Followup, LookupStrategy, NavDiagnostic, NavTask, NavigationTarget,
    ResolverState, RetryPolicy, TargetKind,
};
