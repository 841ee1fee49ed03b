//! Navigation fragment parsing (`#capture`, `#impostor-distribution-azimuth`).

/// Extract the target id from a location.
///
/// `hash` is the location's hash (with or without the leading `#`). When it
/// is empty the part of `href` after the first `#` is used instead, since
/// some embedded browsers leave the hash unset on `file://` pages.
/// Returns `None` when there is no fragment; that is a no-op, not an error.
pub fn parse_fragment(hash: &str, href: &str) -> Option<String> {
    let from_hash = hash.strip_prefix('#').unwrap_or(hash);
    let fragment = if from_hash.is_empty() {
        href.split_once('#').map(|(_, rest)| rest).unwrap_or_default()
    } else {
        from_hash
    };
    let fragment = fragment.trim();
    (!fragment.is_empty()).then(|| fragment.to_string())
}
