//! Image references stored per parameter.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix of embedded (self-contained) image references.
pub const DATA_URL_PREFIX: &str = "data:";

/// A single image reference: a remote URL or an embedded data reference.
///
/// The only validation is that the trimmed text is not empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageEntry(String);

impl ImageEntry {
    /// Create an entry from raw text, trimming surrounding whitespace.
    /// Returns `None` when nothing is left.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The reference as it is handed to an image source.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is an embedded data reference rather than a URL.
    pub fn is_embedded(&self) -> bool {
        self.0.starts_with(DATA_URL_PREFIX)
    }

    /// Short form for logs; embedded references can be megabytes long.
    pub fn summary(&self) -> String {
        const MAX: usize = 48;
        if self.is_embedded() {
            let mime = self
                .0
                .trim_start_matches(DATA_URL_PREFIX)
                .split([';', ','])
                .next()
                .unwrap_or_default();
            format!("<embedded {mime}, {} bytes>", self.0.len())
        } else if self.0.chars().count() > MAX {
            let head: String = self.0.chars().take(MAX).collect();
            format!("{head}…")
        } else {
            self.0.clone()
        }
    }

    pub(crate) fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ImageEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
