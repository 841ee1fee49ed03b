//! Transient emphasis of the section or card navigation landed on.

use crate::page::{ElementRef, HighlightSurface};

/// Keeps at most one element emphasized at a time.
#[derive(Debug, Clone, Default)]
pub struct NavHighlighter {
    current: Option<ElementRef>,
}

impl NavHighlighter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Element emphasized last.
    pub fn current(&self) -> Option<&ElementRef> {
        self.current.as_ref()
    }

    /// Clear every marker (the target's included, so the transition can
    /// restart), force a reflow, then mark `element`.
    pub fn emphasize(&mut self, surface: &mut impl HighlightSurface, element: &ElementRef) {
        for marked in surface.highlighted() {
            surface.remove_highlight(&marked);
        }
        surface.force_reflow(element);
        surface.add_highlight(element);
        log::debug!("Highlighted {:?} '{}'", element.kind, element.id);
        self.current = Some(element.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::sample_catalog;
    use crate::page::{ElementKind, PageEvent, StaticPage};

    #[test]
    fn test_single_element_emphasized() {
        let mut page = StaticPage::from_catalog(&sample_catalog());
        let mut highlighter = NavHighlighter::new();
        let section = ElementRef::new("capture", ElementKind::PanelSection);
        let card = ElementRef::new("impostor-distribution-azimuth", ElementKind::ParameterCard);

        highlighter.emphasize(&mut page, &section);
        highlighter.emphasize(&mut page, &card);

        assert_eq!(page.highlighted(), vec![card.clone()]);
        assert_eq!(highlighter.current(), Some(&card));
    }

    #[test]
    fn test_same_element_twice_retriggers() {
        let mut page = StaticPage::from_catalog(&sample_catalog());
        let mut highlighter = NavHighlighter::new();
        let section = ElementRef::new("capture", ElementKind::PanelSection);

        highlighter.emphasize(&mut page, &section);
        page.clear_events();
        highlighter.emphasize(&mut page, &section);

        assert_eq!(
            page.events(),
            &[
                PageEvent::HighlightRemoved("capture".to_string()),
                PageEvent::Reflowed("capture".to_string()),
                PageEvent::HighlightAdded("capture".to_string()),
            ]
        );
        assert_eq!(page.highlighted().len(), 1);
    }
}
