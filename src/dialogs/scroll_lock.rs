use crate::dom::Document;
use tracing::debug;

/// Background scroll lock held while any dialog is mounted.
///
/// Saves the body's inline `overflow` and `padding-right`, hides overflow,
/// and pads by the scrollbar width so content does not shift.
#[derive(Debug)]
pub(crate) struct ScrollLock {
    overflow: Option<String>,
    padding_right: Option<String>,
}

impl ScrollLock {
    pub(crate) fn engage<D: Document + ?Sized>(doc: &mut D) -> Self {
        let body = doc.body();
        let lock = Self {
            overflow: doc.style(body, "overflow").map(str::to_string),
            padding_right: doc.style(body, "padding-right").map(str::to_string),
        };

        let scrollbar_width = doc.scrollbar_width();
        doc.set_style(body, "overflow", Some("hidden"));
        if scrollbar_width > 0 {
            doc.set_style(body, "padding-right", Some(&format!("{}px", scrollbar_width)));
        }

        debug!(scrollbar_width, "Background scroll locked");
        lock
    }

    pub(crate) fn release<D: Document + ?Sized>(self, doc: &mut D) {
        let body = doc.body();
        doc.set_style(body, "overflow", self.overflow.as_deref());
        doc.set_style(body, "padding-right", self.padding_right.as_deref());
        debug!("Background scroll released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementTree;

    #[test]
    fn test_lock_compensates_scrollbar_and_restores() {
        let mut tree = ElementTree::new();
        let body = tree.body();
        tree.set_scrollbar_width(15);
        tree.set_style(body, "overflow", Some("auto"));

        let lock = ScrollLock::engage(&mut tree);
        assert_eq!(tree.style(body, "overflow"), Some("hidden"));
        assert_eq!(tree.style(body, "padding-right"), Some("15px"));

        lock.release(&mut tree);
        assert_eq!(tree.style(body, "overflow"), Some("auto"));
        assert_eq!(tree.style(body, "padding-right"), None);
    }

    #[test]
    fn test_no_padding_without_scrollbar() {
        let mut tree = ElementTree::new();
        let body = tree.body();

        let lock = ScrollLock::engage(&mut tree);
        assert_eq!(tree.style(body, "padding-right"), None);

        lock.release(&mut tree);
        assert_eq!(tree.style(body, "overflow"), None);
    }
}
