//! Host element tree abstraction
//!
//! The dialog core never talks to a concrete UI toolkit. Everything it needs
//! from the host (building markup, attributes, focus, the page's scrollbar)
//! goes through the [`Document`] trait. [`ElementTree`] is the in-memory
//! implementation used by the terminal host and by tests.

mod markup;
mod tree;

pub use markup::{Markup, CLOSE_ATTRIBUTE};
pub use tree::ElementTree;

use crate::dialogs::TextDirection;

/// Opaque handle to an element in a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) usize);

impl ElementId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Minimal document model the dialog core renders into
pub trait Document {
    /// Top-level container all application content hangs off
    fn body(&self) -> ElementId;

    fn create_element(&mut self, tag: &str) -> ElementId;

    /// Append `child` to `parent`, detaching it from any previous parent
    fn append_child(&mut self, parent: ElementId, child: ElementId);

    /// Detach `element` and its subtree. Focus inside the subtree is lost.
    fn remove(&mut self, element: ElementId);

    fn parent(&self, element: ElementId) -> Option<ElementId>;

    fn children(&self, element: ElementId) -> Vec<ElementId>;

    fn tag(&self, element: ElementId) -> Option<&str>;

    fn attribute(&self, element: ElementId, name: &str) -> Option<&str>;

    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str);

    fn remove_attribute(&mut self, element: ElementId, name: &str);

    fn text(&self, element: ElementId) -> Option<&str>;

    fn set_text(&mut self, element: ElementId, text: &str);

    /// Inline style property
    fn style(&self, element: ElementId, property: &str) -> Option<&str>;

    /// Set (`Some`) or clear (`None`) an inline style property
    fn set_style(&mut self, element: ElementId, property: &str, value: Option<&str>);

    fn active_element(&self) -> Option<ElementId>;

    /// Move focus. Ignored for elements not attached to the body.
    fn focus(&mut self, element: ElementId);

    /// Width of the page scrollbar, zero when it overlays content
    fn scrollbar_width(&self) -> u16 {
        0
    }

    /// Whether the host prefers a dark color scheme
    fn prefers_dark(&self) -> bool {
        false
    }

    /// Text direction declared on the document root
    fn root_dir(&self) -> Option<TextDirection> {
        None
    }

    fn has_attribute(&self, element: ElementId, name: &str) -> bool {
        self.attribute(element, name).is_some()
    }

    /// Whether `node` is `ancestor` or lives inside it
    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        let mut current = Some(node);
        while let Some(element) = current {
            if element == ancestor {
                return true;
            }
            current = self.parent(element);
        }
        false
    }

    /// Whether `element` is reachable from the body
    fn is_connected(&self, element: ElementId) -> bool {
        self.contains(self.body(), element)
    }

    /// Every element below `root` in document order, `root` excluded
    fn descendants(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self.children(root).into_iter().rev().collect();
        while let Some(element) = stack.pop() {
            out.push(element);
            stack.extend(self.children(element).into_iter().rev());
        }
        out
    }

    /// First element below `root` carrying `attribute`
    fn find_by_attribute(&self, root: ElementId, attribute: &str) -> Option<ElementId> {
        self.descendants(root)
            .into_iter()
            .find(|element| self.has_attribute(*element, attribute))
    }
}
