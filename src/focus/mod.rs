//! Focus trap for modal content
//!
//! While active, the trap keeps keyboard focus inside a container, marks the
//! rest of the document `inert`, and puts focus back where it was on release.

use crate::dom::{Document, ElementId};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

/// Attribute that exempts a top-level element from being made inert
const EXEMPT_ATTRIBUTE: &str = "data-affirm";

/// Focusable elements inside `container`, in document order.
///
/// Buttons, form fields, `a`/`area` links with an `href`, and anything with
/// an explicit non-negative `tabindex`. An explicit negative `tabindex`
/// removes even a button or field from the tab order, and `href` on other
/// tags does nothing, as in a browser. Disabled elements are skipped.
/// Always computed from the live tree.
pub fn focusable_elements<D: Document + ?Sized>(doc: &D, container: ElementId) -> Vec<ElementId> {
    doc.descendants(container)
        .into_iter()
        .filter(|element| is_focusable(doc, *element))
        .collect()
}

fn is_focusable<D: Document + ?Sized>(doc: &D, element: ElementId) -> bool {
    if doc.has_attribute(element, "disabled") {
        return false;
    }

    // An unparsable tabindex is ignored.
    if let Some(tabindex) = doc
        .attribute(element, "tabindex")
        .and_then(|value| value.trim().parse::<i32>().ok())
    {
        return tabindex >= 0;
    }

    match doc.tag(element) {
        Some("button") | Some("input") | Some("select") | Some("textarea") => true,
        Some("a") | Some("area") => doc.has_attribute(element, "href"),
        _ => false,
    }
}

/// Move focus one step forward or backward among the focusables of
/// `container`, wrapping at either end. Focus outside the container lands
/// on the first (or last) focusable.
pub fn focus_step<D: Document + ?Sized>(doc: &mut D, container: ElementId, forward: bool) -> bool {
    let focusable = focusable_elements(doc, container);
    if focusable.is_empty() {
        return false;
    }

    let current = doc
        .active_element()
        .and_then(|active| focusable.iter().position(|el| *el == active));

    let last = focusable.len() - 1;
    let next = match (current, forward) {
        (Some(index), true) if index < last => index + 1,
        (Some(_), true) => 0,
        (Some(0), false) => last,
        (Some(index), false) => index - 1,
        (None, true) => 0,
        (None, false) => last,
    };

    doc.focus(focusable[next]);
    true
}

/// Keyboard focus trap bound to one container.
///
/// Create a fresh trap for every dialog showing.
#[derive(Debug)]
pub struct FocusTrap {
    container: ElementId,
    previously_focused: Option<ElementId>,
    pending_initial: Option<Option<ElementId>>,
    inerted: Vec<ElementId>,
    active: bool,
}

impl FocusTrap {
    pub fn new(container: ElementId) -> Self {
        Self {
            container,
            previously_focused: None,
            pending_initial: None,
            inerted: Vec::new(),
            active: false,
        }
    }

    pub fn container(&self) -> ElementId {
        self.container
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Engage the trap.
    ///
    /// Remembers the focused element, marks unrelated top-level content
    /// inert, and schedules focus for the next frame: `initial` if given,
    /// otherwise the first focusable descendant.
    pub fn activate<D: Document + ?Sized>(&mut self, doc: &mut D, initial: Option<ElementId>) {
        if self.active {
            self.release_inert(doc);
        }

        self.previously_focused = doc.active_element();
        self.active = true;

        let body = doc.body();
        for element in doc.children(body) {
            if doc.contains(element, self.container) || doc.has_attribute(element, EXEMPT_ATTRIBUTE) {
                continue;
            }
            if doc.has_attribute(element, "inert") {
                continue;
            }
            doc.set_attribute(element, "inert", "");
            self.inerted.push(element);
        }

        self.pending_initial = Some(initial);
        trace!(inerted = self.inerted.len(), "Focus trap activated");
    }

    /// Apply focus scheduled by [`FocusTrap::activate`]. Call once the
    /// container has been painted.
    pub fn on_frame<D: Document + ?Sized>(&mut self, doc: &mut D) {
        let Some(initial) = self.pending_initial.take() else {
            return;
        };
        if !self.active {
            return;
        }

        match initial {
            Some(target) => doc.focus(target),
            None => {
                if let Some(first) = focusable_elements(doc, self.container).first() {
                    doc.focus(*first);
                }
            }
        }
    }

    /// Wrap Tab / Shift+Tab at the container boundary. Returns whether the
    /// key was consumed.
    pub fn handle_key<D: Document + ?Sized>(&self, doc: &mut D, key: &KeyEvent) -> bool {
        if !self.active {
            return false;
        }

        let backward = match key.code {
            KeyCode::Tab => key.modifiers.contains(KeyModifiers::SHIFT),
            KeyCode::BackTab => true,
            _ => return false,
        };

        let focusable = focusable_elements(doc, self.container);
        let (Some(first), Some(last)) = (focusable.first().copied(), focusable.last().copied()) else {
            return false;
        };

        let active = doc.active_element();
        if backward && active == Some(first) {
            doc.focus(last);
            true
        } else if !backward && active == Some(last) {
            doc.focus(first);
            true
        } else {
            false
        }
    }

    /// Release the trap and return focus to where it was before activation
    pub fn deactivate<D: Document + ?Sized>(&mut self, doc: &mut D) {
        if !self.active {
            return;
        }
        self.active = false;
        self.pending_initial = None;
        self.release_inert(doc);

        if let Some(previous) = self.previously_focused.take() {
            doc.focus(previous);
        }
        trace!("Focus trap deactivated");
    }

    fn release_inert<D: Document + ?Sized>(&mut self, doc: &mut D) {
        for element in self.inerted.drain(..) {
            doc.remove_attribute(element, "inert");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementTree;

    fn tab() -> KeyEvent {
        KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE)
    }

    fn shift_tab() -> KeyEvent {
        KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT)
    }

    struct Fixture {
        tree: ElementTree,
        trigger: ElementId,
        sidebar: ElementId,
        container: ElementId,
        a: ElementId,
        b: ElementId,
    }

    fn fixture() -> Fixture {
        let mut tree = ElementTree::new();
        let body = tree.body();
        let sidebar = tree.append_new(body, "nav");
        let trigger = tree.append_new(sidebar, "button");
        let portal = tree.append_new(body, "div");
        let container = tree.append_new(portal, "div");
        let a = tree.append_new(container, "button");
        let b = tree.append_new(container, "button");
        tree.focus(trigger);

        Fixture {
            tree,
            trigger,
            sidebar,
            container,
            a,
            b,
        }
    }

    #[test]
    fn test_focusable_filter() {
        let mut tree = ElementTree::new();
        let body = tree.body();
        let button = tree.append_new(body, "button");
        let disabled = tree.append_new(body, "button");
        tree.set_attribute(disabled, "disabled", "");
        let link = tree.append_new(body, "a");
        tree.set_attribute(link, "href", "#");
        let bare_link = tree.append_new(body, "a");
        let div = tree.append_new(body, "div");
        let tabbable = tree.append_new(body, "div");
        tree.set_attribute(tabbable, "tabindex", "0");
        let untabbable = tree.append_new(body, "input");
        tree.set_attribute(untabbable, "tabindex", "-1");

        let focusable = focusable_elements(&tree, body);

        assert_eq!(focusable, vec![button, link, tabbable]);
        assert!(!focusable.contains(&bare_link));
        assert!(!focusable.contains(&div));
    }

    #[test]
    fn test_tabindex_and_href_follow_browser_tab_order() {
        let mut tree = ElementTree::new();
        let body = tree.body();
        let skipped_button = tree.append_new(body, "button");
        tree.set_attribute(skipped_button, "tabindex", "-1");
        let div_with_href = tree.append_new(body, "div");
        tree.set_attribute(div_with_href, "href", "#");
        let garbage = tree.append_new(body, "button");
        tree.set_attribute(garbage, "tabindex", "soon");
        let area = tree.append_new(body, "area");
        tree.set_attribute(area, "href", "#map");
        let positive = tree.append_new(body, "span");
        tree.set_attribute(positive, "tabindex", " 2 ");

        assert_eq!(focusable_elements(&tree, body), vec![garbage, area, positive]);
    }

    #[test]
    fn test_activate_focuses_first_on_frame() {
        let mut f = fixture();
        let mut trap = FocusTrap::new(f.container);

        trap.activate(&mut f.tree, None);
        assert_eq!(f.tree.active_element(), Some(f.trigger));

        trap.on_frame(&mut f.tree);
        assert_eq!(f.tree.active_element(), Some(f.a));
    }

    #[test]
    fn test_activate_prefers_initial_target() {
        let mut f = fixture();
        let mut trap = FocusTrap::new(f.container);

        trap.activate(&mut f.tree, Some(f.b));
        trap.on_frame(&mut f.tree);

        assert_eq!(f.tree.active_element(), Some(f.b));
    }

    #[test]
    fn test_tab_wraps_at_boundaries() {
        let mut f = fixture();
        let mut trap = FocusTrap::new(f.container);
        trap.activate(&mut f.tree, None);
        trap.on_frame(&mut f.tree);

        f.tree.focus(f.b);
        assert!(trap.handle_key(&mut f.tree, &tab()));
        assert_eq!(f.tree.active_element(), Some(f.a));

        assert!(trap.handle_key(&mut f.tree, &shift_tab()));
        assert_eq!(f.tree.active_element(), Some(f.b));

        // Not at a boundary: left to default traversal
        f.tree.focus(f.a);
        assert!(!trap.handle_key(&mut f.tree, &tab()));
    }

    #[test]
    fn test_focusables_are_recomputed_on_each_key() {
        let mut f = fixture();
        let mut trap = FocusTrap::new(f.container);
        trap.activate(&mut f.tree, None);
        trap.on_frame(&mut f.tree);

        let c = f.tree.append_new(f.container, "button");
        f.tree.focus(f.b);
        assert!(!trap.handle_key(&mut f.tree, &tab()));

        f.tree.focus(c);
        assert!(trap.handle_key(&mut f.tree, &tab()));
        assert_eq!(f.tree.active_element(), Some(f.a));
    }

    #[test]
    fn test_inert_applied_and_restored() {
        let mut f = fixture();
        let body = f.tree.body();
        let exempt = f.tree.append_new(body, "div");
        f.tree.set_attribute(exempt, "data-affirm", "");
        let already_inert = f.tree.append_new(body, "aside");
        f.tree.set_attribute(already_inert, "inert", "");
        let portal = f.tree.parent(f.container).unwrap();

        let mut trap = FocusTrap::new(f.container);
        trap.activate(&mut f.tree, None);

        assert!(f.tree.has_attribute(f.sidebar, "inert"));
        assert!(!f.tree.has_attribute(portal, "inert"));
        assert!(!f.tree.has_attribute(exempt, "inert"));

        trap.deactivate(&mut f.tree);

        assert!(!f.tree.has_attribute(f.sidebar, "inert"));
        assert!(f.tree.has_attribute(already_inert, "inert"));
    }

    #[test]
    fn test_deactivate_restores_previous_focus() {
        let mut f = fixture();
        let mut trap = FocusTrap::new(f.container);

        trap.activate(&mut f.tree, None);
        trap.on_frame(&mut f.tree);
        assert_eq!(f.tree.active_element(), Some(f.a));

        trap.deactivate(&mut f.tree);
        assert_eq!(f.tree.active_element(), Some(f.trigger));
    }

    #[test]
    fn test_deactivate_before_frame_skips_initial_focus() {
        let mut f = fixture();
        let mut trap = FocusTrap::new(f.container);

        trap.activate(&mut f.tree, None);
        trap.deactivate(&mut f.tree);
        trap.on_frame(&mut f.tree);

        assert_eq!(f.tree.active_element(), Some(f.trigger));
    }

    #[test]
    fn test_focus_step_wraps() {
        let mut f = fixture();
        f.tree.focus(f.a);

        assert!(focus_step(&mut f.tree, f.container, true));
        assert_eq!(f.tree.active_element(), Some(f.b));
        assert!(focus_step(&mut f.tree, f.container, true));
        assert_eq!(f.tree.active_element(), Some(f.a));
        assert!(focus_step(&mut f.tree, f.container, false));
        assert_eq!(f.tree.active_element(), Some(f.b));
    }
}
