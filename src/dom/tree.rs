use super::{Document, ElementId};
use crate::dialogs::TextDirection;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attributes: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    text: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
            styles: BTreeMap::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Arena-backed in-memory [`Document`].
///
/// Element ids are indices into the arena and are never reused, so a stale
/// id simply refers to a detached element.
#[derive(Debug, Clone)]
pub struct ElementTree {
    nodes: Vec<Node>,
    body: ElementId,
    focused: Option<ElementId>,
    scrollbar_width: u16,
    prefers_dark: bool,
    root_dir: Option<TextDirection>,
}

impl ElementTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new("body")],
            body: ElementId(0),
            focused: None,
            scrollbar_width: 0,
            prefers_dark: false,
            root_dir: None,
        }
    }

    pub fn set_scrollbar_width(&mut self, width: u16) {
        self.scrollbar_width = width;
    }

    pub fn set_prefers_dark(&mut self, dark: bool) {
        self.prefers_dark = dark;
    }

    pub fn set_root_dir(&mut self, dir: Option<TextDirection>) {
        self.root_dir = dir;
    }

    /// Create an element with `tag` and append it to `parent`
    pub fn append_new(&mut self, parent: ElementId, tag: &str) -> ElementId {
        let element = self.create_element(tag);
        self.append_child(parent, element);
        element
    }

    fn node(&self, element: ElementId) -> Option<&Node> {
        self.nodes.get(element.0)
    }

    fn node_mut(&mut self, element: ElementId) -> Option<&mut Node> {
        self.nodes.get_mut(element.0)
    }

    fn detach(&mut self, element: ElementId) {
        let parent = self.node(element).and_then(|node| node.parent);
        if let Some(parent) = parent {
            if let Some(parent_node) = self.node_mut(parent) {
                parent_node.children.retain(|child| *child != element);
            }
        }
        if let Some(node) = self.node_mut(element) {
            node.parent = None;
        }
    }
}

impl Default for ElementTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for ElementTree {
    fn body(&self) -> ElementId {
        self.body
    }

    fn create_element(&mut self, tag: &str) -> ElementId {
        self.nodes.push(Node::new(tag));
        ElementId(self.nodes.len() - 1)
    }

    fn append_child(&mut self, parent: ElementId, child: ElementId) {
        if parent == child || self.contains(child, parent) {
            return;
        }
        self.detach(child);
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.push(child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
    }

    fn remove(&mut self, element: ElementId) {
        if element == self.body {
            return;
        }
        if let Some(focused) = self.focused {
            if self.contains(element, focused) {
                self.focused = None;
            }
        }
        self.detach(element);
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.node(element).and_then(|node| node.parent)
    }

    fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.node(element)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    fn tag(&self, element: ElementId) -> Option<&str> {
        self.node(element).map(|node| node.tag.as_str())
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<&str> {
        self.node(element)
            .and_then(|node| node.attributes.get(name))
            .map(String::as_str)
    }

    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) {
        if let Some(node) = self.node_mut(element) {
            node.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn remove_attribute(&mut self, element: ElementId, name: &str) {
        if let Some(node) = self.node_mut(element) {
            node.attributes.remove(name);
        }
    }

    fn text(&self, element: ElementId) -> Option<&str> {
        self.node(element).map(|node| node.text.as_str())
    }

    fn set_text(&mut self, element: ElementId, text: &str) {
        if let Some(node) = self.node_mut(element) {
            node.text = text.to_string();
        }
    }

    fn style(&self, element: ElementId, property: &str) -> Option<&str> {
        self.node(element)
            .and_then(|node| node.styles.get(property))
            .map(String::as_str)
    }

    fn set_style(&mut self, element: ElementId, property: &str, value: Option<&str>) {
        if let Some(node) = self.node_mut(element) {
            match value {
                Some(value) => {
                    node.styles.insert(property.to_string(), value.to_string());
                }
                None => {
                    node.styles.remove(property);
                }
            }
        }
    }

    fn active_element(&self) -> Option<ElementId> {
        self.focused
    }

    fn focus(&mut self, element: ElementId) {
        if self.is_connected(element) {
            self.focused = Some(element);
        }
    }

    fn scrollbar_width(&self) -> u16 {
        self.scrollbar_width
    }

    fn prefers_dark(&self) -> bool {
        self.prefers_dark
    }

    fn root_dir(&self) -> Option<TextDirection> {
        self.root_dir
    }
}
