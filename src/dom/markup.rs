use super::{Document, ElementId};

/// Attribute marking an element whose activation closes the dialog
pub const CLOSE_ATTRIBUTE: &str = "data-affirm-close";

/// Declarative element description that can be mounted into a [`Document`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<Markup>,
}

impl Markup {
    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Set an attribute only when `value` is present
    pub fn attr_opt(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.attr(name, value),
            None => self,
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn child(mut self, child: Markup) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Markup>) -> Self {
        self.children.extend(children);
        self
    }

    /// Activating this element closes the dialog with `outcome`
    pub fn closes_with(self, outcome: bool) -> Self {
        self.attr(CLOSE_ATTRIBUTE, if outcome { "true" } else { "false" })
    }

    /// Create the elements in `document` and append them to `parent`
    pub fn mount<D: Document + ?Sized>(&self, document: &mut D, parent: ElementId) -> ElementId {
        let element = document.create_element(&self.tag);
        for (name, value) in &self.attributes {
            document.set_attribute(element, name, value);
        }
        if let Some(text) = &self.text {
            document.set_text(element, text);
        }
        for child in &self.children {
            child.mount(document, element);
        }
        document.append_child(parent, element);
        element
    }
}
