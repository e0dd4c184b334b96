//! Dialog markup
//!
//! Builds the element structure for one dialog showing and keeps its state
//! attributes (`data-state`, `disabled`, `aria-busy`, ...) in sync with the
//! presenter. Hosts style and test against these attributes.

use super::events::CloseHandle;
use super::types::{ConfirmRequest, Icon, Spinner, TextDirection, Variant};
use crate::config::ConfirmerConfig;
use crate::dom::{Document, ElementId};

/// Visual lifecycle state exposed as `data-state`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataState {
    /// Mounted, waiting for the first frame
    Initial,
    Open,
    /// Close transition running
    Closed,
}

impl DataState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataState::Initial => "initial",
            DataState::Open => "open",
            DataState::Closed => "closed",
        }
    }
}

/// Built-in glyph for a variant
pub fn builtin_icon(variant: Variant) -> Option<&'static str> {
    match variant {
        Variant::Danger => Some("✖"),
        Variant::Warning => Some("⚠"),
        Variant::Info => Some("ℹ"),
        Variant::Success => Some("✔"),
        Variant::Default => None,
    }
}

/// Everything about a showing that is fixed once it mounts
#[derive(Debug, Clone)]
pub(crate) struct DialogView {
    pub variant: Variant,
    pub icon: Option<String>,
    pub confirm_label: String,
    pub cancel_label: String,
    pub keyword_label: Option<String>,
    pub actions_label: String,
    pub loading_label: String,
    pub spinner: Spinner,
    pub dir: Option<TextDirection>,
    pub dark: bool,
    pub unstyled: bool,
}

impl DialogView {
    pub(crate) fn resolve<D: Document + ?Sized>(
        request: &ConfirmRequest,
        config: &ConfirmerConfig,
        doc: &D,
    ) -> Self {
        let variant = request.variant_or_default();
        let t = &config.translations;

        let icon = match &request.icon {
            Icon::Hidden => None,
            Icon::Custom(text) => Some(text.clone()),
            Icon::Default => config
                .icons
                .for_variant(variant)
                .or_else(|| builtin_icon(variant))
                .map(str::to_string),
        };

        let confirm_label = match &request.confirm_text {
            Some(text) => text.clone(),
            None if request.hide_cancel => t.ok().to_string(),
            None => t.confirm().to_string(),
        };

        let dir = match request.dir.or(config.dir) {
            Some(TextDirection::Auto) | None => match doc.root_dir() {
                Some(TextDirection::Rtl) => Some(TextDirection::Rtl),
                _ => None,
            },
            explicit => explicit,
        };

        Self {
            variant,
            icon,
            confirm_label,
            cancel_label: request
                .cancel_text
                .clone()
                .unwrap_or_else(|| t.cancel().to_string()),
            keyword_label: request
                .confirmation_keyword
                .as_deref()
                .map(|keyword| t.keyword_label(keyword)),
            actions_label: t.dialog_actions().to_string(),
            loading_label: t.loading().to_string(),
            spinner: request
                .spinner
                .clone()
                .or_else(|| config.spinner.clone())
                .unwrap_or_default(),
            dir,
            dark: config.theme.is_dark(doc.prefers_dark()),
            unstyled: config.unstyled || request.unstyled,
        }
    }
}

/// A button whose label hides behind a spinner while it is busy
#[derive(Debug, Clone)]
pub(crate) struct BusyButton {
    pub button: ElementId,
    pub label: ElementId,
    pub spinner: Option<ElementId>,
}

/// Handles to the mounted elements of one showing
#[derive(Debug, Clone)]
pub(crate) struct DialogNodes {
    pub root: ElementId,
    pub overlay: ElementId,
    pub dialog: ElementId,
    pub keyword_input: Option<ElementId>,
    pub cancel: Option<ElementId>,
    pub confirm: Option<BusyButton>,
    pub actions: Vec<BusyButton>,
    pub status: Option<ElementId>,
}

/// Live state mirrored onto the markup
pub(crate) struct Status<'a> {
    pub state: DataState,
    pub loading: bool,
    pub loading_action: Option<usize>,
    pub keyword_input: &'a str,
    pub keyword_matches: bool,
    pub cancelable_while_loading: bool,
    pub loading_label: &'a str,
}

impl Status<'_> {
    fn busy(&self) -> bool {
        self.loading || self.loading_action.is_some()
    }
}

fn append<D: Document + ?Sized>(
    doc: &mut D,
    parent: ElementId,
    tag: &str,
    attributes: &[(&str, &str)],
) -> ElementId {
    let element = doc.create_element(tag);
    for (name, value) in attributes {
        doc.set_attribute(element, name, value);
    }
    doc.append_child(parent, element);
    element
}

fn toggle<D: Document + ?Sized>(doc: &mut D, element: ElementId, name: &str, on: bool, value: &str) {
    if on {
        doc.set_attribute(element, name, value);
    } else {
        doc.remove_attribute(element, name);
    }
}

fn busy_button<D: Document + ?Sized>(
    doc: &mut D,
    parent: ElementId,
    attributes: &[(&str, &str)],
    text: &str,
    spinner: &Spinner,
) -> BusyButton {
    let button = append(doc, parent, "button", attributes);
    let spinner = match spinner {
        Spinner::Hidden => None,
        Spinner::Default => Some(append(
            doc,
            button,
            "span",
            &[("data-affirm-spinner", ""), ("aria-hidden", "true"), ("hidden", "")],
        )),
        Spinner::Custom(glyph) => {
            let element = append(
                doc,
                button,
                "span",
                &[("data-affirm-spinner", ""), ("aria-hidden", "true"), ("hidden", "")],
            );
            doc.set_text(element, glyph);
            Some(element)
        }
    };
    let label = append(doc, button, "span", &[("data-affirm-label", "")]);
    doc.set_text(label, text);
    BusyButton {
        button,
        label,
        spinner,
    }
}

/// Mount the markup for one showing under the document body
pub(crate) fn mount_dialog<D: Document + ?Sized>(
    doc: &mut D,
    request: &ConfirmRequest,
    view: &DialogView,
    generation: u64,
    close: CloseHandle,
) -> DialogNodes {
    let body = doc.body();
    let title_id = format!("affirm-title-{}", generation);
    let description_id = format!("affirm-description-{}", generation);

    let root = append(doc, body, "div", &[("data-affirm", "")]);
    if view.unstyled {
        doc.set_attribute(root, "data-unstyled", "true");
    }
    if let Some(dir) = view.dir {
        doc.set_attribute(root, "dir", dir.as_str());
    }
    if view.dark {
        doc.set_attribute(root, "class", "dark");
    }

    let overlay = append(
        doc,
        root,
        "div",
        &[("data-affirm-overlay", ""), ("aria-hidden", "true")],
    );

    let dialog = append(
        doc,
        root,
        "div",
        &[
            ("data-affirm-dialog", ""),
            ("data-variant", view.variant.as_str()),
            ("data-layout", request.layout_or_default().as_str()),
            ("role", view.variant.role()),
            ("aria-modal", "true"),
        ],
    );
    if let Some(size) = request.size {
        doc.set_attribute(dialog, "data-size", size.as_str());
    }
    if let Some(test_id) = &request.test_id {
        doc.set_attribute(dialog, "data-testid", test_id);
    }
    match &request.aria_label {
        Some(label) => doc.set_attribute(dialog, "aria-label", label),
        None => doc.set_attribute(dialog, "aria-labelledby", &title_id),
    }
    if request.description.is_some() {
        doc.set_attribute(dialog, "aria-describedby", &description_id);
    }

    let mut nodes = DialogNodes {
        root,
        overlay,
        dialog,
        keyword_input: None,
        cancel: None,
        confirm: None,
        actions: Vec::new(),
        status: None,
    };

    if let Some(render) = &request.custom {
        doc.set_attribute(dialog, "data-custom", "");
        render(close).mount(doc, dialog);
        return nodes;
    }

    let content = append(doc, dialog, "div", &[("data-affirm-content", "")]);
    let header = append(doc, content, "div", &[("data-affirm-header", "")]);
    let show_icon = view.variant != Variant::Default || matches!(request.icon, Icon::Custom(_));
    if let (true, Some(icon)) = (show_icon, &view.icon) {
        let element = append(
            doc,
            header,
            "span",
            &[("data-affirm-icon", ""), ("aria-hidden", "true")],
        );
        doc.set_text(element, icon);
    }
    let title = append(doc, header, "h2", &[("id", title_id.as_str()), ("data-affirm-title", "")]);
    doc.set_text(title, &request.title);

    if let Some(description) = &request.description {
        let element = append(
            doc,
            content,
            "div",
            &[("id", description_id.as_str()), ("data-affirm-description", "")],
        );
        doc.set_text(element, description);
    }

    if let Some(label) = &view.keyword_label {
        let keyword = append(doc, dialog, "div", &[("data-affirm-keyword", "")]);
        let label_element = append(doc, keyword, "label", &[("data-affirm-keyword-label", "")]);
        doc.set_text(label_element, label);
        nodes.keyword_input = Some(append(
            doc,
            keyword,
            "input",
            &[("data-affirm-keyword-input", ""), ("value", "")],
        ));
    }

    let footer = append(
        doc,
        dialog,
        "div",
        &[
            ("data-affirm-footer", ""),
            ("role", "group"),
            ("aria-label", view.actions_label.as_str()),
        ],
    );

    if !request.hide_cancel {
        let cancel = append(
            doc,
            footer,
            "button",
            &[("data-affirm-button", ""), ("data-affirm-cancel", "")],
        );
        if let Some(test_id) = &request.test_id {
            doc.set_attribute(cancel, "data-testid", &format!("{}-cancel", test_id));
        }
        doc.set_text(cancel, &view.cancel_label);
        nodes.cancel = Some(cancel);
    }

    for (index, action) in request.actions.iter().enumerate() {
        let index = index.to_string();
        nodes.actions.push(busy_button(
            doc,
            footer,
            &[
                ("data-affirm-button", ""),
                ("data-affirm-action", index.as_str()),
            ],
            &action.label,
            &view.spinner,
        ));
    }

    let confirm = busy_button(
        doc,
        footer,
        &[
            ("data-affirm-button", ""),
            ("data-affirm-confirm", ""),
            ("data-variant", view.variant.as_str()),
        ],
        &view.confirm_label,
        &view.spinner,
    );
    if let Some(test_id) = &request.test_id {
        doc.set_attribute(confirm.button, "data-testid", &format!("{}-confirm", test_id));
    }
    nodes.confirm = Some(confirm);

    nodes.status = Some(append(
        doc,
        dialog,
        "span",
        &[("role", "status"), ("data-affirm-sr-only", ""), ("hidden", "")],
    ));

    nodes
}

fn sync_busy_button<D: Document + ?Sized>(doc: &mut D, button: &BusyButton, busy: bool, disabled: bool) {
    toggle(doc, button.button, "disabled", disabled, "");
    if let Some(spinner) = button.spinner {
        toggle(doc, spinner, "hidden", !busy, "");
    }
    doc.set_style(button.label, "visibility", busy.then_some("hidden"));
}

/// Mirror `status` onto the mounted markup
pub(crate) fn sync<D: Document + ?Sized>(doc: &mut D, nodes: &DialogNodes, status: &Status<'_>) {
    let busy = status.busy();
    let state = status.state.as_str();

    doc.set_attribute(nodes.overlay, "data-state", state);
    doc.set_attribute(nodes.dialog, "data-state", state);
    toggle(doc, nodes.dialog, "aria-busy", busy, "true");

    if let Some(cancel) = nodes.cancel {
        toggle(doc, cancel, "disabled", busy && !status.cancelable_while_loading, "");
    }

    for (index, action) in nodes.actions.iter().enumerate() {
        sync_busy_button(doc, action, status.loading_action == Some(index), busy);
    }

    if let Some(confirm) = &nodes.confirm {
        sync_busy_button(doc, confirm, status.loading, busy || !status.keyword_matches);
    }

    if let Some(input) = nodes.keyword_input {
        doc.set_attribute(input, "value", status.keyword_input);
        toggle(doc, input, "aria-invalid", !status.keyword_matches, "true");
    }

    if let Some(element) = nodes.status {
        toggle(doc, element, "hidden", !busy, "");
        doc.set_text(element, if busy { status.loading_label } else { "" });
    }
}
