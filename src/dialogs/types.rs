//! Core confirmation types
//!
//! This module defines the request model shared by the store and the
//! presenter: what a caller asks for, which lifecycle callbacks it wants,
//! and the error type used when user callbacks misbehave.

use crate::config::RequestDefaults;
use crate::dialogs::events::CloseHandle;
use crate::dom::Markup;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

/// Visual variant controlling color scheme and dialog role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Default,
    Danger,
    Warning,
    Info,
    Success,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Default => "default",
            Variant::Danger => "danger",
            Variant::Warning => "warning",
            Variant::Info => "info",
            Variant::Success => "success",
        }
    }

    /// ARIA role for a dialog of this variant.
    ///
    /// Destructive and cautionary variants interrupt assistive technology
    /// with `alertdialog`; everything else is a polite `dialog`.
    pub fn role(&self) -> &'static str {
        match self {
            Variant::Danger | Variant::Warning => "alertdialog",
            _ => "dialog",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = DialogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Variant::Default),
            "danger" => Ok(Variant::Danger),
            "warning" => Ok(Variant::Warning),
            "info" => Ok(Variant::Info),
            "success" => Ok(Variant::Success),
            other => Err(DialogError::InvalidConfig(format!("unknown variant '{}'", other))),
        }
    }
}

/// Dialog layout options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogLayout {
    #[default]
    Default,
    Centered,
}

impl DialogLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogLayout::Default => "default",
            DialogLayout::Centered => "centered",
        }
    }
}

impl FromStr for DialogLayout {
    type Err = DialogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(DialogLayout::Default),
            "centered" => Ok(DialogLayout::Centered),
            other => Err(DialogError::InvalidConfig(format!("unknown layout '{}'", other))),
        }
    }
}

/// Dialog size presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogSize {
    Sm,
    Md,
    Lg,
    Xl,
    Full,
}

impl DialogSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogSize::Sm => "sm",
            DialogSize::Md => "md",
            DialogSize::Lg => "lg",
            DialogSize::Xl => "xl",
            DialogSize::Full => "full",
        }
    }
}

impl FromStr for DialogSize {
    type Err = DialogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sm" => Ok(DialogSize::Sm),
            "md" => Ok(DialogSize::Md),
            "lg" => Ok(DialogSize::Lg),
            "xl" => Ok(DialogSize::Xl),
            "full" => Ok(DialogSize::Full),
            other => Err(DialogError::InvalidConfig(format!("unknown size '{}'", other))),
        }
    }
}

/// Text direction for RTL language support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Ltr,
    Rtl,
    Auto,
}

impl TextDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextDirection::Ltr => "ltr",
            TextDirection::Rtl => "rtl",
            TextDirection::Auto => "auto",
        }
    }
}

impl FromStr for TextDirection {
    type Err = DialogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ltr" => Ok(TextDirection::Ltr),
            "rtl" => Ok(TextDirection::Rtl),
            "auto" => Ok(TextDirection::Auto),
            other => Err(DialogError::InvalidConfig(format!("unknown text direction '{}'", other))),
        }
    }
}

/// Icon rendered next to the title
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Icon {
    /// Use the configured icon for the variant
    #[default]
    Default,
    /// Never show an icon
    Hidden,
    /// Show this glyph/text instead
    Custom(String),
}

/// Busy indicator shown on a loading button
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Spinner {
    #[default]
    Default,
    Hidden,
    Custom(String),
}

/// Why a dialog is being cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    /// The cancel button was activated
    Button,
    /// The escape key was pressed
    Escape,
    /// The overlay behind the dialog was activated
    Overlay,
    /// `dismiss()` was called programmatically
    Dismiss,
}

impl CancelReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelReason::Button => "button",
            CancelReason::Escape => "escape",
            CancelReason::Overlay => "overlay",
            CancelReason::Dismiss => "dismiss",
        }
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Future returned by an `on_confirm` handler. `Ok(false)` keeps the dialog open.
pub type ConfirmFuture = BoxFuture<'static, anyhow::Result<bool>>;
pub type ConfirmHandler = Arc<dyn Fn() -> ConfirmFuture + Send + Sync>;

/// Future returned by an extra action's click handler.
pub type ActionFuture = BoxFuture<'static, anyhow::Result<()>>;
pub type ActionHandler = Arc<dyn Fn() -> ActionFuture + Send + Sync>;

pub type CancelHandler = Arc<dyn Fn(CancelReason) -> anyhow::Result<()> + Send + Sync>;
pub type DismissHandler = Arc<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

/// Renders a fully custom dialog body. The handle closes the dialog.
pub type CustomRender = Arc<dyn Fn(CloseHandle) -> Markup + Send + Sync>;

/// Additional button rendered between cancel and confirm
#[derive(Clone)]
pub struct ConfirmAction {
    pub label: String,
    pub on_click: ActionHandler,
}

impl ConfirmAction {
    pub fn new<F, Fut>(label: impl Into<String>, on_click: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            label: label.into(),
            on_click: Arc::new(move || on_click().boxed()),
        }
    }
}

impl fmt::Debug for ConfirmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmAction")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// One confirmation ask.
///
/// Everything except the title is optional; unset fields fall back to the
/// presenter's mount-time defaults and then to built-in defaults. A request
/// is never mutated once it has been handed to the store.
#[derive(Clone, Default)]
pub struct ConfirmRequest {
    pub title: String,
    pub description: Option<String>,
    pub confirm_text: Option<String>,
    pub cancel_text: Option<String>,
    pub variant: Option<Variant>,
    pub icon: Icon,
    pub dismissible: Option<bool>,
    pub hide_cancel: bool,
    pub confirmation_keyword: Option<String>,
    pub layout: Option<DialogLayout>,
    pub size: Option<DialogSize>,
    pub actions: Vec<ConfirmAction>,
    pub cancelable_while_loading: Option<bool>,
    pub test_id: Option<String>,
    pub aria_label: Option<String>,
    pub dir: Option<TextDirection>,
    pub unstyled: bool,
    pub spinner: Option<Spinner>,
    pub custom: Option<CustomRender>,
    pub on_confirm: Option<ConfirmHandler>,
    pub on_cancel: Option<CancelHandler>,
    pub on_dismiss: Option<DismissHandler>,
}

impl ConfirmRequest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn confirm_text(mut self, text: impl Into<String>) -> Self {
        self.confirm_text = Some(text.into());
        self
    }

    pub fn cancel_text(mut self, text: impl Into<String>) -> Self {
        self.cancel_text = Some(text.into());
        self
    }

    pub fn variant(mut self, variant: Variant) -> Self {
        self.variant = Some(variant);
        self
    }

    pub fn icon(mut self, icon: Icon) -> Self {
        self.icon = icon;
        self
    }

    pub fn dismissible(mut self, dismissible: bool) -> Self {
        self.dismissible = Some(dismissible);
        self
    }

    pub fn hide_cancel(mut self, hide: bool) -> Self {
        self.hide_cancel = hide;
        self
    }

    pub fn confirmation_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.confirmation_keyword = Some(keyword.into());
        self
    }

    pub fn layout(mut self, layout: DialogLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn size(mut self, size: DialogSize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn action(mut self, action: ConfirmAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn cancelable_while_loading(mut self, cancelable: bool) -> Self {
        self.cancelable_while_loading = Some(cancelable);
        self
    }

    pub fn test_id(mut self, id: impl Into<String>) -> Self {
        self.test_id = Some(id.into());
        self
    }

    pub fn aria_label(mut self, label: impl Into<String>) -> Self {
        self.aria_label = Some(label.into());
        self
    }

    pub fn dir(mut self, dir: TextDirection) -> Self {
        self.dir = Some(dir);
        self
    }

    pub fn unstyled(mut self, unstyled: bool) -> Self {
        self.unstyled = unstyled;
        self
    }

    pub fn spinner(mut self, spinner: Spinner) -> Self {
        self.spinner = Some(spinner);
        self
    }

    pub fn custom<F>(mut self, render: F) -> Self
    where
        F: Fn(CloseHandle) -> Markup + Send + Sync + 'static,
    {
        self.custom = Some(Arc::new(render));
        self
    }

    /// Async action run when the user confirms. Resolve to `Ok(false)` to
    /// keep the dialog open.
    pub fn on_confirm<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
    {
        self.on_confirm = Some(Arc::new(move || handler().boxed()));
        self
    }

    pub fn on_cancel<F>(mut self, handler: F) -> Self
    where
        F: Fn(CancelReason) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_cancel = Some(Arc::new(handler));
        self
    }

    pub fn on_dismiss<F>(mut self, handler: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_dismiss = Some(Arc::new(handler));
        self
    }

    /// Effective variant
    pub fn variant_or_default(&self) -> Variant {
        self.variant.unwrap_or_default()
    }

    /// Whether escape and overlay activation may cancel
    pub fn is_dismissible(&self) -> bool {
        self.dismissible.unwrap_or(true)
    }

    pub fn is_cancelable_while_loading(&self) -> bool {
        self.cancelable_while_loading.unwrap_or(false)
    }

    pub fn layout_or_default(&self) -> DialogLayout {
        self.layout.unwrap_or_default()
    }

    /// Whether `input` satisfies the type-to-confirm keyword.
    ///
    /// Exact, case-sensitive, untrimmed comparison. Requests without a
    /// keyword always match.
    pub fn keyword_matches(&self, input: &str) -> bool {
        match &self.confirmation_keyword {
            Some(keyword) => input == keyword,
            None => true,
        }
    }

    /// Fill every unset field from mount-time defaults. Fields set on the
    /// request win.
    pub fn with_defaults(&self, defaults: &RequestDefaults) -> Self {
        let mut merged = self.clone();
        if merged.confirm_text.is_none() {
            merged.confirm_text = defaults.confirm_text.clone();
        }
        if merged.cancel_text.is_none() {
            merged.cancel_text = defaults.cancel_text.clone();
        }
        if merged.variant.is_none() {
            merged.variant = defaults.variant;
        }
        if merged.dismissible.is_none() {
            merged.dismissible = defaults.dismissible;
        }
        if merged.layout.is_none() {
            merged.layout = defaults.layout;
        }
        if merged.size.is_none() {
            merged.size = defaults.size;
        }
        if merged.cancelable_while_loading.is_none() {
            merged.cancelable_while_loading = defaults.cancelable_while_loading;
        }
        if merged.dir.is_none() {
            merged.dir = defaults.dir;
        }
        if merged.spinner.is_none() {
            merged.spinner = defaults.spinner.clone();
        }
        merged
    }
}

impl From<&str> for ConfirmRequest {
    fn from(title: &str) -> Self {
        Self::new(title)
    }
}

impl From<String> for ConfirmRequest {
    fn from(title: String) -> Self {
        Self::new(title)
    }
}

impl fmt::Debug for ConfirmRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmRequest")
            .field("title", &self.title)
            .field("description", &self.description)
            .field("variant", &self.variant)
            .field("hide_cancel", &self.hide_cancel)
            .field("confirmation_keyword", &self.confirmation_keyword)
            .field("actions", &self.actions)
            .field("custom", &self.custom.is_some())
            .field("on_confirm", &self.on_confirm.is_some())
            .finish_non_exhaustive()
    }
}

/// Result type for dialog operations
pub type DialogResult<T> = std::result::Result<T, DialogError>;

/// Dialog-specific error types
#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    #[error("Invalid dialog configuration: {0}")]
    InvalidConfig(String),

    #[error("Dialog callback '{name}' failed: {source}")]
    CallbackFailed {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("Dialog callback '{0}' panicked")]
    CallbackPanicked(&'static str),
}
