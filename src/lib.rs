//! affirm: awaitable confirmation dialogs
//!
//! Ask the user a yes/no question from anywhere and await the answer:
//!
//! ```no_run
//! # async fn demo() {
//! if affirm::danger("Delete this repository?").await {
//!     // proceed
//! }
//! # }
//! ```
//!
//! Requests go to a process-wide [`ConfirmStore`]. One [`Confirmer`] mounted
//! near the application root presents them one at a time.

pub mod config;
pub mod dialogs;
pub mod dom;
pub mod focus;
pub mod tui;

pub use config::ConfirmerConfig;
pub use dialogs::{
    CancelReason, Confirmation, ConfirmAction, ConfirmRequest, ConfirmStore, Confirmer,
    ConfirmerEvent, ConfirmerHandle, DialogError, DialogResult, PresenterEvent, Variant,
};
pub use dom::{Document, ElementId, ElementTree, Markup};

use dialogs::CloseHandle;
use std::sync::OnceLock;

static GLOBAL_STORE: OnceLock<ConfirmStore> = OnceLock::new();

/// The process-wide store used by the free functions in this crate
pub fn global() -> &'static ConfirmStore {
    GLOBAL_STORE.get_or_init(ConfirmStore::new)
}

/// Ask for confirmation with a title or a full request
pub fn request(request: impl Into<ConfirmRequest>) -> Confirmation {
    global().request(request)
}

pub fn danger(request: impl Into<ConfirmRequest>) -> Confirmation {
    global().danger(request)
}

pub fn warning(request: impl Into<ConfirmRequest>) -> Confirmation {
    global().warning(request)
}

pub fn info(request: impl Into<ConfirmRequest>) -> Confirmation {
    global().info(request)
}

pub fn success(request: impl Into<ConfirmRequest>) -> Confirmation {
    global().success(request)
}

/// Acknowledgement without a cancel action
pub fn alert(request: impl Into<ConfirmRequest>) -> Confirmation {
    global().alert(request)
}

/// Fully custom dialog body
pub fn custom<F>(render: F) -> Confirmation
where
    F: Fn(CloseHandle) -> Markup + Send + Sync + 'static,
{
    global().custom(render)
}

/// Whether a dialog is currently active
pub fn is_open() -> bool {
    global().is_active()
}

/// Cancel the active dialog through its normal close path
pub fn dismiss() {
    global().request_dismiss()
}

/// Resolve every queued (not yet shown) request with `false`
pub fn clear_queue() {
    global().clear_pending_queue()
}
