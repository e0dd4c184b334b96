//! Promise-style confirmation dialogs
//!
//! A [`ConfirmStore`] queues requests and hands out [`Confirmation`]
//! futures; a [`Confirmer`] presents the active request and settles it.

mod confirmer;
mod events;
mod markup;
mod scroll_lock;
mod store;
mod types;

pub use confirmer::Confirmer;
pub use events::{CloseHandle, ConfirmerEvent, ConfirmerHandle, PresenterEvent};
pub use markup::{builtin_icon, DataState};
pub use store::{Confirmation, ConfirmStore, InteractionState, Subscription};
pub use types::*;
