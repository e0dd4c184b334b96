//! Presenter input events and outgoing notifications

use crate::dom::ElementId;
use crossterm::event::KeyEvent;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::trace;

/// Everything that can drive the presenter forward
#[derive(Debug, Clone)]
pub enum PresenterEvent {
    /// The store published a new snapshot
    StoreChanged,

    /// Keyboard input
    Key(KeyEvent),

    /// An element was clicked or otherwise activated
    Click(ElementId),

    /// The backdrop behind the dialog was clicked
    OverlayClick,

    /// Replace the type-to-confirm input value
    Input(String),

    /// The host finished playing the close transition
    AnimationEnd,

    /// The host painted a frame
    Frame,

    /// An `on_confirm` handler settled
    ConfirmSettled { generation: u64, proceed: bool },

    /// An extra action's handler settled
    ActionSettled {
        generation: u64,
        index: usize,
        ok: bool,
    },

    /// The close transition did not report completion in time
    CloseFallback { generation: u64 },

    /// A custom body asked to close
    Close { generation: u64, value: bool },
}

/// Notification broadcast to outside observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmerEvent {
    /// The dialog closed with a positive outcome
    Confirm,
    /// The dialog closed with a negative outcome
    Cancel,
    /// The dialog closed, whatever the outcome
    Close { confirmed: bool },
}

impl ConfirmerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ConfirmerEvent::Confirm => "affirm:confirm",
            ConfirmerEvent::Cancel => "affirm:cancel",
            ConfirmerEvent::Close { .. } => "affirm:close",
        }
    }

    pub fn confirmed(&self) -> bool {
        match self {
            ConfirmerEvent::Confirm => true,
            ConfirmerEvent::Cancel => false,
            ConfirmerEvent::Close { confirmed } => *confirmed,
        }
    }

    /// Event detail as JSON, `{ "confirmed": bool }`
    pub fn detail(&self) -> serde_json::Value {
        json!({ "confirmed": self.confirmed() })
    }
}

/// Cloneable sender hosts use to feed input into a presenter
#[derive(Debug, Clone)]
pub struct ConfirmerHandle {
    tx: mpsc::UnboundedSender<PresenterEvent>,
}

impl ConfirmerHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<PresenterEvent>) -> Self {
        Self { tx }
    }

    /// Queue an event. Returns `false` once the presenter is gone.
    pub fn send(&self, event: PresenterEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Handed to custom render callbacks so their markup can close the dialog
#[derive(Debug, Clone)]
pub struct CloseHandle {
    tx: mpsc::UnboundedSender<PresenterEvent>,
    generation: u64,
}

impl CloseHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<PresenterEvent>, generation: u64) -> Self {
        Self { tx, generation }
    }

    /// Close the dialog this handle was rendered for. Ignored once that
    /// dialog is gone.
    pub fn close(&self, value: bool) {
        trace!(generation = self.generation, value, "Custom dialog close requested");
        let _ = self.tx.send(PresenterEvent::Close {
            generation: self.generation,
            value,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(ConfirmerEvent::Confirm.name(), "affirm:confirm");
        assert_eq!(ConfirmerEvent::Cancel.name(), "affirm:cancel");
        assert_eq!(
            ConfirmerEvent::Close { confirmed: false }.name(),
            "affirm:close"
        );
        assert_eq!(
            ConfirmerEvent::Close { confirmed: true }.detail(),
            json!({ "confirmed": true })
        );
    }

    #[test]
    fn test_close_handle_sends_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = CloseHandle::new(tx, 7);

        handle.close(true);

        match rx.try_recv() {
            Ok(PresenterEvent::Close { generation, value }) => {
                assert_eq!(generation, 7);
                assert!(value);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
