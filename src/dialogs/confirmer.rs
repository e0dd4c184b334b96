//! Confirmation presenter
//!
//! [`Confirmer`] follows a [`ConfirmStore`] and turns its active request into
//! an interactive dialog inside a [`Document`]:
//! - mounts markup and the focus trap when a request activates
//! - runs `on_confirm` and extra actions with loading state
//! - routes escape, overlay, dismiss and button input to cancel or confirm
//! - waits for the close transition (or a fallback timer) before resolving
//!
//! The presenter is event driven. Hosts feed input through a
//! [`ConfirmerHandle`] or [`Confirmer::dispatch`] and drive it with
//! [`Confirmer::step`].

use super::events::{CloseHandle, ConfirmerEvent, ConfirmerHandle, PresenterEvent};
use super::markup::{self, DataState, DialogNodes, DialogView, Status};
use super::scroll_lock::ScrollLock;
use super::store::{ConfirmStore, Subscription};
use super::types::{CancelReason, ConfirmRequest, DialogError, DialogResult};
use crate::config::ConfirmerConfig;
use crate::dom::{Document, ElementId, CLOSE_ATTRIBUTE};
use crate::focus::{focus_step, FocusTrap};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, trace, warn};
use unicode_segmentation::UnicodeSegmentation;

/// Delay before a pending frame is produced when the host sends none
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

const NOTIFICATION_CAPACITY: usize = 16;

/// One dialog showing, from mount until unmount
struct MountedDialog {
    request: ConfirmRequest,
    view: DialogView,
    generation: u64,
    /// Store activation this showing presents
    activation: u64,
    state: DataState,
    loading: bool,
    loading_action: Option<usize>,
    keyword_input: String,
    /// Outcome of the close transition in progress
    closing: Option<bool>,
    trap: FocusTrap,
    nodes: DialogNodes,
}

impl MountedDialog {
    fn is_busy(&self) -> bool {
        self.loading || self.loading_action.is_some()
    }

    fn status(&self) -> Status<'_> {
        Status {
            state: self.state,
            loading: self.loading,
            loading_action: self.loading_action,
            keyword_input: &self.keyword_input,
            keyword_matches: self.request.keyword_matches(&self.keyword_input),
            cancelable_while_loading: self.request.is_cancelable_while_loading(),
            loading_label: &self.view.loading_label,
        }
    }
}

/// Presenter bridging a [`ConfirmStore`] to a [`Document`]
pub struct Confirmer<D: Document> {
    store: ConfirmStore,
    config: ConfirmerConfig,
    doc: D,
    tx: mpsc::UnboundedSender<PresenterEvent>,
    rx: mpsc::UnboundedReceiver<PresenterEvent>,
    notifications: broadcast::Sender<ConfirmerEvent>,
    _subscription: Subscription,
    seen_activation: u64,
    seen_dismiss: u64,
    generation: u64,
    dialog: Option<MountedDialog>,
    scroll_lock: Option<ScrollLock>,
    frame_pending: bool,
}

impl<D: Document> Confirmer<D> {
    /// Mount a presenter. A request already active in `store` is shown on
    /// the first [`Confirmer::step`].
    pub fn new(store: ConfirmStore, doc: D, config: ConfirmerConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);

        let listener_tx = tx.clone();
        let subscription = store.subscribe(move || {
            let _ = listener_tx.send(PresenterEvent::StoreChanged);
        });
        let _ = tx.send(PresenterEvent::StoreChanged);

        let seen_dismiss = store.snapshot().dismiss_signal;
        debug!("Confirmer mounted");

        Self {
            store,
            config,
            doc,
            tx,
            rx,
            notifications,
            _subscription: subscription,
            seen_activation: 0,
            seen_dismiss,
            generation: 0,
            dialog: None,
            scroll_lock: None,
            frame_pending: false,
        }
    }

    pub fn store(&self) -> &ConfirmStore {
        &self.store
    }

    pub fn config(&self) -> &ConfirmerConfig {
        &self.config
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    /// Sender for host input
    pub fn handle(&self) -> ConfirmerHandle {
        ConfirmerHandle::new(self.tx.clone())
    }

    /// Receive `affirm:confirm`, `affirm:cancel` and `affirm:close`
    pub fn subscribe_events(&self) -> broadcast::Receiver<ConfirmerEvent> {
        self.notifications.subscribe()
    }

    /// Whether a dialog is mounted
    pub fn is_mounted(&self) -> bool {
        self.dialog.is_some()
    }

    pub fn data_state(&self) -> Option<DataState> {
        self.dialog.as_ref().map(|dialog| dialog.state)
    }

    pub fn is_closing(&self) -> bool {
        self.dialog.as_ref().is_some_and(|dialog| dialog.closing.is_some())
    }

    pub fn is_loading(&self) -> bool {
        self.dialog.as_ref().is_some_and(MountedDialog::is_busy)
    }

    /// Current type-to-confirm input
    pub fn keyword_input(&self) -> Option<&str> {
        self.dialog.as_ref().map(|dialog| dialog.keyword_input.as_str())
    }

    /// First element of the mounted dialog carrying `attribute`
    pub fn find(&self, attribute: &str) -> Option<ElementId> {
        let dialog = self.dialog.as_ref()?;
        if self.doc.has_attribute(dialog.nodes.root, attribute) {
            return Some(dialog.nodes.root);
        }
        self.doc.find_by_attribute(dialog.nodes.root, attribute)
    }

    /// Wait for the next event and handle it
    pub async fn step(&mut self) {
        let event = if self.frame_pending {
            tokio::select! {
                event = self.rx.recv() => event,
                _ = tokio::time::sleep(FRAME_INTERVAL) => Some(PresenterEvent::Frame),
            }
        } else {
            self.rx.recv().await
        };

        if let Some(event) = event {
            self.dispatch(event);
        }
    }

    /// Handle every event already queued. Returns how many were handled.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.dispatch(event);
            handled += 1;
        }
        handled
    }

    /// Handle one event
    pub fn dispatch(&mut self, event: PresenterEvent) {
        trace!(?event, "Presenter event");
        match event {
            PresenterEvent::StoreChanged => self.on_store_changed(),
            PresenterEvent::Key(key) => self.on_key(key),
            PresenterEvent::Click(element) => self.on_click(element),
            PresenterEvent::OverlayClick => self.on_overlay(),
            PresenterEvent::Input(value) => self.on_input(value),
            PresenterEvent::Frame => self.on_frame(),
            PresenterEvent::AnimationEnd => {
                if let Some(generation) = self.dialog.as_ref().map(|dialog| dialog.generation) {
                    self.finish_close(generation);
                }
            }
            PresenterEvent::CloseFallback { generation } => {
                trace!(generation, "Close fallback fired");
                self.finish_close(generation);
            }
            PresenterEvent::ConfirmSettled {
                generation,
                proceed,
            } => self.on_confirm_settled(generation, proceed),
            PresenterEvent::ActionSettled {
                generation,
                index,
                ok,
            } => self.on_action_settled(generation, index, ok),
            PresenterEvent::Close { generation, value } => {
                if self.current_generation() == Some(generation) {
                    self.close(value);
                }
            }
        }
    }

    fn current_generation(&self) -> Option<u64> {
        self.dialog.as_ref().map(|dialog| dialog.generation)
    }

    fn on_store_changed(&mut self) {
        let snapshot = self.store.snapshot();

        if snapshot.is_open && snapshot.activation != self.seen_activation {
            self.seen_activation = snapshot.activation;
            if let Some(request) = snapshot.request.clone() {
                self.open(request, snapshot.activation);
            }
        }

        if snapshot.is_open && snapshot.dismiss_signal > self.seen_dismiss {
            self.seen_dismiss = snapshot.dismiss_signal;
            debug!(signal = snapshot.dismiss_signal, "Handling dismiss signal");
            self.cancel(CancelReason::Dismiss);
        }

        if !snapshot.is_open {
            if self.dialog.as_ref().is_some_and(|dialog| dialog.closing.is_none()) {
                // Resolved from outside: tear down without resolving again.
                debug!("Active request resolved externally, unmounting dialog");
                if let Some(dialog) = self.dialog.take() {
                    self.teardown(dialog);
                }
            }
            if self.dialog.is_none() && !self.store.has_pending_work() {
                self.release_scroll_lock();
            }
        }
    }

    fn open(&mut self, request: ConfirmRequest, activation: u64) {
        if let Some(previous) = self.dialog.take() {
            self.teardown(previous);
        }

        let request = request.with_defaults(&self.config.defaults);
        self.generation += 1;
        let generation = self.generation;
        debug!(generation, title = %request.title, "Opening dialog");

        if self.scroll_lock.is_none() {
            self.scroll_lock = Some(ScrollLock::engage(&mut self.doc));
        }

        let view = DialogView::resolve(&request, &self.config, &self.doc);
        let close = CloseHandle::new(self.tx.clone(), generation);
        let nodes = markup::mount_dialog(&mut self.doc, &request, &view, generation, close);

        let initial = if request.custom.is_some() {
            None
        } else if request.hide_cancel {
            nodes.confirm.as_ref().map(|confirm| confirm.button)
        } else {
            nodes.cancel
        };
        let mut trap = FocusTrap::new(nodes.dialog);
        trap.activate(&mut self.doc, initial);

        self.dialog = Some(MountedDialog {
            request,
            view,
            generation,
            activation,
            state: DataState::Initial,
            loading: false,
            loading_action: None,
            keyword_input: String::new(),
            closing: None,
            trap,
            nodes,
        });
        self.frame_pending = true;
        self.sync();
    }

    fn on_frame(&mut self) {
        if !std::mem::take(&mut self.frame_pending) {
            return;
        }
        if let Some(dialog) = self.dialog.as_mut() {
            if dialog.state == DataState::Initial {
                dialog.state = DataState::Open;
            }
            dialog.trap.on_frame(&mut self.doc);
        }
        self.sync();
    }

    fn sync(&mut self) {
        if let Some(dialog) = &self.dialog {
            markup::sync(&mut self.doc, &dialog.nodes, &dialog.status());
        }
    }

    fn confirm(&mut self) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        if dialog.is_busy() || dialog.closing.is_some() {
            return;
        }
        if !dialog.request.keyword_matches(&dialog.keyword_input) {
            trace!("Confirm ignored until the keyword matches");
            return;
        }

        let Some(handler) = dialog.request.on_confirm.clone() else {
            self.close(true);
            return;
        };

        dialog.loading = true;
        let generation = dialog.generation;
        let tx = self.tx.clone();
        self.sync();

        let future = start_guarded("on_confirm", || handler());
        spawn_task(async move {
            let proceed = match run_guarded("on_confirm", future).await {
                Ok(proceed) => {
                    if !proceed {
                        debug!("on_confirm vetoed closing");
                    }
                    proceed
                }
                Err(e) => {
                    warn!(error = %e, "Confirm handler failed, keeping dialog open");
                    false
                }
            };
            let _ = tx.send(PresenterEvent::ConfirmSettled {
                generation,
                proceed,
            });
        });
    }

    fn on_confirm_settled(&mut self, generation: u64, proceed: bool) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        if dialog.generation != generation || dialog.closing.is_some() {
            return;
        }
        dialog.loading = false;
        if proceed {
            self.close(true);
        } else {
            self.sync();
        }
    }

    fn run_action(&mut self, index: usize) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        if dialog.is_busy() || dialog.closing.is_some() {
            return;
        }
        let Some(action) = dialog.request.actions.get(index) else {
            return;
        };

        let handler = action.on_click.clone();
        debug!(index, label = %action.label, "Running dialog action");
        dialog.loading_action = Some(index);
        let generation = dialog.generation;
        let tx = self.tx.clone();
        self.sync();

        let future = start_guarded("action", || handler());
        spawn_task(async move {
            let ok = match run_guarded("action", future).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, index, "Dialog action failed, keeping dialog open");
                    false
                }
            };
            let _ = tx.send(PresenterEvent::ActionSettled {
                generation,
                index,
                ok,
            });
        });
    }

    fn on_action_settled(&mut self, generation: u64, index: usize, ok: bool) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        if dialog.generation != generation
            || dialog.closing.is_some()
            || dialog.loading_action != Some(index)
        {
            return;
        }
        dialog.loading_action = None;
        if ok {
            self.close(false);
        } else {
            self.sync();
        }
    }

    fn cancel(&mut self, reason: CancelReason) {
        let Some(dialog) = self.dialog.as_ref() else {
            return;
        };
        if dialog.closing.is_some() {
            return;
        }
        if dialog.request.hide_cancel {
            // No negative outcome exists, so every cancel path acknowledges.
            self.close(true);
            return;
        }
        if dialog.is_busy() && !dialog.request.is_cancelable_while_loading() {
            trace!(%reason, "Cancel ignored while loading");
            return;
        }

        debug!(%reason, "Cancelling dialog");
        if let Some(handler) = dialog.request.on_cancel.clone() {
            if let Err(e) = call_guarded("on_cancel", || handler(reason)) {
                warn!(error = %e, "Cancel handler failed");
            }
        }
        self.close(false);
    }

    fn close(&mut self, value: bool) {
        let fallback = self.config.close_fallback();
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        if dialog.closing.is_some() {
            return;
        }
        if dialog.is_busy() && !(dialog.request.is_cancelable_while_loading() && !value) {
            return;
        }

        debug!(generation = dialog.generation, value, "Closing dialog");
        dialog.closing = Some(value);
        dialog.state = DataState::Closed;
        dialog.trap.deactivate(&mut self.doc);
        let generation = dialog.generation;
        self.frame_pending = false;
        self.sync();

        let tx = self.tx.clone();
        spawn_timer(fallback, move || {
            let _ = tx.send(PresenterEvent::CloseFallback { generation });
        });
    }

    /// Unmount and settle once the close transition is over. Only the first
    /// of animation end and fallback timer gets here for a given showing.
    fn finish_close(&mut self, generation: u64) {
        let value = match &self.dialog {
            Some(dialog) if dialog.generation == generation => match dialog.closing {
                Some(value) => value,
                None => return,
            },
            _ => return,
        };
        let Some(dialog) = self.dialog.take() else {
            return;
        };

        let activation = dialog.activation;
        let on_dismiss = dialog.request.on_dismiss.clone();
        self.teardown(dialog);

        if let Some(handler) = on_dismiss {
            if let Err(e) = call_guarded("on_dismiss", || handler()) {
                warn!(error = %e, "Dismiss handler failed");
            }
        }

        let outcome = if value {
            ConfirmerEvent::Confirm
        } else {
            ConfirmerEvent::Cancel
        };
        let _ = self.notifications.send(outcome);
        let _ = self
            .notifications
            .send(ConfirmerEvent::Close { confirmed: value });

        debug!(generation, value, "Dialog closed");
        self.store.resolve_activation(activation, value);
    }

    fn teardown(&mut self, mut dialog: MountedDialog) {
        dialog.trap.deactivate(&mut self.doc);
        self.doc.remove(dialog.nodes.root);
        self.frame_pending = false;
    }

    fn release_scroll_lock(&mut self) {
        if let Some(lock) = self.scroll_lock.take() {
            lock.release(&mut self.doc);
        }
    }

    fn on_overlay(&mut self) {
        let dismissible = self
            .dialog
            .as_ref()
            .is_some_and(|dialog| dialog.request.is_dismissible());
        if dismissible {
            self.cancel(CancelReason::Overlay);
        }
    }

    fn on_input(&mut self, value: String) {
        if let Some(dialog) = self.dialog.as_mut() {
            if dialog.closing.is_none() && dialog.request.confirmation_keyword.is_some() {
                dialog.keyword_input = value;
                self.sync();
            }
        }
    }

    fn on_click(&mut self, element: ElementId) {
        let Some(dialog) = self.dialog.as_ref() else {
            return;
        };
        if dialog.closing.is_some() {
            return;
        }

        let nodes = &dialog.nodes;
        let mut current = Some(element);
        while let Some(node) = current {
            if node == nodes.overlay {
                self.on_overlay();
                return;
            }
            if self.doc.has_attribute(node, "disabled") {
                return;
            }
            if Some(node) == nodes.cancel {
                self.cancel(CancelReason::Button);
                return;
            }
            if nodes.confirm.as_ref().is_some_and(|confirm| confirm.button == node) {
                self.confirm();
                return;
            }
            if let Some(index) = nodes.actions.iter().position(|action| action.button == node) {
                self.run_action(index);
                return;
            }
            if let Some(value) = self.doc.attribute(node, CLOSE_ATTRIBUTE) {
                let value = value == "true";
                self.close(value);
                return;
            }
            if node == nodes.root {
                return;
            }
            current = self.doc.parent(node);
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        let Some(dialog) = self.dialog.as_ref() else {
            return;
        };
        if dialog.closing.is_some() {
            return;
        }

        let container = dialog.nodes.dialog;
        let focused = self.doc.active_element();
        let in_input = focused.is_some() && focused == dialog.nodes.keyword_input;

        match key.code {
            KeyCode::Esc => {
                if dialog.request.is_dismissible() {
                    self.cancel(CancelReason::Escape);
                }
            }
            KeyCode::Tab | KeyCode::BackTab => {
                let backward =
                    key.code == KeyCode::BackTab || key.modifiers.contains(KeyModifiers::SHIFT);
                if !dialog.trap.handle_key(&mut self.doc, &key) {
                    focus_step(&mut self.doc, container, !backward);
                }
            }
            KeyCode::Left if !in_input => {
                focus_step(&mut self.doc, container, false);
            }
            KeyCode::Right if !in_input => {
                focus_step(&mut self.doc, container, true);
            }
            KeyCode::Enter if in_input => self.confirm(),
            KeyCode::Enter | KeyCode::Char(' ') if !in_input => {
                if let Some(element) = focused {
                    if self.doc.tag(element) == Some("button") {
                        self.on_click(element);
                    }
                }
            }
            KeyCode::Char(c) if in_input => {
                if !key.modifiers.contains(KeyModifiers::CONTROL) {
                    let mut value = dialog.keyword_input.clone();
                    value.push(c);
                    self.on_input(value);
                }
            }
            KeyCode::Backspace if in_input => {
                let value = &dialog.keyword_input;
                let keep = value
                    .grapheme_indices(true)
                    .last()
                    .map(|(index, _)| index)
                    .unwrap_or(0);
                let value = value[..keep].to_string();
                self.on_input(value);
            }
            _ => {}
        }
    }
}

impl<D: Document> Drop for Confirmer<D> {
    fn drop(&mut self) {
        if let Some(dialog) = self.dialog.take() {
            self.teardown(dialog);
        }
        self.release_scroll_lock();

        // Nobody is left to answer the active request.
        if self.store.is_active() {
            debug!("Confirmer dropped with an active request, resolving false");
            self.store.resolve(false);
        }
    }
}

/// Call a synchronous user callback, turning errors and panics into
/// [`DialogError`]
fn call_guarded<F>(name: &'static str, callback: F) -> DialogResult<()>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    match catch_unwind(AssertUnwindSafe(callback)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(DialogError::CallbackFailed { name, source }),
        Err(_) => Err(DialogError::CallbackPanicked(name)),
    }
}

/// Create a user future, catching a panic in the constructor itself
fn start_guarded<T, F>(name: &'static str, make: F) -> DialogResult<BoxFuture<'static, anyhow::Result<T>>>
where
    F: FnOnce() -> BoxFuture<'static, anyhow::Result<T>>,
{
    catch_unwind(AssertUnwindSafe(make)).map_err(|_| DialogError::CallbackPanicked(name))
}

async fn run_guarded<T>(
    name: &'static str,
    future: DialogResult<BoxFuture<'static, anyhow::Result<T>>>,
) -> DialogResult<T> {
    match AssertUnwindSafe(future?).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(DialogError::CallbackFailed { name, source }),
        Err(_) => Err(DialogError::CallbackPanicked(name)),
    }
}

fn spawn_task<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(future);
        }
        Err(_) => {
            std::thread::spawn(move || futures::executor::block_on(future));
        }
    }
}

fn spawn_timer<F>(delay: Duration, fire: F)
where
    F: FnOnce() + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                tokio::time::sleep(delay).await;
                fire();
            });
        }
        Err(_) => {
            std::thread::spawn(move || {
                std::thread::sleep(delay);
                fire();
            });
        }
    }
}
