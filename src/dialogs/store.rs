//! Request store for confirmation dialogs
//!
//! The store is the single source of truth for what the user is being asked:
//! - At most one active interaction at any instant
//! - A FIFO queue of requests waiting for their turn
//! - The resolver of every request, invoked exactly once
//! - A subscribe/notify channel presenters use to follow state changes
//!
//! Store operations are synchronous and never fail. Misuse (resolving or
//! dismissing while idle) is a silent no-op.

use super::types::{ConfirmRequest, CustomRender, Variant};
use crate::dialogs::events::CloseHandle;
use crate::dom::Markup;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::{debug, trace};

/// Snapshot of the interaction currently presented to the user
#[derive(Debug, Clone, Default)]
pub struct InteractionState {
    /// Whether a request is active
    pub is_open: bool,

    /// The active request, if any
    pub request: Option<ConfirmRequest>,

    /// Sequence number of the activation, increments on every activation
    pub activation: u64,

    /// Dismiss requests issued so far. Never decreases.
    pub dismiss_signal: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Active,
    /// Between two queued requests: reported as closed, but new requests
    /// still line up behind the queue.
    Advancing,
}

struct Pending {
    request: ConfirmRequest,
    resolver: oneshot::Sender<bool>,
}

struct StoreState {
    phase: Phase,
    active: Option<Pending>,
    queue: VecDeque<Pending>,
    snapshot: Arc<InteractionState>,
    activations: u64,
    dismiss_signal: u64,
}

impl StoreState {
    fn new() -> Self {
        Self {
            phase: Phase::Idle,
            active: None,
            queue: VecDeque::new(),
            snapshot: Arc::new(InteractionState::default()),
            activations: 0,
            dismiss_signal: 0,
        }
    }

    fn activate(&mut self, pending: Pending) {
        self.activations += 1;
        self.phase = Phase::Active;
        self.snapshot = Arc::new(InteractionState {
            is_open: true,
            request: Some(pending.request.clone()),
            activation: self.activations,
            dismiss_signal: self.dismiss_signal,
        });
        self.active = Some(pending);
    }

    fn closed_snapshot(&self) -> Arc<InteractionState> {
        Arc::new(InteractionState {
            is_open: false,
            request: None,
            activation: self.activations,
            dismiss_signal: self.dismiss_signal,
        })
    }
}

type Listener = Arc<dyn Fn() + Send + Sync>;

struct Shared {
    state: Mutex<StoreState>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_listener: AtomicU64,
}

/// Handle to a confirmation request store.
///
/// Cloning is cheap and every clone talks to the same store. Use
/// [`crate::global`] for the process-wide instance, or [`ConfirmStore::new`]
/// for an isolated one.
#[derive(Clone)]
pub struct ConfirmStore {
    shared: Arc<Shared>,
}

impl ConfirmStore {
    /// Create a new, idle store
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(StoreState::new()),
                listeners: Mutex::new(Vec::new()),
                next_listener: AtomicU64::new(1),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask the user something. Resolves to the user's decision.
    ///
    /// If nothing is active the request becomes active and subscribers are
    /// notified before this returns. Otherwise it waits in the queue.
    pub fn request(&self, request: impl Into<ConfirmRequest>) -> Confirmation {
        let request = request.into();
        let (resolver, receiver) = oneshot::channel();
        let pending = Pending { request, resolver };

        let activated = {
            let mut state = self.state();
            match state.phase {
                Phase::Idle => {
                    debug!(title = %pending.request.title, "Activating confirmation request");
                    state.activate(pending);
                    true
                }
                Phase::Active | Phase::Advancing => {
                    debug!(
                        title = %pending.request.title,
                        queued = state.queue.len() + 1,
                        "Queueing confirmation request"
                    );
                    state.queue.push_back(pending);
                    false
                }
            }
        };

        if activated {
            self.notify();
        }

        Confirmation { receiver }
    }

    /// Shorthand for a `danger` request
    pub fn danger(&self, request: impl Into<ConfirmRequest>) -> Confirmation {
        self.request(request.into().variant(Variant::Danger))
    }

    /// Shorthand for a `warning` request
    pub fn warning(&self, request: impl Into<ConfirmRequest>) -> Confirmation {
        self.request(request.into().variant(Variant::Warning))
    }

    /// Shorthand for an `info` request
    pub fn info(&self, request: impl Into<ConfirmRequest>) -> Confirmation {
        self.request(request.into().variant(Variant::Info))
    }

    /// Shorthand for a `success` request
    pub fn success(&self, request: impl Into<ConfirmRequest>) -> Confirmation {
        self.request(request.into().variant(Variant::Success))
    }

    /// Single-button acknowledgement. There is no cancel action, so the only
    /// outcome is `true`.
    pub fn alert(&self, request: impl Into<ConfirmRequest>) -> Confirmation {
        self.request(request.into().hide_cancel(true))
    }

    /// Show a fully custom body. The render callback receives a handle that
    /// closes the dialog with an outcome.
    pub fn custom<F>(&self, render: F) -> Confirmation
    where
        F: Fn(CloseHandle) -> Markup + Send + Sync + 'static,
    {
        let render: CustomRender = Arc::new(render);
        let request = ConfirmRequest {
            custom: Some(render),
            ..ConfirmRequest::new("")
        };
        self.request(request)
    }

    /// Settle the active request with `outcome`.
    ///
    /// No-op when nothing is active, so duplicate calls only count once.
    /// When requests are queued the store first reports a closed state and
    /// activates the head of the queue on the next scheduler turn.
    pub fn resolve(&self, outcome: bool) {
        self.settle(None, outcome);
    }

    /// Settle the active request only if it is still activation
    /// `activation` (see [`InteractionState::activation`]).
    ///
    /// Presenters use this so a late answer for a request that was already
    /// settled elsewhere never lands on the next queued one.
    pub fn resolve_activation(&self, activation: u64, outcome: bool) {
        self.settle(Some(activation), outcome);
    }

    fn settle(&self, activation: Option<u64>, outcome: bool) {
        let advance = {
            let mut state = self.state();
            if state.phase != Phase::Active {
                trace!("Ignoring resolve while no confirmation is active");
                return;
            }
            if activation.is_some_and(|activation| activation != state.activations) {
                trace!(?activation, current = state.activations, "Ignoring resolve for a stale activation");
                return;
            }

            let finished = state.active.take();
            state.phase = if state.queue.is_empty() {
                Phase::Idle
            } else {
                Phase::Advancing
            };
            state.snapshot = state.closed_snapshot();

            if let Some(finished) = finished {
                debug!(title = %finished.request.title, outcome, "Resolving confirmation request");
                // The caller may have dropped the future; nothing to do then.
                let _ = finished.resolver.send(outcome);
            }

            state.phase == Phase::Advancing
        };

        self.notify();

        if advance {
            self.schedule_advance();
        }
    }

    fn schedule_advance(&self) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let store = self.clone();
                handle.spawn(async move {
                    store.advance();
                });
            }
            Err(_) => {
                // Without a runtime the closed state has already been
                // published, so advancing inline keeps the ordering.
                self.advance();
            }
        }
    }

    fn advance(&self) {
        {
            let mut state = self.state();
            if state.phase != Phase::Advancing {
                return;
            }
            match state.queue.pop_front() {
                Some(next) => {
                    debug!(
                        title = %next.request.title,
                        remaining = state.queue.len(),
                        "Activating queued confirmation request"
                    );
                    state.activate(next);
                }
                None => {
                    state.phase = Phase::Idle;
                }
            }
        }

        self.notify();
    }

    /// Ask the presenter to run its dismiss routine for the active request.
    ///
    /// Does not resolve anything by itself: the presenter cancels through
    /// the normal close path so callbacks and animations still run.
    pub fn request_dismiss(&self) {
        {
            let mut state = self.state();
            if state.phase != Phase::Active {
                return;
            }
            state.dismiss_signal += 1;
            let mut next = (*state.snapshot).clone();
            next.dismiss_signal = state.dismiss_signal;
            state.snapshot = Arc::new(next);
            debug!(signal = state.dismiss_signal, "Dismiss requested");
        }

        self.notify();
    }

    /// Whether an interaction is currently active
    pub fn is_active(&self) -> bool {
        self.state().phase == Phase::Active
    }

    /// Number of requests waiting behind the active one
    pub fn pending_len(&self) -> usize {
        self.state().queue.len()
    }

    /// Whether another request will become active without a new call
    pub fn has_pending_work(&self) -> bool {
        let state = self.state();
        state.phase == Phase::Advancing || !state.queue.is_empty()
    }

    /// Resolve every queued request with `false` and empty the queue.
    /// The active request is left untouched.
    pub fn clear_pending_queue(&self) {
        let drained: Vec<Pending> = {
            let mut state = self.state();
            state.queue.drain(..).collect()
        };

        if !drained.is_empty() {
            debug!(count = drained.len(), "Clearing queued confirmation requests");
        }

        for pending in drained {
            let _ = pending.resolver.send(false);
        }
    }

    /// Current state. The same `Arc` is returned until the state changes.
    pub fn snapshot(&self) -> Arc<InteractionState> {
        self.state().snapshot.clone()
    }

    /// Register a change listener. Dropping the returned guard unsubscribes.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.shared.next_listener.fetch_add(1, Ordering::Relaxed);
        self.shared
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));

        Subscription {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    fn notify(&self) {
        // Listeners run outside every lock so they may call back into the store.
        let listeners: Vec<Listener> = self
            .shared
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        trace!(listeners = listeners.len(), "Notifying store subscribers");
        for listener in listeners {
            listener();
        }
    }
}

impl Default for ConfirmStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration returned by [`ConfirmStore::subscribe`]
pub struct Subscription {
    id: u64,
    shared: Weak<Shared>,
}

impl Subscription {
    /// Remove the listener now
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(id, _)| *id != self.id);
        }
    }
}

/// The eventual answer to a confirmation request.
///
/// Resolves to `false` if the store goes away without answering.
#[must_use = "a confirmation does nothing unless awaited"]
pub struct Confirmation {
    receiver: oneshot::Receiver<bool>,
}

impl Confirmation {
    /// Outcome if already settled, without waiting
    pub fn try_outcome(&mut self) -> Option<bool> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(false),
        }
    }
}

impl Future for Confirmation {
    type Output = bool;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<bool> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_listener(store: &ConfirmStore) -> (Arc<AtomicUsize>, Subscription) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let subscription = store.subscribe(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (count, subscription)
    }

    fn active_title(store: &ConfirmStore) -> Option<String> {
        store.snapshot().request.as_ref().map(|r| r.title.clone())
    }

    #[test]
    fn test_initial_state_is_closed() {
        let store = ConfirmStore::new();
        let snapshot = store.snapshot();

        assert!(!snapshot.is_open);
        assert!(snapshot.request.is_none());
        assert!(!store.is_active());
    }

    #[test]
    fn test_request_activates_and_notifies_synchronously() {
        let store = ConfirmStore::new();
        let (count, _sub) = counting_listener(&store);

        let _pending = store.request("Delete this?");

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(store.is_active());
        assert_eq!(active_title(&store).as_deref(), Some("Delete this?"));
    }

    #[tokio::test]
    async fn test_resolve_settles_with_outcome() {
        let store = ConfirmStore::new();

        let first = store.request("Delete?");
        store.resolve(true);
        assert!(first.await);

        let second = store.request("Delete?");
        store.resolve(false);
        assert!(!second.await);
    }

    #[test]
    fn test_resolve_when_idle_is_noop() {
        let store = ConfirmStore::new();
        let (count, _sub) = counting_listener(&store);
        let before = store.snapshot();

        store.resolve(true);

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn test_second_resolve_is_ignored() {
        let store = ConfirmStore::new();
        let mut confirmation = store.request("Pay now?");

        store.resolve(true);
        store.resolve(false);

        assert_eq!(confirmation.try_outcome(), Some(true));
    }

    #[test]
    fn test_snapshot_reference_is_stable_between_changes() {
        let store = ConfirmStore::new();
        let _pending = store.request("Stable?");

        let a = store.snapshot();
        let b = store.snapshot();
        assert!(Arc::ptr_eq(&a, &b));

        store.resolve(false);
        assert!(!Arc::ptr_eq(&a, &store.snapshot()));
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let store = ConfirmStore::new();
        let (count, sub) = counting_listener(&store);
        sub.unsubscribe();

        let _pending = store.request("Delete?");

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_queue_advances_inline_without_runtime() {
        let store = ConfirmStore::new();
        let _first = store.request("First");
        let _second = store.request("Second");

        assert_eq!(store.pending_len(), 1);
        store.resolve(true);

        assert_eq!(active_title(&store).as_deref(), Some("Second"));
        assert_eq!(store.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_queue_advance_is_deferred() {
        let store = ConfirmStore::new();
        let _first = store.request("First");
        let _second = store.request("Second");

        store.resolve(true);

        // The closed state is observable before the next activation.
        assert!(!store.is_active());
        assert!(store.has_pending_work());

        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert_eq!(active_title(&store).as_deref(), Some("Second"));
    }

    #[tokio::test]
    async fn test_request_during_advance_waits_behind_queue() {
        let store = ConfirmStore::new();
        let _first = store.request("First");
        let _second = store.request("Second");

        store.resolve(true);
        let _third = store.request("Third");

        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert_eq!(active_title(&store).as_deref(), Some("Second"));
        assert_eq!(store.pending_len(), 1);
    }

    #[test]
    fn test_dismiss_bumps_signal_without_resolving() {
        let store = ConfirmStore::new();
        let (count, _sub) = counting_listener(&store);
        let mut confirmation = store.request("Delete?");

        store.request_dismiss();

        let snapshot = store.snapshot();
        assert!(snapshot.is_open);
        assert_eq!(snapshot.dismiss_signal, 1);
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(confirmation.try_outcome(), None);
    }

    #[test]
    fn test_dismiss_when_idle_is_noop() {
        let store = ConfirmStore::new();
        let (count, _sub) = counting_listener(&store);

        store.request_dismiss();

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(store.snapshot().dismiss_signal, 0);
    }

    #[test]
    fn test_dismiss_signal_survives_activations() {
        let store = ConfirmStore::new();
        let _first = store.request("First");
        store.request_dismiss();
        store.resolve(false);

        let _second = store.request("Second");
        store.request_dismiss();

        assert_eq!(store.snapshot().dismiss_signal, 2);
    }

    #[test]
    fn test_clear_queue_keeps_active_request() {
        let store = ConfirmStore::new();
        let mut active = store.request("Active");
        let mut queued_a = store.request("Queued A");
        let mut queued_b = store.request("Queued B");

        store.clear_pending_queue();

        assert_eq!(queued_a.try_outcome(), Some(false));
        assert_eq!(queued_b.try_outcome(), Some(false));
        assert_eq!(active.try_outcome(), None);
        assert_eq!(store.pending_len(), 0);
        assert_eq!(active_title(&store).as_deref(), Some("Active"));
    }

    #[test]
    fn test_shorthands_shape_requests() {
        let store = ConfirmStore::new();

        let _danger = store.danger("Danger?");
        let snapshot = store.snapshot();
        let request = snapshot.request.as_ref().unwrap();
        assert_eq!(request.variant, Some(Variant::Danger));
        store.resolve(false);

        let _alert = store.alert("Notice");
        let snapshot = store.snapshot();
        let request = snapshot.request.as_ref().unwrap();
        assert!(request.hide_cancel);
        assert_eq!(request.title, "Notice");
        store.resolve(true);

        let _custom = store.custom(|_close| Markup::element("p").text("Custom body"));
        let snapshot = store.snapshot();
        let request = snapshot.request.as_ref().unwrap();
        assert!(request.custom.is_some());
        assert_eq!(request.title, "");
        store.resolve(true);
    }

    #[tokio::test]
    async fn test_resolve_activation_ignores_stale_activation() {
        let store = ConfirmStore::new();
        let mut first = store.request("First");
        let mut second = store.request("Second");
        let first_activation = store.snapshot().activation;

        store.resolve(true);
        tokio::task::yield_now().await;
        assert_eq!(
            store.snapshot().request.as_ref().map(|r| r.title.as_str()),
            Some("Second")
        );

        store.resolve_activation(first_activation, false);
        assert_eq!(first.try_outcome(), Some(true));
        assert_eq!(second.try_outcome(), None);
        assert!(store.is_active());

        store.resolve_activation(store.snapshot().activation, false);
        assert_eq!(second.try_outcome(), Some(false));
    }

    #[tokio::test]
    async fn test_dropped_store_resolves_false() {
        let store = ConfirmStore::new();
        let _first = store.request("First");
        let queued = store.request("Queued");

        drop(store);

        assert!(!queued.await);
    }
}
