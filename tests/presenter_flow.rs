//! Integration tests for the presenter lifecycle
//!
//! These tests cover the user-facing guarantees end to end:
//! - Alert dialogs can only answer `true`
//! - Type-to-confirm gating is exact
//! - Vetoed or failing confirm handlers keep the dialog open
//! - Programmatic dismiss goes through the normal cancel path
//! - Tearing the presenter down never leaves a caller waiting

use affirm::dialogs::DataState;
use affirm::{
    CancelReason, ConfirmRequest, ConfirmStore, Confirmer, ConfirmerConfig, ConfirmerEvent,
    Document, ElementTree, PresenterEvent,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::{Arc, Mutex};

fn setup() -> (ConfirmStore, Confirmer<ElementTree>) {
    let store = ConfirmStore::new();
    let confirmer = Confirmer::new(store.clone(), ElementTree::new(), ConfirmerConfig::default());
    (store, confirmer)
}

fn open(confirmer: &mut Confirmer<ElementTree>) {
    confirmer.process_pending();
    confirmer.dispatch(PresenterEvent::Frame);
    assert_eq!(confirmer.data_state(), Some(DataState::Open));
}

fn press(confirmer: &mut Confirmer<ElementTree>, code: KeyCode) {
    confirmer.dispatch(PresenterEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
}

fn confirm_disabled(confirmer: &Confirmer<ElementTree>) -> bool {
    let confirm = confirmer.find("data-affirm-confirm").unwrap();
    confirmer.document().has_attribute(confirm, "disabled")
}

// =============================================================================
// Alert mode
// =============================================================================

#[tokio::test]
async fn test_alert_has_no_cancel_and_escape_answers_true() {
    let (store, mut confirmer) = setup();
    let answer = store.alert("Notice");
    open(&mut confirmer);

    assert!(confirmer.find("data-affirm-cancel").is_none());
    let confirm = confirmer.find("data-affirm-confirm").unwrap();
    assert_eq!(confirmer.document().active_element(), Some(confirm));

    press(&mut confirmer, KeyCode::Esc);
    confirmer.dispatch(PresenterEvent::AnimationEnd);

    assert!(answer.await);
}

#[tokio::test]
async fn test_alert_dismiss_answers_true() {
    let (store, mut confirmer) = setup();
    let answer = store.alert("Notice");
    open(&mut confirmer);

    store.request_dismiss();
    confirmer.process_pending();
    confirmer.dispatch(PresenterEvent::AnimationEnd);

    assert!(answer.await);
}

// =============================================================================
// Type-to-confirm
// =============================================================================

#[tokio::test]
async fn test_keyword_must_match_exactly() {
    let (store, mut confirmer) = setup();
    let _answer = store.danger(ConfirmRequest::new("Drop table?").confirmation_keyword("DELETE"));
    open(&mut confirmer);

    for attempt in ["", "delete", "DELETE ", "DELET"] {
        confirmer.dispatch(PresenterEvent::Input(attempt.to_string()));
        assert!(confirm_disabled(&confirmer), "input {:?} should not enable confirm", attempt);
    }

    confirmer.dispatch(PresenterEvent::Input("DELETE".to_string()));
    assert!(!confirm_disabled(&confirmer));
    assert_eq!(confirmer.keyword_input(), Some("DELETE"));
}

#[tokio::test]
async fn test_disabled_confirm_ignores_clicks() {
    let (store, mut confirmer) = setup();
    let mut answer = store.request(ConfirmRequest::new("Drop?").confirmation_keyword("yes"));
    open(&mut confirmer);

    let confirm = confirmer.find("data-affirm-confirm").unwrap();
    confirmer.dispatch(PresenterEvent::Click(confirm));

    assert!(!confirmer.is_closing());
    assert_eq!(answer.try_outcome(), None);
}

// =============================================================================
// Confirm handlers
// =============================================================================

#[tokio::test]
async fn test_vetoed_confirm_leaves_request_active() {
    let (store, mut confirmer) = setup();
    let mut answer = store.request(ConfirmRequest::new("Save?").on_confirm(|| async { Ok(false) }));
    open(&mut confirmer);

    let confirm = confirmer.find("data-affirm-confirm").unwrap();
    confirmer.dispatch(PresenterEvent::Click(confirm));
    assert!(confirmer.is_loading());
    confirmer.step().await;

    assert!(store.is_active());
    assert!(!confirmer.is_loading());
    assert!(!confirm_disabled(&confirmer));
    assert_eq!(answer.try_outcome(), None);
}

#[tokio::test]
async fn test_failing_confirm_matches_veto() {
    let (store, mut confirmer) = setup();
    let mut answer = store.request(
        ConfirmRequest::new("Save?").on_confirm(|| async { Err(anyhow::anyhow!("offline")) }),
    );
    open(&mut confirmer);

    let confirm = confirmer.find("data-affirm-confirm").unwrap();
    confirmer.dispatch(PresenterEvent::Click(confirm));
    confirmer.step().await;

    assert!(store.is_active());
    assert!(!confirmer.is_loading());
    assert_eq!(answer.try_outcome(), None);

    // The user can still back out
    press(&mut confirmer, KeyCode::Esc);
    confirmer.dispatch(PresenterEvent::AnimationEnd);
    assert!(!answer.await);
}

#[tokio::test]
async fn test_successful_confirm_resolves_true_after_close() {
    let (store, mut confirmer) = setup();
    let mut events = confirmer.subscribe_events();
    let mut answer = store.request(ConfirmRequest::new("Save?").on_confirm(|| async { Ok(true) }));
    open(&mut confirmer);

    let confirm = confirmer.find("data-affirm-confirm").unwrap();
    confirmer.dispatch(PresenterEvent::Click(confirm));
    confirmer.step().await;

    assert_eq!(confirmer.data_state(), Some(DataState::Closed));
    assert_eq!(answer.try_outcome(), None);

    confirmer.dispatch(PresenterEvent::AnimationEnd);
    assert_eq!(answer.try_outcome(), Some(true));
    assert_eq!(events.try_recv().unwrap(), ConfirmerEvent::Confirm);
    assert_eq!(events.try_recv().unwrap(), ConfirmerEvent::Close { confirmed: true });
}

// =============================================================================
// Dismiss and teardown
// =============================================================================

#[tokio::test]
async fn test_dismiss_cancels_with_dismiss_reason() {
    let (store, mut confirmer) = setup();
    let reasons = Arc::new(Mutex::new(Vec::new()));
    let recorded = reasons.clone();
    let answer = store.request(ConfirmRequest::new("Leave?").on_cancel(move |reason| {
        recorded.lock().unwrap().push(reason);
        Ok(())
    }));
    open(&mut confirmer);

    store.request_dismiss();
    confirmer.process_pending();
    assert!(confirmer.is_closing());
    assert!(store.is_active());

    confirmer.dispatch(PresenterEvent::AnimationEnd);
    assert!(!answer.await);
    assert_eq!(*reasons.lock().unwrap(), vec![CancelReason::Dismiss]);
}

#[tokio::test]
async fn test_dismiss_while_idle_is_ignored() {
    let (store, mut confirmer) = setup();
    store.request_dismiss();
    confirmer.process_pending();

    let answer = store.request("Still shown?");
    open(&mut confirmer);
    assert!(!confirmer.is_closing());

    store.resolve(true);
    assert!(answer.await);
}

#[tokio::test]
async fn test_dropping_presenter_resolves_false() {
    let (store, mut confirmer) = setup();
    let active = store.request("Active");
    let queued = store.request("Queued");
    open(&mut confirmer);

    drop(confirmer);
    assert!(!active.await);

    // Nobody presents the queued request; clearing the queue settles it
    tokio::task::yield_now().await;
    store.clear_pending_queue();
    store.resolve(false);
    assert!(!queued.await);
    assert!(!store.is_active());
}
