//! Integration tests for queued confirmation requests
//!
//! These tests drive a store and a live presenter over an in-memory element
//! tree and check what the user would see over time:
//! - Requests issued back to back are shown one at a time, in call order
//! - Each future settles only after its own dialog has closed
//! - Queue clearing and duplicate resolution behave as no-ops where expected

use affirm::dialogs::DataState;
use affirm::{
    ConfirmRequest, ConfirmStore, Confirmer, ConfirmerConfig, Document, ElementTree,
    PresenterEvent,
};

fn presenter(store: &ConfirmStore) -> Confirmer<ElementTree> {
    Confirmer::new(store.clone(), ElementTree::new(), ConfirmerConfig::default())
}

/// Let spawned store tasks run and handle whatever they produced
async fn pump(confirmer: &mut Confirmer<ElementTree>) {
    for _ in 0..8 {
        tokio::task::yield_now().await;
        confirmer.process_pending();
    }
}

fn visible_title(confirmer: &Confirmer<ElementTree>) -> Option<String> {
    let title = confirmer.find("data-affirm-title")?;
    confirmer.document().text(title).map(str::to_string)
}

/// Press the confirm button and finish the close transition
fn confirm_visible(confirmer: &mut Confirmer<ElementTree>) {
    confirmer.dispatch(PresenterEvent::Frame);
    let confirm = confirmer
        .find("data-affirm-confirm")
        .expect("confirm button should be mounted");
    confirmer.dispatch(PresenterEvent::Click(confirm));
    assert_eq!(confirmer.data_state(), Some(DataState::Closed));
    confirmer.dispatch(PresenterEvent::AnimationEnd);
}

// =============================================================================
// End-to-end queue scenario
// =============================================================================

#[tokio::test]
async fn test_titles_appear_in_request_order() {
    let store = ConfirmStore::new();
    let mut confirmer = presenter(&store);

    let mut first = store.request("First");
    let mut second = store.request("Second");
    let mut third = store.request("Third");

    let mut seen = Vec::new();

    pump(&mut confirmer).await;
    seen.extend(visible_title(&confirmer));
    assert_eq!(second.try_outcome(), None);

    confirm_visible(&mut confirmer);
    assert_eq!(first.try_outcome(), Some(true));
    assert_eq!(second.try_outcome(), None);

    pump(&mut confirmer).await;
    seen.extend(visible_title(&confirmer));

    confirm_visible(&mut confirmer);
    assert_eq!(second.try_outcome(), Some(true));
    assert_eq!(third.try_outcome(), None);

    pump(&mut confirmer).await;
    seen.extend(visible_title(&confirmer));

    confirm_visible(&mut confirmer);
    assert_eq!(third.try_outcome(), Some(true));

    pump(&mut confirmer).await;
    assert_eq!(seen, vec!["First", "Second", "Third"]);
    assert!(!store.is_active());
    assert!(!confirmer.is_mounted());
}

#[tokio::test]
async fn test_scroll_lock_holds_between_queued_dialogs() {
    let store = ConfirmStore::new();
    let mut confirmer = presenter(&store);
    let body = confirmer.document().body();

    let _first = store.request("First");
    let _second = store.request("Second");
    pump(&mut confirmer).await;
    assert_eq!(confirmer.document().style(body, "overflow"), Some("hidden"));

    confirm_visible(&mut confirmer);
    // Closed instant between the two dialogs
    assert!(!store.is_active());
    assert_eq!(confirmer.document().style(body, "overflow"), Some("hidden"));

    pump(&mut confirmer).await;
    assert_eq!(visible_title(&confirmer).as_deref(), Some("Second"));

    confirm_visible(&mut confirmer);
    pump(&mut confirmer).await;
    assert_eq!(confirmer.document().style(body, "overflow"), None);
}

// =============================================================================
// Store-level ordering
// =============================================================================

#[tokio::test]
async fn test_futures_settle_in_call_order() {
    let store = ConfirmStore::new();
    let mut answers: Vec<_> = (0..5).map(|i| store.request(format!("Request {}", i))).collect();

    for (index, expected) in [true, false, true, true, false].into_iter().enumerate() {
        tokio::task::yield_now().await;
        let title = store.snapshot().request.as_ref().map(|r| r.title.clone());
        assert_eq!(title, Some(format!("Request {}", index)));

        for later in answers.iter_mut().skip(index) {
            assert_eq!(later.try_outcome(), None);
        }

        store.resolve(expected);
        assert_eq!(answers[index].try_outcome(), Some(expected));
    }

    tokio::task::yield_now().await;
    assert!(!store.is_active());
}

#[tokio::test]
async fn test_resolve_while_idle_is_ignored() {
    let store = ConfirmStore::new();
    let before = store.snapshot();

    store.resolve(true);
    store.resolve(false);

    assert!(std::sync::Arc::ptr_eq(&before, &store.snapshot()));
    assert!(!store.is_active());
}

#[tokio::test]
async fn test_second_resolve_is_ignored() {
    let store = ConfirmStore::new();
    let answer = store.request("Twice?");

    store.resolve(true);
    store.resolve(false);

    assert!(answer.await);
}

#[tokio::test]
async fn test_clear_queue_keeps_active_request() {
    let store = ConfirmStore::new();
    let mut active = store.request("Active");
    let queued: Vec<_> = ["A", "B", "C"].iter().map(|t| store.request(*t)).collect();
    assert_eq!(store.pending_len(), 3);

    store.clear_pending_queue();

    assert_eq!(store.pending_len(), 0);
    for answer in queued {
        assert!(!answer.await);
    }
    assert!(store.is_active());
    assert_eq!(active.try_outcome(), None);

    store.resolve(true);
    assert_eq!(active.try_outcome(), Some(true));
    tokio::task::yield_now().await;
    assert!(!store.is_active());
}

#[tokio::test]
async fn test_title_shorthand_matches_full_request() {
    let store = ConfirmStore::new();
    let _short = store.request("X");
    let short = store.snapshot().request.clone().unwrap();
    store.resolve(false);

    let _full = store.request(ConfirmRequest::new("X"));
    let full = store.snapshot().request.clone().unwrap();

    assert_eq!(short.title, full.title);
    assert_eq!(short.description, full.description);
    assert_eq!(short.variant, full.variant);
    assert_eq!(short.hide_cancel, full.hide_cancel);
    assert_eq!(short.is_dismissible(), full.is_dismissible());
}
