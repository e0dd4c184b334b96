//! The free functions all talk to the process-wide store.
//!
//! Kept to a single test: the global store is shared by every test in this
//! binary.

use affirm::{ConfirmRequest, Confirmer, ConfirmerConfig, ElementTree, PresenterEvent, Variant};

#[tokio::test]
async fn test_free_functions_share_global_store() {
    let mut confirmer = Confirmer::new(
        affirm::global().clone(),
        ElementTree::new(),
        ConfirmerConfig::default(),
    );
    assert!(!affirm::is_open());

    let mut first = affirm::danger("Delete everything?");
    assert!(affirm::is_open());
    let snapshot = affirm::global().snapshot();
    assert_eq!(
        snapshot.request.as_ref().and_then(|r| r.variant),
        Some(Variant::Danger)
    );

    let queued = [
        affirm::warning("Queued warning"),
        affirm::info(ConfirmRequest::new("Queued info")),
    ];
    assert_eq!(affirm::global().pending_len(), 2);

    affirm::clear_queue();
    for answer in queued {
        assert!(!answer.await);
    }

    confirmer.process_pending();
    confirmer.dispatch(PresenterEvent::Frame);
    affirm::dismiss();
    confirmer.process_pending();
    confirmer.dispatch(PresenterEvent::AnimationEnd);

    assert_eq!(first.try_outcome(), Some(false));
    assert!(!affirm::is_open());

    let answer = affirm::success("All done");
    confirmer.process_pending();
    affirm::global().resolve(true);
    assert!(answer.await);
}
