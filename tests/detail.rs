mod common;

use std::sync::atomic::Ordering;

use common::{chair, owner, stranger, RecordingStore};
use listing_market::{
    DeleteOutcome, ListingDetail, ListingError, ListingFeed, ListingStore, Session,
};

#[tokio::test]
async fn controls_are_offered_to_the_owner_only() {
    let detail = ListingDetail::new(chair());

    assert!(detail.can_manage(Some(&owner())));
    assert!(detail.can_manage(Some(&Session::new("u9", Some("owner@example.com")))));
    assert!(!detail.can_manage(Some(&stranger())));
    assert!(!detail.can_manage(None));
}

#[tokio::test]
async fn confirmed_delete_removes_from_store_and_feed() {
    let store = RecordingStore::with_listings(vec![chair()]);
    let mut feed = ListingFeed::load(&store).await.unwrap();
    let detail = ListingDetail::new(chair());

    let outcome = detail
        .delete(Some(&owner()), &store, |_| true, &mut feed)
        .await
        .unwrap();

    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert_eq!(RecordingStore::count(&store.deletes), 1);
    assert!(feed.items().is_empty());
    assert!(store.list().await.unwrap().is_empty());
    assert!(!detail.is_deleting());
}

#[tokio::test]
async fn declined_confirmation_sends_nothing() {
    let store = RecordingStore::with_listings(vec![chair()]);
    let mut feed = ListingFeed::new();
    let detail = ListingDetail::new(chair());

    let outcome = detail
        .delete(Some(&owner()), &store, |_| false, &mut feed)
        .await
        .unwrap();

    assert_eq!(outcome, DeleteOutcome::Cancelled);
    assert_eq!(store.remote_calls(), 0);
}

#[tokio::test]
async fn strangers_and_anonymous_callers_cannot_delete() {
    let store = RecordingStore::with_listings(vec![chair()]);
    let mut feed = ListingFeed::new();
    let detail = ListingDetail::new(chair());
    let mut asked = false;

    let err = detail
        .delete(
            Some(&stranger()),
            &store,
            |_| {
                asked = true;
                true
            },
            &mut feed,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ListingError::Unauthorized("You can only delete your own items")
    ));

    let err = detail
        .delete(None, &store, |_| true, &mut feed)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ListingError::Unauthorized("User or item information is missing")
    ));

    assert!(!asked);
    assert_eq!(store.remote_calls(), 0);
}

#[tokio::test]
async fn failed_delete_is_reported_and_clears_the_flag() {
    let store = RecordingStore::with_listings(vec![chair()]);
    store.fail_writes.store(true, Ordering::SeqCst);
    let mut feed = ListingFeed::load(&store).await.unwrap();
    let detail = ListingDetail::new(chair());

    let err = detail
        .delete(Some(&owner()), &store, |_| true, &mut feed)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Failed to delete item, try again");
    assert!(!detail.is_deleting());
    assert_eq!(feed.items().len(), 1);
}

#[tokio::test]
async fn closing_the_editor_refreshes_the_listing() {
    let store = RecordingStore::with_listings(vec![chair()]);
    let mut detail = ListingDetail::new(chair());
    let session = owner();

    let mut form = detail.open_editor(Some(&session)).unwrap();
    assert!(detail.is_editing());
    form.set_title("Rocking chair");
    form.submit(Some(&session), &store, &mut ListingFeed::new())
        .await
        .unwrap();

    let found = detail.close_editor(&store).await.unwrap();

    assert!(found);
    assert!(!detail.is_editing());
    assert_eq!(detail.listing().title, "Rocking chair");
}

#[tokio::test]
async fn refresh_keeps_the_copy_when_the_listing_is_gone() {
    let store = RecordingStore::new();
    let mut detail = ListingDetail::new(chair());

    let found = detail.refresh(&store).await.unwrap();

    assert!(!found);
    assert_eq!(detail.listing(), &chair());
    assert_eq!(RecordingStore::count(&store.finds), 1);
}

#[tokio::test]
async fn stranger_cannot_open_the_editor() {
    let mut detail = ListingDetail::new(chair());

    let err = detail.open_editor(Some(&stranger())).unwrap_err();

    assert!(matches!(err, ListingError::Unauthorized(_)));
    assert!(!detail.is_editing());
}

#[tokio::test]
async fn second_delete_while_the_first_runs_is_refused() {
    let store = RecordingStore::with_listings(vec![chair()]);
    store.hang_writes.store(true, Ordering::SeqCst);
    let detail = ListingDetail::new(chair());
    let session = owner();
    let (mut first_feed, mut second_feed) = (ListingFeed::new(), ListingFeed::new());

    let (first, second) = tokio::join!(
        tokio::time::timeout(
            std::time::Duration::from_millis(20),
            detail.delete(Some(&session), &store, |_| true, &mut first_feed),
        ),
        detail.delete(Some(&session), &store, |_| true, &mut second_feed),
    );

    assert!(first.is_err());
    assert!(matches!(second, Err(ListingError::InFlight)));
    assert_eq!(RecordingStore::count(&store.deletes), 1);
    assert!(!detail.is_deleting());
}
