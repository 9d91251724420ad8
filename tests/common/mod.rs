#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use listing_market::models::listing::{Listing, ListingChanges, ListingId, NewListing};
use listing_market::{ImageBlob, InMemoryListingRepository, ListingStore, Session, StoreError};

/// In-memory store that counts calls and can be told to fail or hang.
#[derive(Default)]
pub struct RecordingStore {
    inner: InMemoryListingRepository,
    pub finds: AtomicUsize,
    pub creates: AtomicUsize,
    pub updates: AtomicUsize,
    pub deletes: AtomicUsize,
    pub lists: AtomicUsize,
    pub fail_writes: AtomicBool,
    pub hang_writes: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listings(listings: Vec<Listing>) -> Self {
        RecordingStore {
            inner: InMemoryListingRepository::with_listings(listings),
            ..Default::default()
        }
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn remote_calls(&self) -> usize {
        [&self.finds, &self.creates, &self.updates, &self.deletes, &self.lists]
            .into_iter()
            .map(|c| c.load(Ordering::SeqCst))
            .sum()
    }

    async fn write_gate(&self) -> Result<(), StoreError> {
        if self.hang_writes.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("network down".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ListingStore for RecordingStore {
    async fn find(&self, id: &ListingId) -> Result<Option<Listing>, StoreError> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find(id).await
    }

    async fn create(&self, listing: NewListing) -> Result<ListingId, StoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.write_gate().await?;
        self.inner.create(listing).await
    }

    async fn update(&self, id: &ListingId, changes: ListingChanges) -> Result<(), StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.write_gate().await?;
        self.inner.update(id, changes).await
    }

    async fn delete(&self, id: &ListingId) -> Result<(), StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.write_gate().await?;
        self.inner.delete(id).await
    }

    async fn list(&self) -> Result<Vec<Listing>, StoreError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.inner.list().await
    }
}

pub fn owner() -> Session {
    Session::new("u1", Some("owner@example.com")).with_display_name("Owner")
}

pub fn stranger() -> Session {
    Session::new("u2", Some("someone@example.com"))
}

pub fn png() -> ImageBlob {
    ImageBlob::new(vec![0x89, b'P', b'N', b'G'], "image/png")
}

pub fn chair() -> Listing {
    Listing {
        id: ListingId::from("chair-1"),
        title: "Chair".to_string(),
        category: "Furniture".to_string(),
        price: 500.0,
        description: "Wooden chair, good condition".to_string(),
        image_url: Some("http://x/img.jpg".to_string()),
        user_id: Some("u1".to_string()),
        user_email: Some("owner@example.com".to_string()),
        email: None,
        user_name: Some("Owner".to_string()),
        created_at: Some("2024-01-01T00:00:00Z".parse().unwrap()),
        updated_at: None,
    }
}
