pub mod listing_repository;
pub mod memory_repository;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::listing::{Listing, ListingChanges, ListingId, NewListing};

pub use listing_repository::MongoListingRepository;
pub use memory_repository::InMemoryListingRepository;

/// The document store the listing components talk to.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn find(&self, id: &ListingId) -> Result<Option<Listing>, StoreError>;

    async fn create(&self, listing: NewListing) -> Result<ListingId, StoreError>;

    /// Fails with `StoreError::NotFound` when no listing has this id.
    async fn update(&self, id: &ListingId, changes: ListingChanges) -> Result<(), StoreError>;

    /// Fails with `StoreError::NotFound` when no listing has this id.
    async fn delete(&self, id: &ListingId) -> Result<(), StoreError>;

    async fn list(&self) -> Result<Vec<Listing>, StoreError>;
}
