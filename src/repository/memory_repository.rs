use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::listing::{Listing, ListingChanges, ListingId, NewListing};
use crate::repository::ListingStore;

/// Process-local store, kept in insertion order.
#[derive(Default)]
pub struct InMemoryListingRepository {
    listings: RwLock<Vec<Listing>>,
}

impl InMemoryListingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listings(listings: Vec<Listing>) -> Self {
        InMemoryListingRepository {
            listings: RwLock::new(listings),
        }
    }
}

#[async_trait]
impl ListingStore for InMemoryListingRepository {
    async fn find(&self, id: &ListingId) -> Result<Option<Listing>, StoreError> {
        let listings = self.listings.read().await;
        Ok(listings.iter().find(|l| &l.id == id).cloned())
    }

    async fn create(&self, listing: NewListing) -> Result<ListingId, StoreError> {
        let id = ListingId::new(Uuid::new_v4().simple().to_string());
        self.listings
            .write()
            .await
            .push(listing.into_listing(id.clone()));
        Ok(id)
    }

    async fn update(&self, id: &ListingId, changes: ListingChanges) -> Result<(), StoreError> {
        let mut listings = self.listings.write().await;
        let listing = listings
            .iter_mut()
            .find(|l| &l.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        listing.apply(&changes);
        Ok(())
    }

    async fn delete(&self, id: &ListingId) -> Result<(), StoreError> {
        let mut listings = self.listings.write().await;
        let before = listings.len();
        listings.retain(|l| &l.id != id);
        if listings.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Listing>, StoreError> {
        Ok(self.listings.read().await.clone())
    }
}
