use crate::error::{ListingError, Result};
use crate::models::listing::{Listing, ListingId};
use crate::repository::ListingStore;

/// The caller's in-memory list of listings, refreshed after every write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFeed {
    items: Vec<Listing>,
}

impl ListingFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load<S>(store: &S) -> Result<Self>
    where
        S: ListingStore + ?Sized,
    {
        let items = store
            .list()
            .await
            .map_err(ListingError::remote("Failed to load listings"))?;
        Ok(ListingFeed { items })
    }

    pub fn items(&self) -> &[Listing] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Listing> {
        self.items
    }

    pub fn get(&self, id: &ListingId) -> Option<&Listing> {
        self.items.iter().find(|l| &l.id == id)
    }

    pub fn replace(&mut self, items: Vec<Listing>) {
        self.items = items;
    }

    pub fn remove(&mut self, id: &ListingId) -> Option<Listing> {
        let index = self.items.iter().position(|l| &l.id == id)?;
        Some(self.items.remove(index))
    }
}
