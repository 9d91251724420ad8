use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::error::{ListingError, Result};
use crate::form::{InFlight, ListingForm};
use crate::models::listing::Listing;
use crate::models::session::Session;
use crate::repository::ListingStore;
use crate::services::feed::ListingFeed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The owner declined the confirmation; nothing was sent to the store.
    Cancelled,
}

/// One listing on screen, with the owner-only edit and delete actions.
#[derive(Debug)]
pub struct ListingDetail {
    listing: Listing,
    editing: bool,
    deleting: AtomicBool,
}

impl ListingDetail {
    pub fn new(listing: Listing) -> Self {
        ListingDetail {
            listing,
            editing: false,
            deleting: AtomicBool::new(false),
        }
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn into_listing(self) -> Listing {
        self.listing
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn is_deleting(&self) -> bool {
        self.deleting.load(Ordering::Acquire)
    }

    /// Whether the edit and delete controls are offered to `session`.
    pub fn can_manage(&self, session: Option<&Session>) -> bool {
        session.is_some_and(|s| self.listing.is_owned_by(s))
    }

    /// Re-reads the listing. A listing that has vanished from the store keeps
    /// the copy already on screen; returns whether a fresh copy was found.
    pub async fn refresh<S>(&mut self, store: &S) -> Result<bool>
    where
        S: ListingStore + ?Sized,
    {
        let found = store
            .find(&self.listing.id)
            .await
            .map_err(ListingError::remote("Failed to load listing"))?;
        match found {
            Some(listing) => {
                self.listing = listing;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn open_editor(&mut self, session: Option<&Session>) -> Result<ListingForm> {
        if !self.can_manage(session) {
            return Err(ListingError::Unauthorized("You can only edit your own items"));
        }
        self.editing = true;
        Ok(ListingForm::edit(self.listing.clone()))
    }

    /// Called whenever the edit form closes, saved or not.
    pub async fn close_editor<S>(&mut self, store: &S) -> Result<bool>
    where
        S: ListingStore + ?Sized,
    {
        self.editing = false;
        self.refresh(store).await
    }

    pub async fn delete<S, F>(
        &self,
        session: Option<&Session>,
        store: &S,
        confirm: F,
        feed: &mut ListingFeed,
    ) -> Result<DeleteOutcome>
    where
        S: ListingStore + ?Sized,
        F: FnOnce(&Listing) -> bool,
    {
        let session = session.ok_or(ListingError::Unauthorized(
            "User or item information is missing",
        ))?;
        if !self.listing.is_owned_by(session) {
            return Err(ListingError::Unauthorized("You can only delete your own items"));
        }
        if !confirm(&self.listing) {
            return Ok(DeleteOutcome::Cancelled);
        }

        let _deleting = InFlight::enter(&self.deleting)?;
        match store.delete(&self.listing.id).await {
            Ok(()) => {
                info!(listing = %self.listing.id, "listing deleted");
                feed.remove(&self.listing.id);
                Ok(DeleteOutcome::Deleted)
            }
            Err(err) => {
                warn!(listing = %self.listing.id, error = %err, "listing delete failed");
                Err(ListingError::remote("Failed to delete item, try again")(err))
            }
        }
    }
}
