use thiserror::Error;

use crate::form::FieldErrors;
use crate::models::image::ImageError;

/// Failures reported by a `ListingStore` backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("listing {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),

    #[error("failed to serialize listing document: {0}")]
    Serialize(#[from] mongodb::bson::ser::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Everything a listing operation can fail with, grouped the way the user
/// sees it.
#[derive(Debug, Error)]
pub enum ListingError {
    /// One or more fields failed their rule. Nothing was sent to the store.
    #[error("Please fix errors before submitting")]
    Validation(FieldErrors),

    #[error("Failed to load image: {0}")]
    Encoding(#[from] ImageError),

    #[error("{message}")]
    Remote {
        message: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("{0}")]
    Unauthorized(&'static str),

    /// Raised by `ListingDetail::delete` when a delete on the same detail is
    /// still running. Form submits take `&mut self` and cannot overlap.
    #[error("Another request on this listing is still running")]
    InFlight,
}

impl ListingError {
    pub fn remote(message: &'static str) -> impl FnOnce(StoreError) -> ListingError {
        move |source| ListingError::Remote { message, source }
    }

    /// True when the failure came from a store lookup that found nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ListingError::Remote {
                source: StoreError::NotFound(_),
                ..
            }
        )
    }
}

pub type Result<T, E = ListingError> = std::result::Result<T, E>;
