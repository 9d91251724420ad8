//! Marketplace listings: a validated listing form that creates or updates
//! records in a document store, the owner-only detail actions, and a Rocket
//! JSON surface over both.

pub mod config;
pub mod error;
pub mod form;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;

pub use error::{ListingError, StoreError};
pub use form::{FieldErrors, FormMode, ImageField, ListingForm};
pub use models::image::ImageBlob;
pub use models::listing::{Listing, ListingChanges, ListingId, NewListing};
pub use models::session::Session;
pub use repository::{InMemoryListingRepository, ListingStore, MongoListingRepository};
pub use services::detail::{DeleteOutcome, ListingDetail};
pub use services::feed::ListingFeed;
