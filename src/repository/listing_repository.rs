use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, doc};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};

use crate::config::MongoConfig;
use crate::error::StoreError;
use crate::models::listing::{Listing, ListingChanges, ListingId, NewListing};
use crate::repository::ListingStore;

/// Listing as stored in MongoDB: same keys as `Listing`, but keyed by `_id`.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct ListingDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    title: String,
    #[serde(default)]
    category: String,
    price: f64,
    #[serde(default)]
    description: String,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    user_email: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_name: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl From<NewListing> for ListingDocument {
    fn from(listing: NewListing) -> Self {
        ListingDocument {
            id: None,
            title: listing.title,
            category: listing.category,
            price: listing.price,
            description: listing.description,
            image_url: Some(listing.image_url),
            user_id: Some(listing.user_id),
            user_email: listing.user_email,
            email: None,
            user_name: Some(listing.user_name),
            created_at: Some(listing.created_at),
            updated_at: None,
        }
    }
}

impl From<ListingDocument> for Listing {
    fn from(doc: ListingDocument) -> Self {
        Listing {
            id: ListingId::new(doc.id.map(|oid| oid.to_hex()).unwrap_or_default()),
            title: doc.title,
            category: doc.category,
            price: doc.price,
            description: doc.description,
            image_url: doc.image_url,
            user_id: doc.user_id,
            user_email: doc.user_email,
            email: doc.email,
            user_name: doc.user_name,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

pub struct MongoListingRepository {
    collection: Collection<ListingDocument>,
}

impl MongoListingRepository {
    pub async fn connect(config: &MongoConfig) -> Result<Self, StoreError> {
        let mut client_options = ClientOptions::parse(&config.uri).await?;
        client_options.app_name = Some(config.app_name.clone());
        let client = Client::with_options(client_options)?;
        Ok(MongoListingRepository::new(&client, config))
    }

    pub fn new(client: &Client, config: &MongoConfig) -> Self {
        let db = client.database(&config.database);
        let collection = db.collection::<ListingDocument>(&config.collection);
        MongoListingRepository { collection }
    }
}

// A malformed id cannot name any stored listing.
fn object_id(id: &ListingId) -> Option<ObjectId> {
    ObjectId::parse_str(id.as_str()).ok()
}

#[async_trait]
impl ListingStore for MongoListingRepository {
    async fn find(&self, id: &ListingId) -> Result<Option<Listing>, StoreError> {
        let Some(oid) = object_id(id) else {
            return Ok(None);
        };
        let found = self.collection.find_one(doc! { "_id": oid }, None).await?;
        Ok(found.map(Listing::from))
    }

    async fn create(&self, listing: NewListing) -> Result<ListingId, StoreError> {
        let result = self
            .collection
            .insert_one(ListingDocument::from(listing), None)
            .await?;
        match result.inserted_id.as_object_id() {
            Some(oid) => Ok(ListingId::new(oid.to_hex())),
            None => Err(StoreError::Unavailable(format!(
                "unexpected inserted id {}",
                result.inserted_id
            ))),
        }
    }

    async fn update(&self, id: &ListingId, changes: ListingChanges) -> Result<(), StoreError> {
        let oid = object_id(id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let set = bson::to_document(&changes)?;
        let result = self
            .collection
            .update_one(doc! { "_id": oid }, doc! { "$set": set }, None)
            .await?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: &ListingId) -> Result<(), StoreError> {
        let oid = object_id(id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let result = self.collection.delete_one(doc! { "_id": oid }, None).await?;
        if result.deleted_count == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Listing>, StoreError> {
        let mut cursor = self.collection.find(None, None).await?;
        let mut listings = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            listings.push(Listing::from(doc));
        }
        Ok(listings)
    }
}
