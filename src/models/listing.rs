use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::session::Session;

/// Store-assigned identifier of a listing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ListingId(String);

impl ListingId {
    pub fn new(id: impl Into<String>) -> Self {
        ListingId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ListingId {
    fn from(id: String) -> Self {
        ListingId(id)
    }
}

impl From<&str> for ListingId {
    fn from(id: &str) -> Self {
        ListingId(id.to_string())
    }
}

/// A marketplace item as read back from the store.
///
/// Owner fields are optional because older records were written with only
/// some of them (`email` instead of `userEmail`, no `userId`, ...).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    #[serde(default)]
    pub category: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub email: Option<String>, // legacy owner email
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Listing {
    /// Owner match: the caller's id equals `userId`, or the caller's email
    /// equals `userEmail` or the legacy `email`. Empty values never match.
    pub fn is_owned_by(&self, session: &Session) -> bool {
        fn same(a: Option<&str>, b: Option<&str>) -> bool {
            matches!((a, b), (Some(a), Some(b)) if !a.is_empty() && a == b)
        }

        let email = session.email.as_deref();
        same(Some(session.uid.as_str()), self.user_id.as_deref())
            || same(email, self.user_email.as_deref())
            || same(email, self.email.as_deref())
    }

    /// Applies an update to the in-memory copy the same way the store does.
    pub fn apply(&mut self, changes: &ListingChanges) {
        self.title = changes.title.clone();
        self.category = changes.category.clone();
        self.price = changes.price;
        self.description = changes.description.clone();
        self.image_url = Some(changes.image_url.clone());
        self.updated_at = Some(changes.updated_at);
    }
}

/// Document written on create. Owner fields come from the session and are
/// never touched again.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewListing {
    pub title: String,
    pub category: String,
    pub price: f64,
    pub description: String,
    pub image_url: String,
    pub user_id: String,
    pub user_email: Option<String>,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
}

impl NewListing {
    pub fn into_listing(self, id: ListingId) -> Listing {
        Listing {
            id,
            title: self.title,
            category: self.category,
            price: self.price,
            description: self.description,
            image_url: Some(self.image_url),
            user_id: Some(self.user_id),
            user_email: self.user_email,
            email: None,
            user_name: Some(self.user_name),
            created_at: Some(self.created_at),
            updated_at: None,
        }
    }
}

/// The editable subset of a listing plus the update stamp.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListingChanges {
    pub title: String,
    pub category: String,
    pub price: f64,
    pub description: String,
    pub image_url: String,
    pub updated_at: DateTime<Utc>,
}
