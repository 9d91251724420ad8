//! The listing form: field state, per-keystroke validation and the
//! create-or-update submit protocol.

pub mod validate;

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ListingError, Result};
use crate::models::image::ImageBlob;
use crate::models::listing::{Listing, ListingChanges, ListingId, NewListing};
use crate::models::session::Session;
use crate::repository::ListingStore;
use crate::services::feed::ListingFeed;

use validate::{
    sanitize_price, validate_category, validate_description, validate_image, validate_price,
    validate_title,
};

/// Current message per field; `""` means the field is fine.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub title: &'static str,
    pub category: &'static str,
    pub price: &'static str,
    pub description: &'static str,
    pub image: &'static str,
}

impl FieldErrors {
    pub fn is_clean(&self) -> bool {
        self.messages().next().is_none()
    }

    /// Non-empty messages in form order.
    pub fn messages(&self) -> impl Iterator<Item = &'static str> {
        [self.title, self.category, self.price, self.description, self.image]
            .into_iter()
            .filter(|m| !m.is_empty())
    }
}

/// The image slot of the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImageField {
    #[default]
    Empty,
    /// A file picked in this form session.
    Upload(ImageBlob),
    /// The image already stored on the listing being edited, left untouched.
    Existing(String),
}

impl ImageField {
    pub fn is_present(&self) -> bool {
        !matches!(self, ImageField::Empty)
    }

    fn check(&self) -> &'static str {
        match self {
            ImageField::Empty => validate_image(None),
            ImageField::Upload(blob) => validate_image(Some(blob)),
            ImageField::Existing(_) => "",
        }
    }

    fn to_url(&self) -> Result<String> {
        match self {
            ImageField::Upload(blob) => Ok(blob.to_data_url()?),
            ImageField::Existing(url) => Ok(url.clone()),
            ImageField::Empty => Ok(String::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormMode {
    Create,
    Edit(Listing),
}

/// Clears a busy flag however the guarded operation ends, including when its
/// future is dropped.
pub(crate) struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    /// Marks the flag busy without checking it. For operations whose receiver
    /// is `&mut`, where the borrow already rules out overlap.
    fn hold(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        InFlight(flag)
    }

    /// Fails with `ListingError::InFlight` when the flag is already set.
    pub(crate) fn enter(flag: &'a AtomicBool) -> Result<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            return Err(ListingError::InFlight);
        }
        Ok(InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
pub struct ListingForm {
    title: String,
    category: String,
    price: String,
    description: String,
    image: ImageField,
    errors: FieldErrors,
    submitting: AtomicBool,
    mode: FormMode,
    open: bool,
}

impl Default for ListingForm {
    fn default() -> Self {
        ListingForm::new()
    }
}

impl ListingForm {
    /// An empty form for a new listing.
    pub fn new() -> Self {
        ListingForm {
            title: String::new(),
            category: String::new(),
            price: String::new(),
            description: String::new(),
            image: ImageField::Empty,
            errors: FieldErrors::default(),
            submitting: AtomicBool::new(false),
            mode: FormMode::Create,
            open: true,
        }
    }

    /// A form pre-populated from an existing listing. The stored image counts
    /// as present, so saving without picking a new file keeps it.
    pub fn edit(listing: Listing) -> Self {
        let mut form = ListingForm::new();
        form.title = listing.title.clone();
        form.category = listing.category.clone();
        form.price = listing.price.to_string();
        form.description = listing.description.clone();
        form.image = match listing.image_url.as_deref() {
            Some(url) if !url.is_empty() => ImageField::Existing(url.to_string()),
            _ => ImageField::Empty,
        };
        form.mode = FormMode::Edit(listing);
        form
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn price(&self) -> &str {
        &self.price
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn image(&self) -> &ImageField {
        &self.image
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    pub fn set_title(&mut self, value: impl Into<String>) {
        self.title = value.into();
        self.errors.title = validate_title(&self.title);
    }

    pub fn set_category(&mut self, value: impl Into<String>) {
        self.category = value.into();
        self.errors.category = validate_category(&self.category);
    }

    /// Keystroke entry: anything but digits and `.` is dropped first.
    pub fn set_price(&mut self, value: &str) {
        self.price = sanitize_price(value);
        self.errors.price = validate_price(&self.price);
    }

    /// Takes the price text exactly as given, so signs, exponents and
    /// separators are rejected rather than stripped.
    pub fn enter_price(&mut self, value: impl Into<String>) {
        self.price = value.into();
        self.errors.price = validate_price(&self.price);
    }

    pub fn set_description(&mut self, value: impl Into<String>) {
        self.description = value.into();
        self.errors.description = validate_description(&self.description);
    }

    /// Picks a file. A file that breaks the image rule is not kept.
    pub fn select_image(&mut self, blob: ImageBlob) {
        let message = validate_image(Some(&blob));
        self.errors.image = message;
        self.image = if message.is_empty() {
            ImageField::Upload(blob)
        } else {
            ImageField::Empty
        };
    }

    pub fn remove_image(&mut self) {
        self.image = ImageField::Empty;
        self.errors.image = validate_image(None);
    }

    /// Runs every validator over the current values. A rejected file leaves
    /// the slot empty but its message stands until another file is picked.
    pub fn check(&self) -> FieldErrors {
        let image = match (&self.image, self.errors.image) {
            (ImageField::Empty, rejected) if !rejected.is_empty() => rejected,
            (image, _) => image.check(),
        };
        FieldErrors {
            title: validate_title(&self.title),
            category: validate_category(&self.category),
            price: validate_price(&self.price),
            description: validate_description(&self.description),
            image,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.image.is_present() && self.check().is_clean()
    }

    pub fn can_submit(&self) -> bool {
        self.is_valid() && !self.is_submitting()
    }

    /// Resets every field and closes the form.
    pub fn close(&mut self) {
        self.title.clear();
        self.category.clear();
        self.price.clear();
        self.description.clear();
        self.image = ImageField::Empty;
        self.errors = FieldErrors::default();
        self.open = false;
    }

    /// Creates or updates the listing, refreshes `feed` from the store and
    /// closes the form. On any error the entered values are kept for a retry.
    ///
    /// The `&mut self` receiver keeps a single submission in flight per form;
    /// `is_submitting` reports it to observers and resets if the future is
    /// dropped.
    pub async fn submit<S>(
        &mut self,
        session: Option<&Session>,
        store: &S,
        feed: &mut ListingFeed,
    ) -> Result<ListingId>
    where
        S: ListingStore + ?Sized,
    {
        let session = session.ok_or(ListingError::Unauthorized("Please login"))?;
        if let FormMode::Edit(original) = &self.mode {
            if !original.is_owned_by(session) {
                return Err(ListingError::Unauthorized("You can only edit your own items"));
            }
        }

        self.errors = self.check();
        if !self.errors.is_clean() {
            return Err(ListingError::Validation(self.errors.clone()));
        }

        let outcome = {
            let _in_flight = InFlight::hold(&self.submitting);
            self.dispatch(session, store).await
        };

        match outcome {
            Ok((id, listings)) => {
                info!(listing = %id, count = listings.len(), "listing saved");
                feed.replace(listings);
                self.close();
                Ok(id)
            }
            Err(err) => {
                warn!(error = %err, "listing submit failed");
                Err(err)
            }
        }
    }

    async fn dispatch<S>(&self, session: &Session, store: &S) -> Result<(ListingId, Vec<Listing>)>
    where
        S: ListingStore + ?Sized,
    {
        let image_url = self.image.to_url()?;
        let title = self.title.trim().to_string();
        let category = self.category.trim().to_string();
        let description = self.description.trim().to_string();
        let price = validate::parse_price(self.price.trim()).unwrap_or_default();

        let id = match &self.mode {
            FormMode::Edit(original) => {
                let changes = ListingChanges {
                    title,
                    category,
                    price,
                    description,
                    image_url,
                    updated_at: Utc::now(),
                };
                store
                    .update(&original.id, changes)
                    .await
                    .map_err(ListingError::remote("Failed to save item"))?;
                original.id.clone()
            }
            FormMode::Create => {
                let listing = NewListing {
                    title,
                    category,
                    price,
                    description,
                    image_url,
                    user_id: session.uid.clone(),
                    user_email: session.email.clone(),
                    user_name: session.seller_name().to_string(),
                    created_at: Utc::now(),
                };
                store
                    .create(listing)
                    .await
                    .map_err(ListingError::remote("Failed to save item"))?
            }
        };

        let listings = store
            .list()
            .await
            .map_err(ListingError::remote("Failed to save item"))?;
        Ok((id, listings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::image::MAX_IMAGE_BYTES;

    fn filled() -> ListingForm {
        let mut form = ListingForm::new();
        form.set_title("Chair");
        form.set_category("Furniture");
        form.set_price("500");
        form.set_description("Wooden chair, good condition");
        form.select_image(ImageBlob::new(vec![1, 2, 3], "image/png"));
        form
    }

    #[test]
    fn new_form_is_not_valid() {
        let form = ListingForm::new();
        assert!(!form.is_valid());
        assert!(form.errors().is_clean());
    }

    #[test]
    fn toggling_a_field_flips_validity() {
        let mut form = filled();
        assert!(form.is_valid());
        assert!(form.can_submit());

        form.set_title("ab");
        assert!(!form.is_valid());
        assert_eq!(form.errors().title, "Title must be at least 3 characters");

        form.set_title("abc");
        assert!(form.is_valid());
        assert_eq!(form.errors().title, "");

        form.set_category("F");
        assert!(!form.is_valid());
        form.set_category("Furniture");
        assert!(form.is_valid());

        form.set_price("0");
        assert!(!form.is_valid());
        form.set_price("10.5");
        assert!(form.is_valid());

        form.set_description("short");
        assert!(!form.is_valid());
        form.set_description("Wooden chair, good condition");
        assert!(form.is_valid());

        form.remove_image();
        assert!(!form.is_valid());
        form.select_image(ImageBlob::new(vec![1, 2, 3], "image/png"));
        assert!(form.is_valid());
        assert!(form.errors().is_clean());
    }

    #[test]
    fn rejected_file_message_survives_the_full_check() {
        let mut form = filled();
        form.select_image(ImageBlob::new(vec![1], "application/pdf"));
        assert_eq!(form.check().image, "File must be an image");

        form.select_image(ImageBlob::new(vec![0; MAX_IMAGE_BYTES + 1], "image/png"));
        assert_eq!(form.check().image, "Image must be less than 1MB");

        form.remove_image();
        assert_eq!(form.check().image, "Image is required");
    }

    #[test]
    fn entered_price_is_not_sanitized() {
        let mut form = ListingForm::new();
        form.enter_price("-5");
        assert_eq!(form.price(), "-5");
        assert_eq!(form.errors().price, "Price must be a valid number");

        form.enter_price("1,000");
        assert_eq!(form.errors().price, "Price must be a valid number");

        form.enter_price("1000");
        assert_eq!(form.errors().price, "");
    }

    #[test]
    fn image_is_required_for_validity() {
        let mut form = filled();
        form.remove_image();
        assert!(!form.is_valid());
        assert_eq!(form.errors().image, "Image is required");
    }

    #[test]
    fn rejected_file_is_not_kept() {
        let mut form = filled();
        form.select_image(ImageBlob::new(vec![1], "text/plain"));
        assert_eq!(form.image(), &ImageField::Empty);
        assert_eq!(form.errors().image, "File must be an image");
    }

    #[test]
    fn price_keystrokes_are_sanitized() {
        let mut form = ListingForm::new();
        form.set_price("₹ 1,250.50");
        assert_eq!(form.price(), "1250.50");
        assert_eq!(form.errors().price, "");
    }

    #[test]
    fn close_resets_everything() {
        let mut form = filled();
        form.set_title("x");
        form.close();

        assert!(!form.is_open());
        assert_eq!(form.title(), "");
        assert_eq!(form.image(), &ImageField::Empty);
        assert!(form.errors().is_clean());
    }
}
