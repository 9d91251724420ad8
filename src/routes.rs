use std::sync::Arc;

use rocket::data::{Limits, ToByteUnit};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::request::{FromRequest, Outcome};
use rocket::serde::json::Json;
use rocket::{catch, catchers, delete, get, options, post, put, routes};
use rocket::{Build, Request, Response, Rocket, State};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{ListingError, StoreError};
use crate::form::{FieldErrors, ListingForm};
use crate::models::image::{ImageBlob, ImageError};
use crate::models::listing::{Listing, ListingId};
use crate::models::session::Session;
use crate::repository::ListingStore;
use crate::services::detail::{DeleteOutcome, ListingDetail};
use crate::services::feed::ListingFeed;

pub type SharedStore = Arc<dyn ListingStore>;

pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PUT, DELETE, OPTIONS",
        ));
        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Content-Type, X-User-Id, X-User-Email, X-User-Name",
        ));
    }
}

fn header_value(request: &Request<'_>, name: &str) -> Option<String> {
    request
        .headers()
        .get_one(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Identity forwarded by the gateway in front of this service.
#[rocket::async_trait]
impl<'r> FromRequest<'r> for Session {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match header_value(request, "X-User-Id") {
            Some(uid) => Outcome::Success(Session {
                uid,
                email: header_value(request, "X-User-Email"),
                display_name: header_value(request, "X-User-Name"),
            }),
            None => Outcome::Forward(Status::Unauthorized),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ApiResponse<T> {
    pub message: String,
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl<T> ApiResponse<T> {
    fn with(message: impl Into<String>, result: Option<T>) -> Json<Self> {
        Json(ApiResponse {
            message: message.into(),
            result,
            errors: None,
        })
    }
}

type Reply<T> = (Status, Json<ApiResponse<T>>);

fn reject<T>(err: ListingError, signed_in: bool) -> Reply<T> {
    let status = match &err {
        ListingError::Validation(_) | ListingError::Encoding(_) => Status::BadRequest,
        ListingError::Unauthorized(_) if signed_in => Status::Forbidden,
        ListingError::Unauthorized(_) => Status::Unauthorized,
        ListingError::InFlight => Status::Conflict,
        err if err.is_not_found() => Status::NotFound,
        ListingError::Remote { source, .. } => {
            error!(error = %source, "store request failed");
            Status::InternalServerError
        }
    };
    let errors = match &err {
        ListingError::Validation(errors) => Some(errors.clone()),
        _ => None,
    };
    (
        status,
        Json(ApiResponse {
            message: err.to_string(),
            result: None,
            errors,
        }),
    )
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum PriceInput {
    Number(f64),
    Text(String),
}

impl PriceInput {
    fn as_text(&self) -> String {
        match self {
            PriceInput::Number(n) => n.to_string(),
            PriceInput::Text(s) => s.clone(),
        }
    }
}

/// Body of create and update requests. `image` is a base64 data URL; on
/// update it may be left out to keep the stored image.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ListingPayload {
    pub title: String,
    pub category: String,
    pub price: PriceInput,
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl ListingPayload {
    fn fill(self, form: &mut ListingForm) -> Result<(), ImageError> {
        form.set_title(self.title);
        form.set_category(self.category);
        form.enter_price(self.price.as_text());
        form.set_description(self.description);
        if let Some(url) = self.image {
            form.select_image(ImageBlob::from_data_url(&url)?);
        }
        Ok(())
    }
}

#[derive(Serialize, Debug)]
pub struct SubmitReply {
    pub id: ListingId,
    pub listings: Vec<Listing>,
}

async fn find_listing(store: &dyn ListingStore, id: &ListingId) -> Result<Listing, ListingError> {
    store
        .find(id)
        .await
        .map_err(ListingError::remote("Failed to load listing"))?
        .ok_or_else(|| ListingError::Remote {
            message: "Listing not found",
            source: StoreError::NotFound(id.to_string()),
        })
}

#[options("/<_..>")]
fn all_options() -> Status {
    Status::Ok
}

#[get("/listings")]
async fn get_all_listings(store: &State<SharedStore>) -> Reply<Vec<Listing>> {
    match ListingFeed::load(store.inner().as_ref()).await {
        Ok(feed) if !feed.items().is_empty() => {
            (Status::Ok, ApiResponse::with("200: Success", Some(feed.into_items())))
        }
        Ok(_) => (Status::NoContent, ApiResponse::with("204: No Content", None)),
        Err(err) => reject(err, false),
    }
}

#[get("/listings/<id>")]
async fn get_listing(store: &State<SharedStore>, id: &str) -> Reply<Listing> {
    match find_listing(store.inner().as_ref(), &ListingId::from(id)).await {
        Ok(listing) => (Status::Ok, ApiResponse::with("200: Success", Some(listing))),
        Err(err) => reject(err, false),
    }
}

#[post("/listings", format = "json", data = "<payload>")]
async fn create_listing(
    store: &State<SharedStore>,
    session: Option<Session>,
    payload: Json<ListingPayload>,
) -> Reply<SubmitReply> {
    let mut form = ListingForm::new();
    if let Err(err) = payload.into_inner().fill(&mut form) {
        return reject(err.into(), session.is_some());
    }

    let mut feed = ListingFeed::new();
    match form
        .submit(session.as_ref(), store.inner().as_ref(), &mut feed)
        .await
    {
        Ok(id) => (
            Status::Created,
            ApiResponse::with(
                "Item listed!",
                Some(SubmitReply {
                    id,
                    listings: feed.into_items(),
                }),
            ),
        ),
        Err(err) => reject(err, session.is_some()),
    }
}

#[put("/listings/<id>", format = "json", data = "<payload>")]
async fn update_listing(
    store: &State<SharedStore>,
    session: Option<Session>,
    id: &str,
    payload: Json<ListingPayload>,
) -> Reply<SubmitReply> {
    let store = store.inner().as_ref();
    let listing = match find_listing(store, &ListingId::from(id)).await {
        Ok(listing) => listing,
        Err(err) => return reject(err, session.is_some()),
    };

    let mut form = ListingForm::edit(listing);
    if let Err(err) = payload.into_inner().fill(&mut form) {
        return reject(err.into(), session.is_some());
    }

    let mut feed = ListingFeed::new();
    match form.submit(session.as_ref(), store, &mut feed).await {
        Ok(id) => (
            Status::Ok,
            ApiResponse::with(
                "Item updated!",
                Some(SubmitReply {
                    id,
                    listings: feed.into_items(),
                }),
            ),
        ),
        Err(err) => reject(err, session.is_some()),
    }
}

#[delete("/listings/<id>?<confirm>")]
async fn delete_listing(
    store: &State<SharedStore>,
    session: Option<Session>,
    id: &str,
    confirm: Option<bool>,
) -> Reply<()> {
    let store = store.inner().as_ref();
    let detail = match find_listing(store, &ListingId::from(id)).await {
        Ok(listing) => ListingDetail::new(listing),
        Err(err) => return reject(err, session.is_some()),
    };

    let mut feed = ListingFeed::new();
    let outcome = detail
        .delete(session.as_ref(), store, |_| confirm.unwrap_or(false), &mut feed)
        .await;
    match outcome {
        Ok(DeleteOutcome::Deleted) => (
            Status::Ok,
            ApiResponse::with("Item deleted successfully", None),
        ),
        Ok(DeleteOutcome::Cancelled) => (
            Status::PreconditionRequired,
            ApiResponse::with("Deletion must be confirmed with ?confirm=true", None),
        ),
        Err(err) => reject(err, session.is_some()),
    }
}

#[catch(404)]
fn not_found(req: &Request) -> Json<ApiResponse<String>> {
    ApiResponse::with(format!("404: '{}' route not found", req.uri()), None)
}

/// The HTTP application over `store`. JSON bodies may be up to 2 MiB so a
/// full-size image fits as a data URL.
pub fn build(store: SharedStore) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("limits", Limits::default().limit("json", 2.mebibytes())));

    rocket::custom(figment)
        .manage(store)
        .attach(Cors)
        .mount(
            "/",
            routes![
                all_options,
                get_all_listings,
                get_listing,
                create_listing,
                update_listing,
                delete_listing,
            ],
        )
        .register("/", catchers![not_found])
}
