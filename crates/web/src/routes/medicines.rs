//! Shop route handlers: the filterable listing, medicine detail and reviews.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{instrument, warn};

use medistore_core::MedicineId;

use crate::backend::{BackendError, Category, Credentials, Medicine, MedicineFilter, ReviewInput};
use crate::error::AppError;
use crate::middleware::{OptionalUser, login_redirect};
use crate::routes::{MessageQuery, SelectOption, redirect_error, redirect_success};
use crate::state::AppState;

/// Page size for the shop listing.
pub const PAGE_SIZE: u32 = 12;

/// Sort choices offered on the listing, as `(value, label)`.
const SORT_OPTIONS: [(&str, &str); 4] = [
    ("newest", "Newest"),
    ("price_asc", "Price: low to high"),
    ("price_desc", "Price: high to low"),
    ("name", "Name"),
];

// =============================================================================
// Listing
// =============================================================================

/// Shop listing template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/index.html")]
pub struct ShopTemplate {
    pub medicines: Vec<Medicine>,
    pub filter: MedicineFilter,
    pub category_options: Vec<SelectOption>,
    pub sort_options: Vec<SelectOption>,
    pub page: u32,
    pub prev_link: Option<String>,
    pub next_link: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl ShopTemplate {
    /// Current value of a free-text filter field, for re-filling the form.
    fn field(value: Option<&String>) -> String {
        value.cloned().unwrap_or_default()
    }

    pub fn search_value(&self) -> String {
        Self::field(self.filter.search.as_ref())
    }

    pub fn manufacturer_value(&self) -> String {
        Self::field(self.filter.manufacturer.as_ref())
    }

    pub fn min_price_value(&self) -> String {
        Self::field(self.filter.min_price.as_ref())
    }

    pub fn max_price_value(&self) -> String {
        Self::field(self.filter.max_price.as_ref())
    }
}

/// Listing URL for `filter` at `page`.
fn page_link(filter: &MedicineFilter, page: u32) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    let fields = [
        ("search", filter.search.as_deref()),
        ("category", filter.category.as_deref()),
        ("manufacturer", filter.manufacturer.as_deref()),
        ("minPrice", filter.min_price.as_deref()),
        ("maxPrice", filter.max_price.as_deref()),
        ("sort", filter.sort.as_deref()),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            query.append_pair(key, value);
        }
    }
    query.append_pair("page", &page.to_string());
    format!("/shop?{}", query.finish())
}

fn category_options(categories: &[Category], selected: Option<&str>) -> Vec<SelectOption> {
    categories
        .iter()
        .map(|c| SelectOption::new(c.id.as_str(), c.name.as_str(), selected == Some(c.id.as_str())))
        .collect()
}

fn sort_options(selected: Option<&str>) -> Vec<SelectOption> {
    SORT_OPTIONS
        .into_iter()
        .map(|(value, label)| SelectOption::new(value, label, selected == Some(value)))
        .collect()
}

/// Display the filterable medicine listing.
#[instrument(skip(state, credentials))]
pub async fn index(
    State(state): State<AppState>,
    credentials: Credentials,
    Query(filter): Query<MedicineFilter>,
) -> impl IntoResponse {
    let page = filter.page.unwrap_or(1).max(1);
    let filter = MedicineFilter {
        page: Some(page),
        limit: Some(PAGE_SIZE),
        ..filter
    }
    .normalized();

    let (medicines, categories) = tokio::join!(
        state.backend().list_medicines(&credentials, &filter),
        state.backend().list_categories(),
    );

    let mut error = None;
    let medicines = medicines.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load medicines");
        error = Some(e.user_message());
        Vec::new()
    });
    let categories = categories.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load categories");
        Vec::new()
    });

    let has_next = u32::try_from(medicines.len()).is_ok_and(|n| n >= PAGE_SIZE);

    ShopTemplate {
        category_options: category_options(&categories, filter.category.as_deref()),
        sort_options: sort_options(filter.sort.as_deref()),
        prev_link: (page > 1).then(|| page_link(&filter, page - 1)),
        next_link: has_next.then(|| page_link(&filter, page + 1)),
        page,
        medicines,
        filter,
        error,
        success: None,
    }
}

// =============================================================================
// Detail
// =============================================================================

/// Medicine detail template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/show.html")]
pub struct MedicineTemplate {
    pub medicine: Medicine,
    pub rating: Option<String>,
    pub signed_in: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Map a backend 404 to a page-level not found.
pub(crate) fn not_found_or(err: BackendError, what: &str) -> AppError {
    if err.status() == Some(StatusCode::NOT_FOUND) {
        AppError::NotFound(what.to_string())
    } else {
        AppError::Backend(err)
    }
}

/// Display a medicine with its reviews.
#[instrument(skip(state, credentials, user))]
pub async fn show(
    State(state): State<AppState>,
    credentials: Credentials,
    OptionalUser(user): OptionalUser,
    Path(id): Path<MedicineId>,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let medicine = state
        .backend()
        .get_medicine(&credentials, &id)
        .await
        .map_err(|e| not_found_or(e, "medicine"))?;

    Ok(MedicineTemplate {
        rating: medicine.average_rating().map(|r| format!("{r:.1}")),
        medicine,
        signed_in: user.is_some(),
        error: query.error,
        success: query.success,
    })
}

// =============================================================================
// Reviews
// =============================================================================

/// Review form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: u8,
    pub comment: Option<String>,
}

/// Post a review for a medicine.
#[instrument(skip(state, credentials, user, form), fields(medicine_id = %id))]
pub async fn create_review(
    State(state): State<AppState>,
    credentials: Credentials,
    OptionalUser(user): OptionalUser,
    Path(id): Path<MedicineId>,
    Form(form): Form<ReviewForm>,
) -> Response {
    let back = format!("/shop/{id}");

    if user.is_none() {
        return Redirect::to(&login_redirect(&back)).into_response();
    }
    if !(1..=5).contains(&form.rating) {
        return redirect_error(&back, "Rating must be between 1 and 5");
    }

    let input = ReviewInput {
        medicine_id: id,
        rating: form.rating,
        comment: form
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
    };

    match state.backend().create_review(&credentials, &input).await {
        Ok(_) => redirect_success(&back, "Thanks for your review"),
        Err(e) => {
            warn!(error = %e, "Failed to post review");
            redirect_error(&back, &e.user_message())
        }
    }
}
