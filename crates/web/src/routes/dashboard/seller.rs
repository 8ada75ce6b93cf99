//! Seller dashboard: inventory management and incoming orders.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use medistore_core::{CategoryId, MedicineId, OrderId, OrderStatus, Price};

use crate::backend::{Category, Credentials, Medicine, MedicineInput, Order};
use crate::error::AppError;
use crate::middleware::RequireSeller;
use crate::models::SessionUser;
use crate::routes::medicines::not_found_or;
use crate::routes::{MessageQuery, OrderRow, SelectOption, redirect_error, redirect_success};
use crate::state::AppState;

/// Stock level at or below which a listing is flagged.
pub const LOW_STOCK_THRESHOLD: u32 = 10;

/// Largest accepted image upload.
const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

const INVENTORY_PATH: &str = "/dashboard/inventory";
const SALES_PATH: &str = "/dashboard/sales";

// =============================================================================
// Views
// =============================================================================

/// Values for the create/edit medicine form.
pub struct MedicineFormView {
    pub action: String,
    pub heading: &'static str,
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: String,
    pub manufacturer: String,
    pub image: Option<String>,
    pub categories: Vec<SelectOption>,
}

impl MedicineFormView {
    fn blank(categories: &[Category]) -> Self {
        Self {
            action: INVENTORY_PATH.to_string(),
            heading: "New medicine",
            name: String::new(),
            description: String::new(),
            price: String::new(),
            stock: String::new(),
            manufacturer: String::new(),
            image: None,
            categories: category_options(categories, None),
        }
    }

    fn for_medicine(medicine: &Medicine, categories: &[Category]) -> Self {
        let selected = medicine
            .category_id
            .as_ref()
            .or_else(|| medicine.category.as_ref().map(|c| &c.id));
        Self {
            action: format!("{INVENTORY_PATH}/{}", medicine.id),
            heading: "Edit medicine",
            name: medicine.name.clone(),
            description: medicine.description.clone(),
            price: medicine.price.amount().to_string(),
            stock: medicine.stock.to_string(),
            manufacturer: medicine.manufacturer.clone(),
            image: medicine.image.clone(),
            categories: category_options(categories, selected),
        }
    }
}

fn category_options(categories: &[Category], selected: Option<&CategoryId>) -> Vec<SelectOption> {
    categories
        .iter()
        .map(|c| SelectOption::new(c.id.as_str(), c.name.as_str(), selected == Some(&c.id)))
        .collect()
}

// =============================================================================
// Templates
// =============================================================================

/// Seller overview template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/seller/overview.html")]
pub struct SellerOverviewTemplate {
    pub user: SessionUser,
    pub listing_count: usize,
    pub low_stock: Vec<Medicine>,
    pub pending_count: usize,
    pub revenue: String,
    pub recent_orders: Vec<Order>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Inventory list template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/seller/inventory.html")]
pub struct InventoryTemplate {
    pub user: SessionUser,
    pub medicines: Vec<Medicine>,
    pub low_stock_threshold: u32,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Create/edit medicine form template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/seller/medicine_form.html")]
pub struct MedicineFormTemplate {
    pub user: SessionUser,
    pub form: MedicineFormView,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Incoming orders template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/seller/sales.html")]
pub struct SalesTemplate {
    pub user: SessionUser,
    pub rows: Vec<OrderRow>,
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Multipart form
// =============================================================================

/// An image file attached to the medicine form.
#[derive(Debug)]
struct ImageUpload {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// Raw fields of the multipart medicine form.
#[derive(Debug, Default)]
struct MedicineFields {
    name: String,
    description: String,
    price: String,
    stock: String,
    manufacturer: String,
    category_id: String,
    image_url: String,
    upload: Option<ImageUpload>,
}

impl MedicineFields {
    /// Read every field of the form. Unknown fields are ignored.
    async fn read(mut multipart: Multipart) -> Result<Self, String> {
        let mut fields = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| e.body_text())? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if name == "image_file" {
                let file_name = field.file_name().unwrap_or("image").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(|e| e.body_text())?;

                if bytes.is_empty() {
                    continue;
                }
                if !content_type.starts_with("image/") {
                    return Err("Only image files can be uploaded".to_string());
                }
                if bytes.len() > MAX_IMAGE_BYTES {
                    return Err("Images must be 2 MB or smaller".to_string());
                }
                fields.upload = Some(ImageUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
                continue;
            }

            let value = field.text().await.map_err(|e| e.body_text())?;
            match name.as_str() {
                "name" => fields.name = value,
                "description" => fields.description = value,
                "price" => fields.price = value,
                "stock" => fields.stock = value,
                "manufacturer" => fields.manufacturer = value,
                "category_id" => fields.category_id = value,
                "image_url" => fields.image_url = value,
                other => debug!(field = other, "Ignoring unknown medicine form field"),
            }
        }

        Ok(fields)
    }

    /// Validate the text fields into a request body.
    fn to_input(&self, image: Option<String>) -> Result<MedicineInput, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Name is required".to_string());
        }

        let price = Decimal::from_str(self.price.trim())
            .ok()
            .filter(|p| *p > Decimal::ZERO)
            .ok_or("Price must be a positive amount")?;
        let stock = self
            .stock
            .trim()
            .parse::<u32>()
            .map_err(|_| "Stock must be a whole number")?;

        let category_id = self.category_id.trim();
        if category_id.is_empty() {
            return Err("Please choose a category".to_string());
        }

        Ok(MedicineInput {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            price: Price::new(price.round_dp(2)),
            stock,
            manufacturer: self.manufacturer.trim().to_string(),
            category_id: CategoryId::new(category_id),
            image: image.or_else(|| {
                Some(self.image_url.trim().to_string()).filter(|url| !url.is_empty())
            }),
        })
    }
}

/// Read the form, upload any attached image, and build the request body.
async fn medicine_input(
    state: &AppState,
    credentials: &Credentials,
    multipart: Multipart,
) -> Result<MedicineInput, String> {
    let mut fields = MedicineFields::read(multipart).await?;

    // Validate before uploading so a bad form does not orphan an image.
    fields.to_input(None)?;

    let image = match fields.upload.take() {
        Some(upload) => {
            let uploaded = state
                .backend()
                .upload_image(
                    credentials,
                    upload.file_name,
                    &upload.content_type,
                    upload.bytes,
                )
                .await
                .map_err(|e| {
                    warn!(error = %e, "Image upload failed");
                    e.user_message()
                })?;
            Some(uploaded.url)
        }
        None => None,
    };

    fields.to_input(image)
}

// =============================================================================
// Overview
// =============================================================================

/// Render the seller overview. Called from the role dispatch in
/// [`super::overview`].
pub(super) async fn overview(
    state: &AppState,
    user: SessionUser,
    credentials: &Credentials,
    query: MessageQuery,
) -> Result<Response, AppError> {
    let (medicines, orders) = tokio::join!(
        state.backend().seller_medicines(credentials),
        state.backend().seller_orders(credentials),
    );
    let medicines = medicines?;
    let orders = orders?;

    let revenue: Price = orders
        .iter()
        .filter(|o| o.status != OrderStatus::Cancelled)
        .map(|o| o.total_amount)
        .sum();

    Ok(SellerOverviewTemplate {
        user,
        listing_count: medicines.len(),
        low_stock: medicines
            .into_iter()
            .filter(|m| m.stock <= LOW_STOCK_THRESHOLD)
            .collect(),
        pending_count: orders
            .iter()
            .filter(|o| o.status == OrderStatus::Placed)
            .count(),
        revenue: revenue.display(),
        recent_orders: orders.into_iter().take(5).collect(),
        error: query.error,
        success: query.success,
    }
    .into_response())
}

// =============================================================================
// Inventory
// =============================================================================

/// Display the seller's medicines.
#[instrument(skip(state, user, credentials, query), fields(user_id = %user.id))]
pub async fn inventory(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    credentials: Credentials,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let medicines = state.backend().seller_medicines(&credentials).await?;

    Ok(InventoryTemplate {
        user,
        medicines,
        low_stock_threshold: LOW_STOCK_THRESHOLD,
        error: query.error,
        success: query.success,
    })
}

/// Display the new medicine form.
#[instrument(skip(state, user, query), fields(user_id = %user.id))]
pub async fn new_medicine(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let categories = state.backend().list_categories().await?;

    Ok(MedicineFormTemplate {
        user,
        form: MedicineFormView::blank(&categories),
        error: query.error,
        success: query.success,
    })
}

/// Create a medicine from the multipart form.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_medicine(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    credentials: Credentials,
    multipart: Multipart,
) -> Response {
    let back = format!("{INVENTORY_PATH}/new");

    let input = match medicine_input(&state, &credentials, multipart).await {
        Ok(input) => input,
        Err(message) => return redirect_error(&back, &message),
    };

    match state.backend().create_medicine(&credentials, &input).await {
        Ok(medicine) => {
            info!(medicine_id = %medicine.id, "Medicine listed");
            redirect_success(INVENTORY_PATH, &format!("{} listed", medicine.name))
        }
        Err(e) => {
            warn!(error = %e, "Medicine creation rejected");
            redirect_error(&back, &e.user_message())
        }
    }
}

/// Display the edit form for one of the seller's medicines.
#[instrument(skip(state, user, credentials, query), fields(user_id = %user.id))]
pub async fn edit_medicine(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    credentials: Credentials,
    Path(id): Path<MedicineId>,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (medicine, categories) = tokio::join!(
        state.backend().get_medicine(&credentials, &id),
        state.backend().list_categories(),
    );
    let medicine = medicine.map_err(|e| not_found_or(e, "medicine"))?;

    if medicine.seller_id.as_ref().is_some_and(|seller| *seller != user.id) {
        return Err(AppError::Forbidden("not your listing".to_string()));
    }

    Ok(MedicineFormTemplate {
        form: MedicineFormView::for_medicine(&medicine, &categories?),
        user,
        error: query.error,
        success: query.success,
    })
}

/// Update a medicine from the multipart form.
#[instrument(skip_all, fields(user_id = %user.id, medicine_id = %id))]
pub async fn update_medicine(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    credentials: Credentials,
    Path(id): Path<MedicineId>,
    multipart: Multipart,
) -> Response {
    let back = format!("{INVENTORY_PATH}/{id}/edit");

    let input = match medicine_input(&state, &credentials, multipart).await {
        Ok(input) => input,
        Err(message) => return redirect_error(&back, &message),
    };

    match state.backend().update_medicine(&credentials, &id, &input).await {
        Ok(medicine) => {
            info!("Medicine updated");
            redirect_success(INVENTORY_PATH, &format!("{} updated", medicine.name))
        }
        Err(e) => {
            warn!(error = %e, "Medicine update rejected");
            redirect_error(&back, &e.user_message())
        }
    }
}

/// Remove one of the seller's medicines.
#[instrument(skip(state, user, credentials), fields(user_id = %user.id, medicine_id = %id))]
pub async fn delete_medicine(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    credentials: Credentials,
    Path(id): Path<MedicineId>,
) -> Response {
    match state.backend().delete_medicine(&credentials, &id).await {
        Ok(()) => {
            info!("Medicine removed");
            redirect_success(INVENTORY_PATH, "Medicine removed")
        }
        Err(e) => {
            warn!(error = %e, "Medicine removal rejected");
            redirect_error(INVENTORY_PATH, &e.user_message())
        }
    }
}

// =============================================================================
// Sales
// =============================================================================

/// Order status form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: OrderStatus,
}

/// Display orders containing the seller's medicines.
#[instrument(skip(state, user, credentials, query), fields(user_id = %user.id))]
pub async fn sales(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    credentials: Credentials,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let orders = state.backend().seller_orders(&credentials).await?;

    Ok(SalesTemplate {
        user,
        rows: orders.into_iter().map(OrderRow::from).collect(),
        error: query.error,
        success: query.success,
    })
}

/// Move one of the seller's orders to a new status.
#[instrument(skip(state, user, credentials, form), fields(user_id = %user.id, order_id = %id, status = %form.status))]
pub async fn update_order_status(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    credentials: Credentials,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Response {
    match state
        .backend()
        .update_seller_order_status(&credentials, &id, form.status)
        .await
    {
        Ok(()) => {
            info!("Order status updated");
            redirect_success(
                SALES_PATH,
                &format!("Order marked {}", form.status.label().to_lowercase()),
            )
        }
        Err(e) => {
            warn!(error = %e, "Order status update rejected");
            redirect_error(SALES_PATH, &e.user_message())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fields() -> MedicineFields {
        MedicineFields {
            name: " Omeprazole 20mg ".to_string(),
            description: "Acid reducer".to_string(),
            price: "3.499".to_string(),
            stock: "25".to_string(),
            manufacturer: "Square".to_string(),
            category_id: "c1".to_string(),
            image_url: String::new(),
            upload: None,
        }
    }

    #[test]
    fn test_medicine_fields_to_input() {
        let input = fields().to_input(None).unwrap();
        assert_eq!(input.name, "Omeprazole 20mg");
        assert_eq!(input.price, Price::from_cents(350));
        assert_eq!(input.stock, 25);
        assert_eq!(input.image, None);

        let input = fields()
            .to_input(Some("https://cdn.example/a.png".to_string()))
            .unwrap();
        assert_eq!(input.image.as_deref(), Some("https://cdn.example/a.png"));
    }

    #[test]
    fn test_medicine_fields_keep_existing_image_url() {
        let mut f = fields();
        f.image_url = "https://cdn.example/old.png".to_string();
        assert_eq!(
            f.to_input(None).unwrap().image.as_deref(),
            Some("https://cdn.example/old.png")
        );
    }

    #[test]
    fn test_medicine_fields_validation() {
        let mut f = fields();
        f.price = "0".to_string();
        assert_eq!(f.to_input(None).unwrap_err(), "Price must be a positive amount");

        let mut f = fields();
        f.stock = "-1".to_string();
        assert!(f.to_input(None).is_err());

        let mut f = fields();
        f.category_id = " ".to_string();
        assert_eq!(f.to_input(None).unwrap_err(), "Please choose a category");
    }
}
