//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself lives in the visitor's session (see
//! [`crate::services::cart`]); every mutation is persisted before the
//! fragment is rendered.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{instrument, warn};

use medistore_core::{CartItem, MedicineId};

use crate::backend::Credentials;
use crate::routes::{MessageQuery, redirect_error};
use crate::services::cart::{CartStorage, CartStore, SessionCart};
use crate::state::AppState;

/// HTMX event fired after any cart mutation.
pub const CART_UPDATED_TRIGGER: (&str, &str) = ("HX-Trigger", "cart-updated");

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub total: String,
    pub count: u32,
}

impl<S: CartStorage> From<&CartStore<S>> for CartView {
    fn from(store: &CartStore<S>) -> Self {
        Self {
            items: store.items().to_vec(),
            total: store.total_price().display(),
            count: store.cart_count(),
        }
    }
}

/// Whether the request was issued by HTMX.
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
///
/// Only the medicine id and quantity are taken from the form; name, price
/// and stock come from the backend.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub id: MedicineId,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub id: MedicineId,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub id: MedicineId,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(cart))]
pub async fn show(cart: SessionCart, Query(query): Query<MessageQuery>) -> impl IntoResponse {
    CartShowTemplate {
        cart: CartView::from(&cart),
        error: query.error,
        success: query.success,
    }
}

/// Add item to cart (HTMX).
///
/// The medicine is looked up on the backend so the stored price and the
/// stock cap are the real ones. Returns the count badge with an HTMX trigger
/// so other cart widgets refresh. Plain form posts are redirected to the
/// cart page.
#[instrument(skip(state, credentials, cart, headers, form), fields(medicine_id = %form.id))]
pub async fn add(
    State(state): State<AppState>,
    credentials: Credentials,
    mut cart: SessionCart,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let medicine = match state.backend().get_medicine(&credentials, &form.id).await {
        Ok(medicine) => medicine,
        Err(e) => {
            warn!(error = %e, "Could not look up medicine for cart");
            if is_htmx(&headers) {
                let status = e.status().unwrap_or(StatusCode::BAD_GATEWAY);
                return (status, e.user_message()).into_response();
            }
            return redirect_error("/cart", &e.user_message());
        }
    };

    if medicine.stock == 0 {
        return if is_htmx(&headers) {
            (StatusCode::CONFLICT, "Out of stock").into_response()
        } else {
            redirect_error("/cart", &format!("{} is out of stock", medicine.name))
        };
    }

    let quantity = form.quantity.unwrap_or(1);
    cart.add_to_cart(&medicine.summary(), quantity).await;

    if !is_htmx(&headers) {
        return Redirect::to("/cart").into_response();
    }

    (
        AppendHeaders([CART_UPDATED_TRIGGER]),
        CartCountTemplate {
            count: cart.cart_count(),
        },
    )
        .into_response()
}

/// Update cart item quantity (HTMX).
#[instrument(skip(cart, form), fields(medicine_id = %form.id, quantity = form.quantity))]
pub async fn update(mut cart: SessionCart, Form(form): Form<UpdateCartForm>) -> Response {
    cart.update_quantity(&form.id, form.quantity).await;

    (
        AppendHeaders([CART_UPDATED_TRIGGER]),
        CartItemsTemplate {
            cart: CartView::from(&cart),
        },
    )
        .into_response()
}

/// Remove item from cart (HTMX).
#[instrument(skip(cart, form), fields(medicine_id = %form.id))]
pub async fn remove(mut cart: SessionCart, Form(form): Form<RemoveFromCartForm>) -> Response {
    cart.remove_from_cart(&form.id).await;

    (
        AppendHeaders([CART_UPDATED_TRIGGER]),
        CartItemsTemplate {
            cart: CartView::from(&cart),
        },
    )
        .into_response()
}

/// Empty the cart.
#[instrument(skip(cart))]
pub async fn clear(mut cart: SessionCart) -> Response {
    cart.clear_cart().await;
    Redirect::to("/cart").into_response()
}

/// Get cart count badge (HTMX).
#[instrument(skip(cart))]
pub async fn count(cart: SessionCart) -> impl IntoResponse {
    CartCountTemplate {
        count: cart.cart_count(),
    }
}
