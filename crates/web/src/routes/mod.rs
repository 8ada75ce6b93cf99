//! HTTP route handlers for the web frontend.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Health check
//! GET  /health/ready           - Readiness (backend reachable)
//!
//! # Catalog
//! GET  /shop                   - Filterable medicine listing
//! GET  /shop/{id}              - Medicine detail with reviews
//! POST /shop/{id}/reviews      - Post a review
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! POST /cart/clear             - Empty the cart
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout
//! GET  /checkout               - Shipping form (requires session)
//! POST /checkout               - Place order
//!
//! # Auth
//! GET  /login, POST /login     - Sign in
//! GET  /register, POST /register - Sign up
//! POST /logout                 - Sign out
//! GET  /verify-email           - Email verification notice / link handler
//! ANY  /api/auth/{*path}       - Auth service proxy
//!
//! # Dashboard (customer or seller, guarded)
//! GET  /dashboard                          - Overview for the user's role
//! GET  /dashboard/profile                  - Account details
//! GET  /dashboard/orders                   - Customer order history
//! GET  /dashboard/orders/{id}              - Order detail
//! POST /dashboard/orders/{id}/cancel       - Cancel a placed order
//! GET  /dashboard/inventory                - Seller inventory
//! GET  /dashboard/inventory/new            - New medicine form
//! POST /dashboard/inventory                - Create medicine (multipart)
//! GET  /dashboard/inventory/{id}/edit      - Edit medicine form
//! POST /dashboard/inventory/{id}           - Update medicine (multipart)
//! POST /dashboard/inventory/{id}/delete    - Delete medicine
//! GET  /dashboard/sales                    - Orders for the seller's medicines
//! POST /dashboard/sales/{id}/status        - Update order status
//!
//! # Admin dashboard (admin only, guarded)
//! GET  /admin-dashboard                    - Platform overview
//! GET  /admin-dashboard/users              - User registry
//! POST /admin-dashboard/users/{id}/status  - Ban / reactivate
//! GET  /admin-dashboard/categories         - Categories
//! POST /admin-dashboard/categories         - Create category
//! POST /admin-dashboard/categories/{id}    - Update category
//! POST /admin-dashboard/categories/{id}/delete - Delete category
//! GET  /admin-dashboard/orders             - All orders
//! POST /admin-dashboard/orders/{id}/status - Update order status
//! GET  /admin-dashboard/medicines          - All medicines
//! POST /admin-dashboard/medicines/{id}/delete - Take down a medicine
//! ```

pub mod admin;
pub mod api;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod dashboard;
pub mod home;
pub mod medicines;

use axum::{
    Router,
    response::{IntoResponse, Redirect, Response},
    routing::{any, get, post},
};
use serde::Deserialize;

use medistore_core::OrderStatus;

use crate::backend::Order;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

// =============================================================================
// Shared view helpers
// =============================================================================

/// Query parameters for error/success banners after a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// An `<option>` in a rendered `<select>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>, selected: bool) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            selected,
        }
    }
}

/// Status choices for an order, with `current` preselected.
#[must_use]
pub fn status_options(current: OrderStatus) -> Vec<SelectOption> {
    OrderStatus::ALL
        .into_iter()
        .map(|status| SelectOption::new(status.as_str(), status.label(), status == current))
        .collect()
}

/// An order with its status picker, for seller and admin order lists.
pub struct OrderRow {
    pub order: Order,
    pub status_options: Vec<SelectOption>,
}

impl From<Order> for OrderRow {
    fn from(order: Order) -> Self {
        Self {
            status_options: status_options(order.status),
            order,
        }
    }
}

/// Redirect to `path` with a banner message in the query string.
#[must_use]
pub fn redirect_with(path: &str, key: &str, message: &str) -> Response {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair(key, message);
    let separator = if path.contains('?') { '&' } else { '?' };
    Redirect::to(&format!("{path}{separator}{}", query.finish())).into_response()
}

/// Redirect with an `error` banner.
#[must_use]
pub fn redirect_error(path: &str, message: &str) -> Response {
    redirect_with(path, "error", message)
}

/// Redirect with a `success` banner.
#[must_use]
pub fn redirect_success(path: &str, message: &str) -> Response {
    redirect_with(path, "success", message)
}

// =============================================================================
// Routers
// =============================================================================

/// Create the auth routes router.
///
/// Form posts are rate limited per client IP.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/logout", post(auth::logout))
        .route("/verify-email", get(auth::verify_email))
        .merge(limited)
}

/// Create the shop routes router.
pub fn shop_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(medicines::index))
        .route("/{id}", get(medicines::show))
        .route("/{id}/reviews", post(medicines::create_review))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the customer/seller dashboard router.
pub fn dashboard_routes() -> Router<AppState> {
    use dashboard::{customer, seller};

    Router::new()
        .route("/", get(dashboard::overview))
        .route("/profile", get(dashboard::profile))
        // Customer
        .route("/orders", get(customer::orders))
        .route("/orders/{id}", get(customer::order))
        .route("/orders/{id}/cancel", post(customer::cancel_order))
        // Seller
        .route(
            "/inventory",
            get(seller::inventory).post(seller::create_medicine),
        )
        .route("/inventory/new", get(seller::new_medicine))
        .route("/inventory/{id}", post(seller::update_medicine))
        .route("/inventory/{id}/edit", get(seller::edit_medicine))
        .route("/inventory/{id}/delete", post(seller::delete_medicine))
        .route("/sales", get(seller::sales))
        .route("/sales/{id}/status", post(seller::update_order_status))
}

/// Create the admin dashboard router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::overview))
        .route("/users", get(admin::users::index))
        .route("/users/{id}/status", post(admin::users::toggle_status))
        .route(
            "/categories",
            get(admin::categories::index).post(admin::categories::create),
        )
        .route("/categories/{id}", post(admin::categories::update))
        .route("/categories/{id}/delete", post(admin::categories::delete))
        .route("/orders", get(admin::orders::index))
        .route("/orders/{id}/status", post(admin::orders::update_status))
        .route("/medicines", get(admin::medicines::index))
        .route("/medicines/{id}/delete", post(admin::medicines::delete))
}

/// Create all page and API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/shop", shop_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", get(checkout::show).post(checkout::place_order))
        .merge(auth_routes())
        .nest("/dashboard", dashboard_routes())
        .nest("/admin-dashboard", admin_routes())
        .route("/api/auth/{*path}", any(api::proxy::proxy))
}
