//! Checkout route handlers.
//!
//! Orders are placed straight from the session cart. The cart is only
//! cleared once the backend has accepted the order.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use medistore_core::Role;

use crate::backend::{CreateOrderInput, Credentials, OrderLineInput};
use crate::error::add_breadcrumb;
use crate::middleware::RequireUser;
use crate::models::SessionUser;
use crate::routes::cart::CartView;
use crate::routes::{MessageQuery, redirect_error, redirect_success};
use crate::services::cart::{CartStorage, CartStore, SessionCart};
use crate::state::AppState;

/// Shortest shipping address accepted.
const MIN_ADDRESS_LENGTH: usize = 10;

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub user: SessionUser,
    pub cart: CartView,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Checkout form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub shipping_address: String,
}

/// Why a visitor cannot check out right now.
fn checkout_blocker<S: CartStorage>(
    user: &SessionUser,
    cart: &CartStore<S>,
) -> Option<&'static str> {
    if user.role != Role::Customer {
        return Some("Only customer accounts can place orders");
    }
    if cart.is_empty() {
        return Some("Your cart is empty");
    }
    None
}

/// Display the checkout form.
#[instrument(skip(user, cart), fields(user_id = %user.id))]
pub async fn show(
    RequireUser(user): RequireUser,
    cart: SessionCart,
    Query(query): Query<MessageQuery>,
) -> Response {
    if let Some(reason) = checkout_blocker(&user, &cart) {
        return redirect_error("/cart", reason);
    }

    CheckoutTemplate {
        cart: CartView::from(&cart),
        user,
        error: query.error,
        success: query.success,
    }
    .into_response()
}

/// Place an order for everything in the cart.
#[instrument(skip(state, user, cart, credentials, form), fields(user_id = %user.id))]
pub async fn place_order(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    mut cart: SessionCart,
    credentials: Credentials,
    Form(form): Form<CheckoutForm>,
) -> Response {
    if let Some(reason) = checkout_blocker(&user, &cart) {
        return redirect_error("/cart", reason);
    }

    let shipping_address = form.shipping_address.trim().to_string();
    if shipping_address.chars().count() < MIN_ADDRESS_LENGTH {
        return redirect_error("/checkout", "Please enter a full shipping address");
    }

    let input = CreateOrderInput {
        items: cart
            .items()
            .iter()
            .map(|item| OrderLineInput {
                medicine_id: item.id.clone(),
                quantity: item.quantity,
            })
            .collect(),
        shipping_address,
    };

    match state.backend().create_order(&credentials, &input).await {
        Ok(order) => {
            cart.clear_cart().await;
            info!(order_id = %order.id, total = %order.total_amount, "Order placed");
            add_breadcrumb(
                "checkout",
                "Order placed",
                Some(&[("order_id", order.id.as_str())]),
            );
            redirect_success(
                &format!("/dashboard/orders/{}", order.id),
                "Order placed, thank you",
            )
        }
        Err(e) => {
            warn!(error = %e, "Order rejected");
            redirect_error("/checkout", &e.user_message())
        }
    }
}

#[cfg(test)]
mod tests {
    use medistore_core::{MedicineId, Price, ProductSummary, UserId, UserStatus};

    use super::*;
    use crate::services::cart::MemoryCartStorage;

    fn user(role: Role) -> SessionUser {
        SessionUser {
            id: UserId::new("u1"),
            name: "Nadia".to_string(),
            email: "nadia@example.com".to_string(),
            role,
            status: UserStatus::Active,
            email_verified: true,
            image: None,
        }
    }

    #[tokio::test]
    async fn test_checkout_blocker() {
        let mut cart = CartStore::load(MemoryCartStorage::new()).await;
        assert_eq!(
            checkout_blocker(&user(Role::Customer), &cart),
            Some("Your cart is empty")
        );

        let product = ProductSummary {
            id: MedicineId::new("m1"),
            name: "Cetirizine".to_string(),
            price: Price::from_cents(450),
            image: None,
            stock: 10,
        };
        cart.add_to_cart(&product, 1).await;
        assert_eq!(checkout_blocker(&user(Role::Customer), &cart), None);
        assert!(checkout_blocker(&user(Role::Seller), &cart).is_some());
    }
}
