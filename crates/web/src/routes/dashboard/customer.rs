//! Customer dashboard: order history, order detail and cancellation.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use tracing::{info, instrument, warn};

use medistore_core::OrderId;

use crate::backend::{Credentials, Order};
use crate::error::AppError;
use crate::middleware::RequireCustomer;
use crate::models::SessionUser;
use crate::routes::medicines::not_found_or;
use crate::routes::{MessageQuery, redirect_error, redirect_success};
use crate::state::AppState;

/// Orders shown on the overview.
const RECENT_ORDERS: usize = 5;

/// Customer overview template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/customer/overview.html")]
pub struct CustomerOverviewTemplate {
    pub user: SessionUser,
    /// Most recent orders only
    pub orders: Vec<Order>,
    pub order_count: usize,
    pub open_count: usize,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/customer/orders.html")]
pub struct OrdersTemplate {
    pub user: SessionUser,
    pub orders: Vec<Order>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/customer/order.html")]
pub struct OrderTemplate {
    pub user: SessionUser,
    pub order: Order,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Render the customer overview. Called from the role dispatch in
/// [`super::overview`].
pub(super) async fn overview(
    state: &AppState,
    user: SessionUser,
    credentials: &Credentials,
    query: MessageQuery,
) -> Result<Response, AppError> {
    let orders = state.backend().my_orders(credentials).await?;
    let open_count = orders.iter().filter(|o| !o.status.is_final()).count();

    Ok(CustomerOverviewTemplate {
        user,
        order_count: orders.len(),
        open_count,
        orders: orders.into_iter().take(RECENT_ORDERS).collect(),
        error: query.error,
        success: query.success,
    }
    .into_response())
}

/// Display the customer's order history.
#[instrument(skip(state, user, credentials, query), fields(user_id = %user.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireCustomer(user): RequireCustomer,
    credentials: Credentials,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let orders = state.backend().my_orders(&credentials).await?;

    Ok(OrdersTemplate {
        user,
        orders,
        error: query.error,
        success: query.success,
    })
}

/// Display a single order.
#[instrument(skip(state, user, credentials, query), fields(user_id = %user.id))]
pub async fn order(
    State(state): State<AppState>,
    RequireCustomer(user): RequireCustomer,
    credentials: Credentials,
    Path(id): Path<OrderId>,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let order = state
        .backend()
        .get_order(&credentials, &id)
        .await
        .map_err(|e| not_found_or(e, "order"))?;

    Ok(OrderTemplate {
        user,
        order,
        error: query.error,
        success: query.success,
    })
}

/// Cancel an order that has not started processing.
#[instrument(skip(state, user, credentials), fields(user_id = %user.id, order_id = %id))]
pub async fn cancel_order(
    State(state): State<AppState>,
    RequireCustomer(user): RequireCustomer,
    credentials: Credentials,
    Path(id): Path<OrderId>,
) -> Response {
    let back = format!("/dashboard/orders/{id}");

    match state.backend().cancel_order(&credentials, &id).await {
        Ok(()) => {
            info!("Order cancelled by customer");
            redirect_success(&back, "Order cancelled")
        }
        Err(e) => {
            warn!(error = %e, "Order cancellation rejected");
            redirect_error(&back, &e.user_message())
        }
    }
}
