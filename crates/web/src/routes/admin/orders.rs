//! Platform-wide order management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use medistore_core::{OrderId, OrderStatus};

use crate::backend::Credentials;
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::SessionUser;
use crate::routes::{OrderRow, SelectOption, redirect_error, redirect_success};
use crate::state::AppState;

const ORDERS_PATH: &str = "/admin-dashboard/orders";

/// Order list query: optional status filter plus banners.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// All orders template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/orders.html")]
pub struct AdminOrdersTemplate {
    pub user: SessionUser,
    pub rows: Vec<OrderRow>,
    pub filters: Vec<SelectOption>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Status form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: OrderStatus,
}

fn status_filters(selected: Option<OrderStatus>) -> Vec<SelectOption> {
    OrderStatus::ALL
        .into_iter()
        .map(|status| SelectOption::new(status.as_str(), status.label(), selected == Some(status)))
        .collect()
}

/// Display every order, optionally filtered by status.
#[instrument(skip(state, user, credentials), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    credentials: Credentials,
    Query(query): Query<OrdersQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<OrderStatus>().ok());

    let orders = state.backend().admin_orders(&credentials).await?;

    Ok(AdminOrdersTemplate {
        user,
        rows: orders
            .into_iter()
            .filter(|o| filter.is_none_or(|status| o.status == status))
            .map(OrderRow::from)
            .collect(),
        filters: status_filters(filter),
        error: query.error,
        success: query.success,
    })
}

/// Move any order to a new status.
#[instrument(skip(state, user, credentials, form), fields(user_id = %user.id, order_id = %id, status = %form.status))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    credentials: Credentials,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Response {
    match state
        .backend()
        .update_order_status(&credentials, &id, form.status)
        .await
    {
        Ok(()) => {
            info!("Order status updated by admin");
            redirect_success(ORDERS_PATH, &format!("Order #{id} updated"))
        }
        Err(e) => {
            warn!(error = %e, "Order status update rejected");
            redirect_error(ORDERS_PATH, &e.user_message())
        }
    }
}
