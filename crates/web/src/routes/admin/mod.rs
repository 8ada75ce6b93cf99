//! Admin dashboard route handlers.
//!
//! Everything under `/admin-dashboard` requires the `ADMIN` role via
//! [`RequireAdmin`](crate::middleware::RequireAdmin).

pub mod categories;
pub mod medicines;
pub mod orders;
pub mod users;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use tracing::instrument;

use medistore_core::{OrderStatus, Price, Role};

use crate::backend::{Credentials, Order};
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::SessionUser;
use crate::routes::MessageQuery;
use crate::state::AppState;

/// Platform-wide counts for the overview.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PlatformStats {
    pub customers: usize,
    pub sellers: usize,
    pub banned: usize,
    pub orders: usize,
    pub open_orders: usize,
    pub medicines: usize,
    pub out_of_stock: usize,
    pub categories: usize,
    pub revenue: String,
}

/// Admin overview template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/overview.html")]
pub struct AdminOverviewTemplate {
    pub user: SessionUser,
    pub stats: PlatformStats,
    pub recent_orders: Vec<Order>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Sum of every order that was not cancelled.
fn revenue(orders: &[Order]) -> Price {
    orders
        .iter()
        .filter(|o| o.status != OrderStatus::Cancelled)
        .map(|o| o.total_amount)
        .sum()
}

/// Display the platform overview.
#[instrument(skip(state, user, credentials, query), fields(user_id = %user.id))]
pub async fn overview(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    credentials: Credentials,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let backend = state.backend();
    let (users, orders, medicines, categories) = tokio::join!(
        backend.admin_users(&credentials),
        backend.admin_orders(&credentials),
        backend.admin_medicines(&credentials),
        backend.list_categories(),
    );
    let (users, orders, medicines, categories) = (users?, orders?, medicines?, categories?);

    let stats = PlatformStats {
        customers: users.iter().filter(|u| u.role == Role::Customer).count(),
        sellers: users.iter().filter(|u| u.role == Role::Seller).count(),
        banned: users.iter().filter(|u| u.is_banned()).count(),
        orders: orders.len(),
        open_orders: orders.iter().filter(|o| !o.status.is_final()).count(),
        medicines: medicines.len(),
        out_of_stock: medicines.iter().filter(|m| !m.in_stock()).count(),
        categories: categories.len(),
        revenue: revenue(&orders).display(),
    };

    Ok(AdminOverviewTemplate {
        user,
        stats,
        recent_orders: orders.into_iter().take(5).collect(),
        error: query.error,
        success: query.success,
    })
}
