//! Customer and seller dashboard route handlers.
//!
//! Everything under `/dashboard` is behind the route guard. The handlers then
//! confirm the session and role through the extractors in
//! [`crate::middleware::auth`]; admins are sent to `/admin-dashboard`.

pub mod customer;
pub mod seller;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use medistore_core::Role;

use crate::backend::Credentials;
use crate::error::AppError;
use crate::middleware::{RequireMember, RequireUser};
use crate::models::SessionUser;
use crate::routes::MessageQuery;
use crate::state::AppState;

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/profile.html")]
pub struct ProfileTemplate {
    pub user: SessionUser,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Dashboard landing page for whichever role the user holds.
#[instrument(skip(state, user, credentials, query), fields(user_id = %user.id, role = %user.role))]
pub async fn overview(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    credentials: Credentials,
    Query(query): Query<MessageQuery>,
) -> Result<Response, AppError> {
    match user.role {
        Role::Admin => Ok(Redirect::to(Role::Admin.home_path()).into_response()),
        Role::Seller => seller::overview(&state, user, &credentials, query).await,
        Role::Customer => customer::overview(&state, user, &credentials, query).await,
    }
}

/// Account details.
#[instrument(skip(user, query), fields(user_id = %user.id))]
pub async fn profile(
    RequireMember(user): RequireMember,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    ProfileTemplate {
        user,
        error: query.error,
        success: query.success,
    }
}
