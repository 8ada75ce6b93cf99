//! User registry: list users and ban or reactivate them.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use medistore_core::{UserId, UserStatus};

use crate::backend::{Credentials, User};
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::SessionUser;
use crate::routes::{MessageQuery, redirect_error, redirect_success};
use crate::state::AppState;

const USERS_PATH: &str = "/admin-dashboard/users";

/// User registry template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/users.html")]
pub struct UsersTemplate {
    pub user: SessionUser,
    pub users: Vec<User>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Status toggle form data. Carries the status shown on the page.
#[derive(Debug, Deserialize)]
pub struct ToggleStatusForm {
    pub current: UserStatus,
}

/// Display every registered user.
#[instrument(skip(state, user, credentials, query), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    credentials: Credentials,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let users = state.backend().admin_users(&credentials).await?;

    Ok(UsersTemplate {
        user,
        users,
        error: query.error,
        success: query.success,
    })
}

/// Ban an active user or reactivate a banned one.
#[instrument(skip(state, admin, credentials, form), fields(admin_id = %admin.id, target_id = %id))]
pub async fn toggle_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    credentials: Credentials,
    Path(id): Path<UserId>,
    Form(form): Form<ToggleStatusForm>,
) -> Response {
    if id == admin.id {
        return redirect_error(USERS_PATH, "You cannot change your own status");
    }

    let next = form.current.toggled();
    match state
        .backend()
        .set_user_status(&credentials, &id, next)
        .await
    {
        Ok(()) => {
            info!(status = %next, "User status changed");
            let message = match next {
                UserStatus::Banned => "User banned",
                UserStatus::Active => "User reactivated",
            };
            redirect_success(USERS_PATH, message)
        }
        Err(e) => {
            warn!(error = %e, "User status change rejected");
            redirect_error(USERS_PATH, &e.user_message())
        }
    }
}
