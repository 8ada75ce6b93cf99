//! Platform-wide medicine moderation.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use tracing::{info, instrument, warn};

use medistore_core::MedicineId;

use crate::backend::{Credentials, Medicine};
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::SessionUser;
use crate::routes::{MessageQuery, redirect_error, redirect_success};
use crate::state::AppState;

const MEDICINES_PATH: &str = "/admin-dashboard/medicines";

/// All medicines template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/medicines.html")]
pub struct AdminMedicinesTemplate {
    pub user: SessionUser,
    pub medicines: Vec<Medicine>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Display every medicine across sellers.
#[instrument(skip(state, user, credentials, query), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    credentials: Credentials,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let medicines = state.backend().admin_medicines(&credentials).await?;

    Ok(AdminMedicinesTemplate {
        user,
        medicines,
        error: query.error,
        success: query.success,
    })
}

/// Take down a listing.
#[instrument(skip(state, user, credentials), fields(user_id = %user.id, medicine_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    credentials: Credentials,
    Path(id): Path<MedicineId>,
) -> Response {
    match state
        .backend()
        .admin_delete_medicine(&credentials, &id)
        .await
    {
        Ok(()) => {
            info!("Medicine taken down");
            redirect_success(MEDICINES_PATH, "Medicine removed")
        }
        Err(e) => {
            warn!(error = %e, "Medicine removal rejected");
            redirect_error(MEDICINES_PATH, &e.user_message())
        }
    }
}
