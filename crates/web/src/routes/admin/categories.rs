//! Category management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use medistore_core::CategoryId;

use crate::backend::{Category, CategoryInput, Credentials};
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::SessionUser;
use crate::routes::{MessageQuery, redirect_error, redirect_success};
use crate::state::AppState;

const CATEGORIES_PATH: &str = "/admin-dashboard/categories";

/// Categories template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/categories.html")]
pub struct CategoriesTemplate {
    pub user: SessionUser,
    pub categories: Vec<Category>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Create/rename form data.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    pub description: Option<String>,
}

impl CategoryForm {
    fn to_input(&self) -> Result<CategoryInput, &'static str> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Category name is required");
        }
        Ok(CategoryInput {
            name: name.to_string(),
            description: self
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from),
        })
    }
}

/// Display every category.
#[instrument(skip(state, user, query), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let categories = state.backend().list_categories().await?;

    Ok(CategoriesTemplate {
        user,
        categories,
        error: query.error,
        success: query.success,
    })
}

/// Create a category.
#[instrument(skip(state, user, credentials, form), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    credentials: Credentials,
    Form(form): Form<CategoryForm>,
) -> Response {
    let input = match form.to_input() {
        Ok(input) => input,
        Err(message) => return redirect_error(CATEGORIES_PATH, message),
    };

    match state.backend().create_category(&credentials, &input).await {
        Ok(category) => {
            info!(category_id = %category.id, "Category created");
            redirect_success(CATEGORIES_PATH, &format!("{} created", category.name))
        }
        Err(e) => {
            warn!(error = %e, "Category creation rejected");
            redirect_error(CATEGORIES_PATH, &e.user_message())
        }
    }
}

/// Rename or re-describe a category.
#[instrument(skip(state, user, credentials, form), fields(user_id = %user.id, category_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    credentials: Credentials,
    Path(id): Path<CategoryId>,
    Form(form): Form<CategoryForm>,
) -> Response {
    let input = match form.to_input() {
        Ok(input) => input,
        Err(message) => return redirect_error(CATEGORIES_PATH, message),
    };

    match state
        .backend()
        .update_category(&credentials, &id, &input)
        .await
    {
        Ok(category) => {
            info!("Category updated");
            redirect_success(CATEGORIES_PATH, &format!("{} updated", category.name))
        }
        Err(e) => {
            warn!(error = %e, "Category update rejected");
            redirect_error(CATEGORIES_PATH, &e.user_message())
        }
    }
}

/// Delete a category.
#[instrument(skip(state, user, credentials), fields(user_id = %user.id, category_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    credentials: Credentials,
    Path(id): Path<CategoryId>,
) -> Response {
    match state.backend().delete_category(&credentials, &id).await {
        Ok(()) => {
            info!("Category deleted");
            redirect_success(CATEGORIES_PATH, "Category deleted")
        }
        Err(e) => {
            warn!(error = %e, "Category deletion rejected");
            redirect_error(CATEGORIES_PATH, &e.user_message())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_category_form_validation() {
        let form = CategoryForm {
            name: "  Vitamins ".to_string(),
            description: Some("   ".to_string()),
        };
        let input = form.to_input().unwrap();
        assert_eq!(input.name, "Vitamins");
        assert_eq!(input.description, None);

        let blank = CategoryForm {
            name: " ".to_string(),
            description: None,
        };
        assert!(blank.to_input().is_err());
    }
}
