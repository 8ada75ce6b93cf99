//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::{instrument, warn};

use crate::backend::{Category, Credentials, Medicine, MedicineFilter};
use crate::state::AppState;

/// Number of medicines featured on the home page.
const FEATURED_COUNT: u32 = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub featured: Vec<Medicine>,
    pub categories: Vec<Category>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Display the home page: newest medicines and the category list.
#[instrument(skip(state, credentials))]
pub async fn home(State(state): State<AppState>, credentials: Credentials) -> impl IntoResponse {
    let filter = MedicineFilter {
        sort: Some("newest".to_string()),
        limit: Some(FEATURED_COUNT),
        ..MedicineFilter::default()
    };

    let (featured, categories) = tokio::join!(
        state.backend().list_medicines(&credentials, &filter),
        state.backend().list_categories(),
    );

    let mut error = None;
    let featured = featured.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load featured medicines");
        error = Some(e.user_message());
        Vec::new()
    });
    let categories = categories.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load categories");
        Vec::new()
    });

    HomeTemplate {
        featured,
        categories,
        error,
        success: None,
    }
}
