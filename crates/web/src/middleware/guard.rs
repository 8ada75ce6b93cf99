//! Route guard for the dashboards.
//!
//! A cheap first line of defence: requests under the dashboard prefixes must
//! carry the session cookie, otherwise they are sent to `/login`. Only the
//! cookie's presence is checked. The pages themselves confirm the session
//! and role with the auth service (see [`super::auth`]).

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::services::cookies::has_cookie;
use crate::state::AppState;

/// Path prefixes that require a session cookie.
pub const PROTECTED_PREFIXES: [&str; 2] = ["/dashboard", "/admin-dashboard"];

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "/login";

/// Whether `path` is one of the protected prefixes or below one.
///
/// `/dashboard` and `/dashboard/orders` match, `/dashboards` does not.
#[must_use]
pub fn is_protected(path: &str) -> bool {
    PROTECTED_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// Redirect to `/login` when a protected path is requested without the
/// session cookie.
pub async fn route_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path();

    if is_protected(path) && !has_cookie(request.headers(), &state.config().session_cookie_name) {
        debug!(path = %path, "No session cookie on protected path, redirecting to login");
        return Redirect::to(LOGIN_PATH).into_response();
    }

    next.run(request).await
}
