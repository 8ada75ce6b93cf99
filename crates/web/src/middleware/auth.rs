//! Authentication extractors.
//!
//! The route guard only checks that a session cookie is present. These
//! extractors confirm the session with the auth service and enforce roles.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, warn};

use crate::backend::Credentials;
use crate::error::set_sentry_user;
use crate::middleware::guard::LOGIN_PATH;
use medistore_core::Role;

use crate::models::SessionUser;
use crate::state::AppState;

/// Extractor that requires a live session.
///
/// If the session is missing or expired, redirects to the login page with a
/// `redirect` parameter pointing back at the requested page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireUser(pub SessionUser);

/// Extractor that requires a live session with the `ADMIN` role.
pub struct RequireAdmin(pub SessionUser);

/// Error returned when a page needs a session or role the visitor lacks.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to the login page, then back to the given path.
    RedirectToLogin(String),
    /// Signed in, but not allowed here.
    Forbidden,
    /// The auth service could not be reached.
    Unavailable,
    /// Signed in, but this page belongs to another dashboard.
    Elsewhere(&'static str),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(path) => Redirect::to(&login_redirect(&path)).into_response(),
            Self::Forbidden => {
                (StatusCode::FORBIDDEN, "You do not have access to this page").into_response()
            }
            Self::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Sign-in service unavailable, please try again",
            )
                .into_response(),
            Self::Elsewhere(path) => Redirect::to(path).into_response(),
        }
    }
}

/// Login URL that returns to `path` afterwards.
#[must_use]
pub fn login_redirect(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return LOGIN_PATH.to_string();
    }
    let mut url = url::form_urlencoded::Serializer::new(String::new());
    url.append_pair("redirect", path);
    format!("{LOGIN_PATH}?{}", url.finish())
}

/// Path and query the browser actually requested.
///
/// Nested routers strip their prefix from `parts.uri`, so prefer the
/// [`OriginalUri`] the outer router recorded.
fn requested_path(parts: &Parts) -> String {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map_or(&parts.uri, |original| &original.0);
    uri.path_and_query()
        .map_or_else(|| uri.path().to_string(), ToString::to_string)
}

/// Look up the visitor's session with the auth service.
async fn session_user(parts: &mut Parts, state: &AppState) -> Result<Option<SessionUser>, AuthRejection> {
    let Ok(credentials) = Credentials::from_request_parts(parts, state).await;

    state.auth().get_session(&credentials).await.map_err(|e| {
        warn!(error = %e, "Session lookup failed");
        AuthRejection::Unavailable
    })
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(user) = session_user(parts, state).await? else {
            let path = requested_path(parts);
            debug!(path = %path, "Session cookie rejected by auth service");
            return Err(AuthRejection::RedirectToLogin(path));
        };

        if user.is_banned() {
            return Err(AuthRejection::Forbidden);
        }

        set_sentry_user(&user.id, Some(&user.email));
        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            debug!(user_id = %user.id, role = %user.role, "Non-admin on admin dashboard");
            return Err(AuthRejection::Forbidden);
        }

        Ok(Self(user))
    }
}

/// Check a confirmed user against the roles allowed on a `/dashboard` page.
///
/// Admins are always sent to their own dashboard.
fn dashboard_access(user: &SessionUser, allowed: &[Role]) -> Result<(), AuthRejection> {
    if user.is_admin() {
        return Err(AuthRejection::Elsewhere(Role::Admin.home_path()));
    }
    if !allowed.contains(&user.role) {
        debug!(user_id = %user.id, role = %user.role, "Role not allowed on this dashboard page");
        return Err(AuthRejection::Forbidden);
    }
    Ok(())
}

macro_rules! dashboard_extractor {
    ($(#[$meta:meta])* $name:ident, [$($role:expr),+]) => {
        $(#[$meta])*
        pub struct $name(pub SessionUser);

        impl FromRequestParts<AppState> for $name {
            type Rejection = AuthRejection;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &AppState,
            ) -> Result<Self, Self::Rejection> {
                let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;
                dashboard_access(&user, &[$($role),+])?;
                Ok(Self(user))
            }
        }
    };
}

dashboard_extractor!(
    /// A customer on a customer dashboard page.
    RequireCustomer,
    [Role::Customer]
);
dashboard_extractor!(
    /// A seller on a seller dashboard page.
    RequireSeller,
    [Role::Seller]
);
dashboard_extractor!(
    /// Any non-admin user on a shared dashboard page.
    RequireMember,
    [Role::Customer, Role::Seller]
);

/// Extractor that optionally gets the signed-in user.
///
/// Unlike `RequireUser`, this never rejects: a missing session or an
/// unreachable auth service both yield `None`.
pub struct OptionalUser(pub Option<SessionUser>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts, state).await.ok().flatten()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_redirect() {
        assert_eq!(login_redirect("/"), "/login");
        assert_eq!(login_redirect("/checkout"), "/login?redirect=%2Fcheckout");
        assert_eq!(
            login_redirect("/shop?page=2&sort=price"),
            "/login?redirect=%2Fshop%3Fpage%3D2%26sort%3Dprice"
        );
    }

    #[test]
    fn test_requested_path_prefers_original_uri() {
        let (mut parts, ()) = axum::http::Request::builder()
            .uri("/orders?page=2")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(requested_path(&parts), "/orders?page=2");

        parts
            .extensions
            .insert(OriginalUri("/dashboard/orders?page=2".parse().unwrap()));
        assert_eq!(requested_path(&parts), "/dashboard/orders?page=2");
    }

    fn user(role: Role) -> SessionUser {
        SessionUser {
            id: medistore_core::UserId::new("u1"),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            role,
            status: medistore_core::UserStatus::Active,
            email_verified: true,
            image: None,
        }
    }

    #[test]
    fn test_dashboard_access() {
        assert!(dashboard_access(&user(Role::Customer), &[Role::Customer]).is_ok());
        assert!(matches!(
            dashboard_access(&user(Role::Seller), &[Role::Customer]),
            Err(AuthRejection::Forbidden)
        ));
        assert!(matches!(
            dashboard_access(&user(Role::Admin), &[Role::Customer, Role::Seller]),
            Err(AuthRejection::Elsewhere("/admin-dashboard"))
        ));
    }

    #[test]
    fn test_rejection_statuses() {
        assert_eq!(
            AuthRejection::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthRejection::Unavailable.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AuthRejection::RedirectToLogin("/dashboard".to_string())
                .into_response()
                .status(),
            StatusCode::SEE_OTHER
        );
    }
}
