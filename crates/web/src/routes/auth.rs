//! Authentication route handlers.
//!
//! Handles login, registration, logout and email verification by calling
//! the auth service and relaying the session cookies it issues.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{error, info, instrument, warn};

use medistore_core::Role;

use crate::backend::Credentials;
use crate::error::{add_breadcrumb, clear_sentry_user};
use crate::routes::{MessageQuery, SelectOption, redirect_error};
use crate::services::auth::{AuthError, AuthOutcome};
use crate::state::AppState;

/// Roles a visitor may pick when registering.
const REGISTRATION_ROLES: [Role; 2] = [Role::Customer, Role::Seller];

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: SecretString,
    pub redirect: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub password_confirm: SecretString,
    pub role: Option<String>,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
    pub success: Option<String>,
    pub redirect: Option<String>,
}

/// Query parameters for the verification page.
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    /// Verification token from the emailed link
    pub token: Option<String>,
    /// Address the link was sent to
    pub email: Option<String>,
    pub error: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub redirect: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub roles: Vec<SelectOption>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// "Check your inbox" page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/verify_email.html")]
pub struct VerifyEmailTemplate {
    pub email: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Accept only same-site absolute paths as post-login targets.
fn safe_redirect(target: Option<&str>) -> Option<&str> {
    target
        .map(str::trim)
        .filter(|t| t.starts_with('/') && !t.starts_with("//") && !t.contains('\\'))
}

/// Redirect to `location` while relaying the auth service's cookies.
fn redirect_with_cookies(location: &str, set_cookies: &[String]) -> Response {
    let mut response = Redirect::to(location).into_response();
    for cookie in set_cookies {
        match HeaderValue::from_str(cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => error!(error = %e, "Dropping unrepresentable Set-Cookie value"),
        }
    }
    response
}

/// Where a freshly signed-in user lands.
fn landing_path<'a>(outcome: &AuthOutcome, requested: Option<&'a str>) -> &'a str {
    safe_redirect(requested).unwrap_or_else(|| {
        outcome
            .user
            .as_ref()
            .map_or(Role::Customer.home_path(), |user| user.role.home_path())
    })
}

fn role_options(selected: Role) -> Vec<SelectOption> {
    REGISTRATION_ROLES
        .into_iter()
        .map(|role| SelectOption::new(role.as_str(), role.label(), role == selected))
        .collect()
}

/// Back to the login page, keeping the post-login target.
fn login_error(redirect: Option<&str>, message: &str) -> Response {
    let path = match safe_redirect(redirect) {
        Some(target) => {
            let mut query = url::form_urlencoded::Serializer::new(String::new());
            query.append_pair("redirect", target);
            format!("/login?{}", query.finish())
        }
        None => "/login".to_string(),
    };
    redirect_error(&path, message)
}

// =============================================================================
// Login
// =============================================================================

/// Display the login page.
pub async fn login_page(Query(query): Query<LoginQuery>) -> impl IntoResponse {
    LoginTemplate {
        redirect: safe_redirect(query.redirect.as_deref()).map(String::from),
        error: query.error,
        success: query.success,
    }
}

/// Handle login form submission.
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    match state.auth().sign_in(&form.email, &form.password).await {
        Ok(outcome) => {
            let target = landing_path(&outcome, form.redirect.as_deref());
            info!(target = %target, "Signed in");
            add_breadcrumb("auth", "Signed in", None);
            redirect_with_cookies(target, &outcome.set_cookies)
        }
        Err(e) => {
            if e.is_client_error() {
                warn!(error = %e, "Sign-in rejected");
            } else {
                error!(error = %e, "Sign-in failed");
            }
            login_error(form.redirect.as_deref(), &e.user_message())
        }
    }
}

// =============================================================================
// Registration
// =============================================================================

/// Display the registration page.
pub async fn register_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    RegisterTemplate {
        roles: role_options(Role::Customer),
        error: query.error,
        success: query.success,
    }
}

/// Handle registration form submission.
///
/// When the auth service signs the new account in straight away the user
/// lands on their dashboard; otherwise they are asked to verify their email.
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Response {
    let role = match form.role.as_deref().map(str::parse::<Role>) {
        None => Role::Customer,
        Some(Ok(role)) if REGISTRATION_ROLES.contains(&role) => role,
        Some(_) => return redirect_error("/register", "Please choose a valid account type"),
    };

    if form.name.trim().is_empty() {
        return redirect_error("/register", "Please enter your name");
    }
    if form.password.expose_secret() != form.password_confirm.expose_secret() {
        return redirect_error("/register", &AuthError::PasswordMismatch.user_message());
    }

    match state
        .auth()
        .sign_up(&form.name, &form.email, &form.password, role)
        .await
    {
        Ok(outcome) if outcome.set_cookies.is_empty() => {
            info!(role = %role, "Registered, awaiting email verification");
            let mut query = url::form_urlencoded::Serializer::new(String::new());
            query.append_pair("email", form.email.trim());
            Redirect::to(&format!("/verify-email?{}", query.finish())).into_response()
        }
        Ok(outcome) => {
            info!(role = %role, "Registered and signed in");
            let target = landing_path(&outcome, Some(role.home_path()));
            redirect_with_cookies(target, &outcome.set_cookies)
        }
        Err(e) => {
            warn!(error = %e, "Registration failed");
            redirect_error("/register", &e.user_message())
        }
    }
}

// =============================================================================
// Email verification
// =============================================================================

/// Handle the emailed verification link, or show the "check your inbox"
/// notice when there is no token.
///
/// Tokens are handed to the auth service through the same-origin proxy so
/// any session cookie it sets lands on this origin.
pub async fn verify_email(Query(query): Query<VerifyQuery>) -> Response {
    if let Some(token) = query.token.as_deref().filter(|t| !t.is_empty()) {
        let mut callback = url::form_urlencoded::Serializer::new(String::new());
        callback.append_pair("success", "Email verified, you can now sign in");
        let callback = format!("/login?{}", callback.finish());

        let mut params = url::form_urlencoded::Serializer::new(String::new());
        params.append_pair("token", token);
        params.append_pair("callbackURL", &callback);
        return Redirect::to(&format!("/api/auth/verify-email?{}", params.finish())).into_response();
    }

    VerifyEmailTemplate {
        email: query.email,
        error: query.error,
        success: None,
    }
    .into_response()
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
///
/// Ends the session with the auth service and expires the session cookie
/// locally even if the service could not be reached.
#[instrument(skip(state, credentials))]
pub async fn logout(State(state): State<AppState>, credentials: Credentials) -> Response {
    let mut set_cookies = match state.auth().sign_out(&credentials).await {
        Ok(cookies) => cookies,
        Err(e) => {
            warn!(error = %e, "Sign-out call failed, expiring cookie locally");
            Vec::new()
        }
    };
    set_cookies.push(format!(
        "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax",
        state.config().session_cookie_name
    ));

    clear_sentry_user();
    redirect_with_cookies("/", &set_cookies)
}
