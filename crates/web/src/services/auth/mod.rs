//! Authentication service client.
//!
//! The frontend never stores passwords or sessions itself. Sign-in, sign-up
//! and sign-out are delegated to the auth service mounted under
//! `/api/auth/*` on the backend, and the session it issues is a cookie that
//! the browser carries from then on.
//!
//! Every `Set-Cookie` the service returns is rewritten with
//! [`rewrite_set_cookie`] before it is relayed, so the cookie lands on the
//! frontend's own origin.

mod error;

pub use error::AuthError;

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response, StatusCode, header};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument, warn};
use url::Url;

use medistore_core::{Email, Role};

use crate::backend::Credentials;
use crate::config::WebConfig;
use crate::models::SessionUser;
use crate::services::cookies::rewrite_set_cookie;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Result of a sign-in or sign-up call.
#[derive(Debug, Default)]
pub struct AuthOutcome {
    /// The user, when the service returned one.
    pub user: Option<SessionUser>,
    /// Rewritten `Set-Cookie` values to relay to the browser.
    pub set_cookies: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SessionPayload {
    user: SessionUser,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    #[serde(default)]
    user: Option<SessionUser>,
}

/// Client for the external auth service.
#[derive(Clone)]
pub struct AuthClient {
    inner: Arc<AuthClientInner>,
}

struct AuthClientInner {
    client: reqwest::Client,
    base_url: Url,
    origin: String,
}

impl AuthClient {
    /// Create an auth client against the server-side backend URL.
    ///
    /// `client` must not follow redirects: the service answers some calls
    /// with a redirect whose cookies we need to see.
    #[must_use]
    pub fn new(config: &WebConfig, client: reqwest::Client) -> Self {
        Self {
            inner: Arc::new(AuthClientInner {
                client,
                base_url: config.backend.server_url.clone(),
                origin: config.base_url.origin().ascii_serialization(),
            }),
        }
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, AuthError> {
        let url = self.inner.base_url.join(path.trim_start_matches('/'))?;
        Ok(self
            .inner
            .client
            .request(method, url)
            .header(header::ACCEPT, "application/json")
            .header(header::ORIGIN, &self.inner.origin))
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Ask the auth service who owns the visitor's session cookie.
    ///
    /// Returns `Ok(None)` when there is no cookie, the cookie is unknown or
    /// expired, or the service answers with a non-success status.
    ///
    /// # Errors
    ///
    /// Returns an error only when the service cannot be reached or answers
    /// with an unreadable body.
    #[instrument(skip(self, credentials))]
    pub async fn get_session(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<SessionUser>, AuthError> {
        if credentials.is_anonymous() {
            return Ok(None);
        }

        let request = credentials.apply(self.request(Method::GET, "/api/auth/get-session")?);
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            debug!(status = %status, "Session lookup returned non-success status");
            return Ok(None);
        }

        let body = response.text().await?;
        let payload: Option<SessionPayload> = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(300).collect::<String>(),
                "Failed to parse session response"
            );
            e
        })?;

        Ok(payload.map(|p| p.user))
    }

    // =========================================================================
    // Email + password
    // =========================================================================

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed address and
    /// `AuthError::Rejected` when the service refuses the credentials.
    #[instrument(skip(self, password))]
    pub async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthOutcome, AuthError> {
        let email = Email::parse(email)?;
        let request = self
            .request(Method::POST, "/api/auth/sign-in/email")?
            .json(&json!({
                "email": email.as_str(),
                "password": password.expose_secret(),
            }));

        outcome(request.send().await?).await
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns a validation error before calling the service, or
    /// `AuthError::Rejected` if the service refuses (duplicate email, ...).
    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
        role: Role,
    ) -> Result<AuthOutcome, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password.expose_secret())?;

        let request = self
            .request(Method::POST, "/api/auth/sign-up/email")?
            .json(&json!({
                "name": name.trim(),
                "email": email.as_str(),
                "password": password.expose_secret(),
                "role": role.as_str(),
            }));

        outcome(request.send().await?).await
    }

    /// End the visitor's session.
    ///
    /// Returns the rewritten cookies that clear the session in the browser.
    ///
    /// # Errors
    ///
    /// Returns an error if the service cannot be reached.
    #[instrument(skip(self, credentials))]
    pub async fn sign_out(&self, credentials: &Credentials) -> Result<Vec<String>, AuthError> {
        let request = credentials.apply(
            self.request(Method::POST, "/api/auth/sign-out")?
                .json(&json!({})),
        );
        let response = request.send().await?;
        let set_cookies = relayed_cookies(&response);

        if !response.status().is_success() {
            warn!(status = %response.status(), "Sign-out returned non-success status");
        }

        Ok(set_cookies)
    }
}

/// Turn a sign-in/sign-up response into an outcome or a rejection.
async fn outcome(response: Response) -> Result<AuthOutcome, AuthError> {
    let status = response.status();
    let set_cookies = relayed_cookies(&response);
    let body = response.text().await?;

    if !status.is_success() {
        let message = rejection_message(&body, status);
        debug!(status = %status, message = %message, "Auth service rejected request");
        return Err(AuthError::Rejected { status, message });
    }

    // An empty body still counts as success; the cookies are what matter.
    let user = if body.trim().is_empty() {
        None
    } else {
        serde_json::from_str::<UserPayload>(&body)?.user
    };

    Ok(AuthOutcome { user, set_cookies })
}

/// Every `Set-Cookie` on a response, rewritten for the frontend origin.
fn relayed_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(rewrite_set_cookie)
        .collect()
}

/// Pull a human message out of an auth service error body.
fn rejection_message(body: &str, status: StatusCode) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(serde_json::Value::as_str)
                .map(String::from)
        })
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| match status {
            StatusCode::UNAUTHORIZED => "Invalid email or password".to_string(),
            _ => format!("Request failed ({status})"),
        })
}

/// Validate password strength requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
        // counts characters, not bytes
        assert!(validate_password("ééééééé").is_err());
    }

    #[test]
    fn test_rejection_message_prefers_body() {
        assert_eq!(
            rejection_message(r#"{"message":"User already exists","code":"USER_EXISTS"}"#, StatusCode::UNPROCESSABLE_ENTITY),
            "User already exists"
        );
        assert_eq!(
            rejection_message(r#"{"error":"Email not verified"}"#, StatusCode::FORBIDDEN),
            "Email not verified"
        );
    }

    #[test]
    fn test_rejection_message_fallbacks() {
        assert_eq!(
            rejection_message("", StatusCode::UNAUTHORIZED),
            "Invalid email or password"
        );
        assert_eq!(
            rejection_message("<html>oops</html>", StatusCode::BAD_GATEWAY),
            "Request failed (502 Bad Gateway)"
        );
    }

    #[test]
    fn test_user_payload_without_user() {
        let payload: UserPayload = serde_json::from_str(r#"{"redirect":false}"#).unwrap();
        assert!(payload.user.is_none());
    }
}
