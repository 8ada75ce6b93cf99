//! MediStore REST backend client.
//!
//! # Architecture
//!
//! - The backend is the source of truth; nothing is synced locally
//! - Every request forwards the visitor's `Cookie` header ([`Credentials`]) so
//!   the backend authorizes the call as that visitor
//! - Every response is the `{success, data, error}` envelope from
//!   [`medistore_core::ApiResponse`]
//! - The public category list is cached in-memory via `moka` (5 minute TTL)
//!
//! # Example
//!
//! ```rust,ignore
//! use medistore_web::backend::{BackendClient, Credentials, MedicineFilter};
//!
//! let client = BackendClient::new(&config.backend, http);
//! let medicines = client
//!     .list_medicines(&Credentials::anonymous(), &MedicineFilter::default())
//!     .await?;
//! ```

mod admin;
mod cache;
mod catalog;
mod orders;
mod seller;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode, header};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

use medistore_core::{ApiResponse, EnvelopeError};

use crate::config::BackendConfig;
use crate::services::cookies::joined_cookie_header;

pub use cache::CacheValue;
pub use types::*;

/// How long the public category list is cached.
const CATEGORY_TTL: Duration = Duration::from_secs(300);

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport failure (connection refused, DNS, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The backend answered with a non-2xx status or `success: false`.
    #[error("{message}")]
    Api { status: StatusCode, message: String },

    /// Too many requests.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// A request URL could not be built.
    #[error("invalid backend URL: {0}")]
    Url(#[from] url::ParseError),
}

impl BackendError {
    /// HTTP status reported by the backend, if it answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::RateLimited(_) => Some(StatusCode::TOO_MANY_REQUESTS),
            _ => None,
        }
    }

    /// Message suitable for an inline error banner.
    ///
    /// Business errors carry the backend's own message; transport and parse
    /// failures collapse into a generic one.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            Self::RateLimited(_) => "Too many requests, please slow down".to_string(),
            Self::Http(_) | Self::Parse(_) | Self::Url(_) => {
                "Could not reach the MediStore service, please try again".to_string()
            }
        }
    }
}

// =============================================================================
// Credentials
// =============================================================================

/// The visitor's cookies, forwarded to the backend on every call.
///
/// Wrapped in a secret so session tokens never end up in logs or spans.
#[derive(Clone, Default)]
pub struct Credentials(Option<SecretString>);

impl Credentials {
    /// No cookies (public catalog calls).
    #[must_use]
    pub const fn anonymous() -> Self {
        Self(None)
    }

    /// Credentials from a raw `Cookie` header value.
    #[must_use]
    pub fn from_cookie_header(value: impl Into<String>) -> Self {
        Self(Some(SecretString::from(value.into())))
    }

    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.0.is_none()
    }

    /// Attach the cookie header to an outgoing request.
    pub(crate) fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.0 {
            Some(cookie) => request.header(header::COOKIE, cookie.expose_secret()),
            None => request,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(if self.0.is_some() {
            "Credentials([REDACTED])"
        } else {
            "Credentials(anonymous)"
        })
    }
}

impl<S> FromRequestParts<S> for Credentials
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(joined_cookie_header(&parts.headers).map_or_else(Self::anonymous, Self::from_cookie_header))
    }
}

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the MediStore REST backend.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<String, CacheValue>,
}

impl BackendClient {
    /// Create a backend client against the page-side API URL.
    #[must_use]
    pub fn new(config: &BackendConfig, client: reqwest::Client) -> Self {
        let cache = Cache::builder()
            .max_capacity(100)
            .time_to_live(CATEGORY_TTL)
            .build();

        Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.api_url.clone(),
                cache,
            }),
        }
    }

    /// Build an absolute URL for an `/api/...` path.
    fn url(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        credentials: &Credentials,
    ) -> Result<RequestBuilder, BackendError> {
        let url = self.url(path)?;
        let request = self
            .inner
            .client
            .request(method, url)
            .header(header::ACCEPT, "application/json");
        Ok(credentials.apply(request))
    }

    /// Send a request and unwrap the response envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<ApiResponse<T>, BackendError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        // Read as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiResponse<serde_json::Value>>(&body)
                .map_or_else(|_| format!("Request failed ({status})"), |e| e.failure_reason());
            debug!(
                status = %status,
                body = %body.chars().take(300).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(BackendError::Api { status, message });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    /// `GET` a path and return the envelope's data.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        credentials: &Credentials,
    ) -> Result<T, BackendError> {
        let request = self.request(Method::GET, path, credentials)?;
        self.send::<T>(request).await?.into_result().map_err(envelope_error)
    }

    /// Send a JSON body and return the envelope's data.
    async fn send_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        credentials: &Credentials,
        body: &B,
    ) -> Result<T, BackendError> {
        let request = self.request(method, path, credentials)?.json(body);
        self.send::<T>(request).await?.into_result().map_err(envelope_error)
    }

    /// Send a JSON body where only success matters.
    async fn send_json_unit<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        credentials: &Credentials,
        body: &B,
    ) -> Result<(), BackendError> {
        let request = self.request(method, path, credentials)?.json(body);
        self.send::<serde_json::Value>(request)
            .await?
            .into_unit()
            .map_err(envelope_error)
    }

    /// `DELETE` a path.
    async fn delete(&self, path: &str, credentials: &Credentials) -> Result<(), BackendError> {
        let request = self.request(Method::DELETE, path, credentials)?;
        self.send::<serde_json::Value>(request)
            .await?
            .into_unit()
            .map_err(envelope_error)
    }
}

/// Map an envelope failure on a 2xx response into a backend error.
fn envelope_error(error: EnvelopeError) -> BackendError {
    BackendError::Api {
        status: StatusCode::UNPROCESSABLE_ENTITY,
        message: error.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> BackendClient {
        BackendClient::new(
            &BackendConfig::single(Url::parse(base).unwrap()),
            reqwest::Client::new(),
        )
    }

    #[test]
    fn test_url_join_keeps_base_path() {
        let client = client("https://api.medistore.io/v1/");
        assert_eq!(
            client.url("/api/medicines").unwrap().as_str(),
            "https://api.medistore.io/v1/api/medicines"
        );
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let credentials = Credentials::from_cookie_header("session=super-secret");
        let debug = format!("{credentials:?}");
        assert!(!debug.contains("super-secret"));
        assert!(Credentials::anonymous().is_anonymous());
    }

    #[test]
    fn test_user_message_hides_transport_details() {
        let err = BackendError::Api {
            status: StatusCode::BAD_REQUEST,
            message: "Insufficient stock".to_string(),
        };
        assert_eq!(err.user_message(), "Insufficient stock");
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));

        let err = BackendError::Url(url::ParseError::EmptyHost);
        assert!(err.user_message().contains("Could not reach"));
    }
}
