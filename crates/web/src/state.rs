//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::backend::BackendClient;
use crate::config::WebConfig;
use crate::middleware::CartLocks;
use crate::services::auth::AuthClient;

/// Timeout for any single upstream call.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. All upstream clients share one connection
/// pool that never follows redirects, so the auth proxy can relay them.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WebConfig,
    http: reqwest::Client,
    backend: BackendClient,
    auth: AuthClient,
    cart_locks: CartLocks,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (TLS backend
    /// initialization failure).
    pub fn new(config: WebConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(UPSTREAM_TIMEOUT)
            .user_agent(concat!("medistore-web/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let backend = BackendClient::new(&config.backend, http.clone());
        let auth = AuthClient::new(&config, http.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                http,
                backend,
                auth,
                cart_locks: CartLocks::new(),
            }),
        })
    }

    /// Get a reference to the web configuration.
    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.inner.config
    }

    /// Raw HTTP client, used by the auth proxy.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    /// Get a reference to the REST backend client.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    /// Get a reference to the auth service client.
    #[must_use]
    pub fn auth(&self) -> &AuthClient {
        &self.inner.auth
    }

    /// Per-session locks around cart requests.
    #[must_use]
    pub fn cart_locks(&self) -> &CartLocks {
        &self.inner.cart_locks
    }
}
