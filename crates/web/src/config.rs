//! Web frontend configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MEDISTORE_BASE_URL` - Public URL of this frontend (https enables secure cookies)
//! - `BACKEND_URL` - Backend origin used server-side by the auth proxy and auth client
//!
//! ## Optional
//! - `MEDISTORE_HOST` - Bind address (default: 127.0.0.1)
//! - `MEDISTORE_PORT` - Listen port (default: 3000)
//! - `PUBLIC_API_URL` - Base URL for page data calls (default: `BACKEND_URL`)
//! - `SESSION_COOKIE_NAME` - Auth session cookie checked by the route guard
//!   (default: `better-auth.session_token`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;
use url::Url;

/// Default auth session cookie name issued by the auth service.
pub const DEFAULT_SESSION_COOKIE: &str = "better-auth.session_token";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Web frontend configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of this frontend
    pub base_url: Url,
    /// Backend endpoints
    pub backend: BackendConfig,
    /// Name of the auth session cookie whose presence the route guard checks
    pub session_cookie_name: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// The two backend base URLs.
///
/// The proxy and auth client talk to `server_url`; page handlers fetch data
/// through `api_url`. They are usually the same origin but may differ when
/// the server reaches the backend over a private network.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub server_url: Url,
    pub api_url: Url,
}

impl BackendConfig {
    /// Both variants pointing at the same origin.
    #[must_use]
    pub fn single(url: Url) -> Self {
        Self {
            server_url: url.clone(),
            api_url: url,
        }
    }
}

impl WebConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("MEDISTORE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("MEDISTORE_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("MEDISTORE_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("MEDISTORE_PORT".to_string(), e.to_string()))?;
        let base_url = parse_url("MEDISTORE_BASE_URL", &get_required_env("MEDISTORE_BASE_URL")?)?;

        let server_url = parse_url("BACKEND_URL", &get_required_env("BACKEND_URL")?)?;
        let api_url = match get_optional_env("PUBLIC_API_URL") {
            Some(value) => parse_url("PUBLIC_API_URL", &value)?,
            None => server_url.clone(),
        };

        let session_cookie_name =
            get_env_or_default("SESSION_COOKIE_NAME", DEFAULT_SESSION_COOKIE);
        if session_cookie_name.is_empty() || session_cookie_name.contains([';', '=', ' ']) {
            return Err(ConfigError::InvalidEnvVar(
                "SESSION_COOKIE_NAME".to_string(),
                "must be a non-empty cookie token".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            base_url,
            backend: BackendConfig {
                server_url,
                api_url,
            },
            session_cookie_name,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: parse_rate("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Configuration for tests and local tooling: everything on defaults,
    /// both backend URLs pointing at `backend_url`.
    #[must_use]
    pub fn for_backend(backend_url: Url) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: Url::parse("http://localhost:3000").unwrap_or_else(|_| backend_url.clone()),
            backend: BackendConfig::single(backend_url),
            session_cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies set by this frontend should carry `Secure`.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an absolute http(s) URL, normalizing it to end with `/` so it can be
/// used as a join base.
fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(value) = get_optional_env(key) else {
        return Ok(default);
    };
    let rate = value
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be between 0.0 and 1.0".to_string(),
        ))
    }
}
