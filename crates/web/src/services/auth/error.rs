//! Authentication error types.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the auth service.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Transport failure reaching the auth service.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The auth service answered with a body we could not read.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The auth service refused the request (wrong password, duplicate email, ...).
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    /// Invalid email format, caught before calling the service.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] medistore_core::EmailError),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// An auth URL could not be built.
    #[error("invalid auth URL: {0}")]
    Url(#[from] url::ParseError),
}

impl AuthError {
    /// Message suitable for the login/register error banner.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::InvalidEmail(_) => "Please enter a valid email address".to_string(),
            Self::WeakPassword(msg) => msg.clone(),
            Self::PasswordMismatch => "Passwords do not match".to_string(),
            Self::Http(_) | Self::Parse(_) | Self::Url(_) => {
                "Could not reach the sign-in service, please try again".to_string()
            }
        }
    }

    /// Whether the failure is on the visitor's side rather than ours.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Rejected { .. }
                | Self::InvalidEmail(_)
                | Self::WeakPassword(_)
                | Self::PasswordMismatch
        )
    }
}
