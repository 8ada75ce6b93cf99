//! The response envelope shared by every backend endpoint.
//!
//! ```json
//! { "success": true, "data": { ... } }
//! { "success": false, "error": "Medicine not found" }
//! ```

use serde::{Deserialize, Serialize};

/// Generic backend response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Some endpoints report failures (and successes) in `message` instead of `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Why an envelope could not be turned into data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    /// The backend reported `success: false`.
    #[error("{0}")]
    Rejected(String),
    /// `success: true` but no `data` field.
    #[error("response did not include data")]
    MissingData,
}

impl<T> ApiResponse<T> {
    /// Build a successful envelope.
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    /// Build a failed envelope.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }

    /// The best available human-readable failure reason.
    #[must_use]
    pub fn failure_reason(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "Request failed".to_string())
    }

    /// Unwrap the envelope into its data.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Rejected`] when `success` is false and
    /// [`EnvelopeError::MissingData`] when a successful response has no data.
    pub fn into_result(self) -> Result<T, EnvelopeError> {
        if !self.success {
            return Err(EnvelopeError::Rejected(self.failure_reason()));
        }
        self.data.ok_or(EnvelopeError::MissingData)
    }

    /// Check for success without needing a data payload (deletes, status updates).
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Rejected`] when `success` is false.
    pub fn into_unit(self) -> Result<(), EnvelopeError> {
        if self.success {
            Ok(())
        } else {
            Err(EnvelopeError::Rejected(self.failure_reason()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_success_with_data() {
        let envelope: ApiResponse<Vec<u32>> =
            serde_json::from_str(r#"{"success":true,"data":[1,2]}"#).unwrap();
        assert_eq!(envelope.into_result().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_failure_prefers_error_then_message() {
        let envelope: ApiResponse<()> =
            serde_json::from_str(r#"{"success":false,"message":"Out of stock"}"#).unwrap();
        assert_eq!(
            envelope.into_result(),
            Err(EnvelopeError::Rejected("Out of stock".to_string()))
        );

        let envelope: ApiResponse<()> = serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert_eq!(envelope.failure_reason(), "Request failed");
    }

    /// Payload types need not implement `Default` to be decoded.
    #[test]
    fn test_decodes_payload_without_default() {
        #[derive(Debug, PartialEq, Eq, Deserialize)]
        struct Stock {
            left: u32,
        }

        fn decode<T: serde::de::DeserializeOwned>(body: &str) -> ApiResponse<T> {
            serde_json::from_str(body).unwrap()
        }

        let envelope: ApiResponse<Stock> = decode(r#"{"success":true,"data":{"left":3}}"#);
        assert_eq!(envelope.into_result().unwrap(), Stock { left: 3 });

        let envelope: ApiResponse<Stock> = decode(r#"{"success":false,"error":"Gone"}"#);
        assert_eq!(envelope.data, None);
    }

    #[test]
    fn test_missing_data_is_an_error_but_not_for_unit() {
        let envelope: ApiResponse<String> = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(envelope.clone().into_unit().is_ok());
        assert_eq!(envelope.into_result(), Err(EnvelopeError::MissingData));
    }
}
