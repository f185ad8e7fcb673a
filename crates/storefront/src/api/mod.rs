//! Backend REST API client.
//!
//! # Architecture
//!
//! - The backend owns every entity; the storefront never persists them
//! - One `BackendClient` per process, stored in `AppState`, cheap to clone
//! - Cross-cutting request concerns (auth header, API key, request-id
//!   propagation, request logging) are `Interceptor`s applied in order to
//!   every outgoing request
//! - Per-request data (the customer's token, the inbound request id) travels
//!   in a `CallContext`
//!
//! # Example
//!
//! ```rust,ignore
//! use marketfront_storefront::api::{BackendClient, CallContext};
//!
//! let client = BackendClient::new(&config.backend)?;
//! let product: Product = client
//!     .get("/products/42", &[], CallContext::anonymous())
//!     .await?;
//! ```

mod client;
pub mod interceptor;
pub mod types;

pub use client::{BackendClient, CallContext};
pub use interceptor::{Interceptor, RequestSummary};

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use marketfront_core::friendly_error_message;

/// Errors that can occur when calling the backend or a location service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success status with a message.
    #[error("Backend error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The customer's token was missing, expired, or revoked.
    #[error("Unauthorized")]
    Unauthorized,

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A header value could not be encoded.
    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),
}

impl ApiError {
    /// Text suitable for a customer-facing notification.
    ///
    /// Backend messages go through the known-message heuristics; transport
    /// and parse failures never leak their details.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } => friendly_error_message(message),
            Self::NotFound(_) => "That item could not be found.".to_string(),
            Self::Unauthorized => "Please sign in to continue.".to_string(),
            Self::RateLimited(_) => {
                "We're getting a lot of requests. Please try again in a moment.".to_string()
            }
            Self::Http(err) if err.is_timeout() => {
                "The store is taking too long to respond. Please try again.".to_string()
            }
            _ => marketfront_core::messages::GENERIC_ERROR.to_string(),
        }
    }

    /// Whether the backend reported the resource as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether the backend rejected the customer's token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// A customer's backend access token.
///
/// Stored server-side in the session; `Debug` never prints the value.
#[derive(Clone)]
pub struct AuthToken(SecretString);

impl AuthToken {
    /// Wrap a token returned by the backend.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// The raw token, for building the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken([REDACTED])")
    }
}

impl Serialize for AuthToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose())
    }
}

impl<'de> Deserialize<'de> for AuthToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Api {
            status: 422,
            message: "Invalid discount code".to_string(),
        };
        assert_eq!(err.to_string(), "Backend error: 422 - Invalid discount code");
        assert_eq!(
            ApiError::RateLimited(30).to_string(),
            "Rate limited, retry after 30 seconds"
        );
    }

    #[test]
    fn test_user_message_translates_backend_text() {
        let err = ApiError::Api {
            status: 409,
            message: r#"Insufficient stock for variant "Tote Bag": available 2, requested 4"#
                .to_string(),
        };
        assert_eq!(err.user_message(), "Only 2 left of Tote Bag.");

        let err = ApiError::Api {
            status: 500,
            message: "database connection reset".to_string(),
        };
        assert_eq!(err.user_message(), marketfront_core::messages::GENERIC_ERROR);
    }

    #[test]
    fn test_user_message_hides_details() {
        let err = ApiError::NotFound("/products/9".to_string());
        assert!(!err.user_message().contains("/products/9"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_auth_token_is_redacted() {
        let token = AuthToken::new("tok_live_abc123");
        assert_eq!(format!("{token:?}"), "AuthToken([REDACTED])");
        assert_eq!(token.expose(), "tok_live_abc123");
    }

    #[test]
    fn test_auth_token_serde() {
        let token = AuthToken::new("tok_1");
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, "\"tok_1\"");
        let back: AuthToken = serde_json::from_str(&json).unwrap();
        assert_eq!(back.expose(), "tok_1");
    }
}
