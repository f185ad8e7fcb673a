//! Request interceptors for the backend client.
//!
//! Every outgoing backend request passes through the client's interceptor
//! chain in order. `before_send` may rewrite the request (headers); the
//! `after_*` hooks observe the outcome.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};

use super::{ApiError, CallContext};
use crate::middleware::request_id::REQUEST_ID_HEADER;

/// Header carrying the server-to-server API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Method and path of a sent request, for logging.
#[derive(Debug, Clone)]
pub struct RequestSummary {
    pub method: Method,
    pub path: String,
}

/// A hook around every backend request.
pub trait Interceptor: Send + Sync {
    /// Adjust the request before it is sent.
    ///
    /// # Errors
    ///
    /// Returning an error aborts the request.
    fn before_send(
        &self,
        request: &mut reqwest::Request,
        ctx: &CallContext<'_>,
    ) -> Result<(), ApiError> {
        let _ = (request, ctx);
        Ok(())
    }

    /// Observe a response status.
    fn after_receive(&self, request: &RequestSummary, status: StatusCode, elapsed: Duration) {
        let _ = (request, status, elapsed);
    }

    /// Observe a transport failure.
    fn on_failure(&self, request: &RequestSummary, error: &reqwest::Error) {
        let _ = (request, error);
    }
}

/// Adds `Authorization: Bearer <token>` when the caller is signed in.
pub struct BearerAuth;

impl Interceptor for BearerAuth {
    fn before_send(
        &self,
        request: &mut reqwest::Request,
        ctx: &CallContext<'_>,
    ) -> Result<(), ApiError> {
        let Some(token) = ctx.token else {
            return Ok(());
        };

        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
            .map_err(|_| ApiError::InvalidHeader("authorization"))?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}

/// Adds the static server-to-server API key.
pub struct ApiKey {
    key: SecretString,
}

impl ApiKey {
    #[must_use]
    pub const fn new(key: SecretString) -> Self {
        Self { key }
    }
}

impl Interceptor for ApiKey {
    fn before_send(
        &self,
        request: &mut reqwest::Request,
        _ctx: &CallContext<'_>,
    ) -> Result<(), ApiError> {
        let mut value = HeaderValue::from_str(self.key.expose_secret())
            .map_err(|_| ApiError::InvalidHeader(API_KEY_HEADER))?;
        value.set_sensitive(true);
        request
            .headers_mut()
            .insert(HeaderName::from_static(API_KEY_HEADER), value);
        Ok(())
    }
}

/// Forwards the inbound request id so backend logs can be correlated.
pub struct ForwardRequestId;

impl Interceptor for ForwardRequestId {
    fn before_send(
        &self,
        request: &mut reqwest::Request,
        ctx: &CallContext<'_>,
    ) -> Result<(), ApiError> {
        if let Some(value) = ctx
            .request_id
            .and_then(|id| HeaderValue::from_str(id).ok())
        {
            request
                .headers_mut()
                .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
        }
        Ok(())
    }
}

/// Logs every backend call with its status and latency.
pub struct TraceRequests;

impl Interceptor for TraceRequests {
    fn after_receive(&self, request: &RequestSummary, status: StatusCode, elapsed: Duration) {
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        if status.is_server_error() {
            tracing::warn!(
                method = %request.method,
                path = %request.path,
                status = status.as_u16(),
                elapsed_ms,
                "Backend request failed"
            );
        } else {
            tracing::debug!(
                method = %request.method,
                path = %request.path,
                status = status.as_u16(),
                elapsed_ms,
                "Backend request completed"
            );
        }
    }

    fn on_failure(&self, request: &RequestSummary, error: &reqwest::Error) {
        tracing::warn!(
            method = %request.method,
            path = %request.path,
            timeout = error.is_timeout(),
            error = %error,
            "Backend request did not complete"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::AuthToken;

    fn request() -> reqwest::Request {
        reqwest::Request::new(
            Method::GET,
            "http://backend.test/products".parse().unwrap(),
        )
    }

    #[test]
    fn test_bearer_auth_only_with_token() {
        let mut req = request();
        BearerAuth
            .before_send(&mut req, &CallContext::anonymous())
            .unwrap();
        assert!(req.headers().get(AUTHORIZATION).is_none());

        let token = AuthToken::new("tok_9");
        let mut req = request();
        BearerAuth
            .before_send(&mut req, &CallContext::new(Some(&token), None))
            .unwrap();
        let header = req.headers().get(AUTHORIZATION).unwrap();
        assert_eq!(header.to_str().unwrap(), "Bearer tok_9");
        assert!(header.is_sensitive());
    }

    #[test]
    fn test_api_key_header() {
        let mut req = request();
        ApiKey::new(SecretString::from("k3Y$9xQ!mZ2@pL7#"))
            .before_send(&mut req, &CallContext::anonymous())
            .unwrap();
        assert_eq!(
            req.headers().get(API_KEY_HEADER).unwrap().to_str().unwrap(),
            "k3Y$9xQ!mZ2@pL7#"
        );
    }

    #[test]
    fn test_forward_request_id() {
        let mut req = request();
        ForwardRequestId
            .before_send(&mut req, &CallContext::new(None, Some("req-123")))
            .unwrap();
        assert_eq!(
            req.headers().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap(),
            "req-123"
        );
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        let token = AuthToken::new("bad\ntoken");
        let mut req = request();
        let result = BearerAuth.before_send(&mut req, &CallContext::new(Some(&token), None));
        assert!(matches!(result, Err(ApiError::InvalidHeader(_))));
    }
}
