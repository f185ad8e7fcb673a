//! `BackendClient` and the request pipeline.

use std::sync::Arc;
use std::time::Instant;

use reqwest::header::{CONTENT_TYPE, HeaderValue, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use super::interceptor::{ApiKey, BearerAuth, ForwardRequestId, TraceRequests};
use super::{ApiError, AuthToken, Interceptor, RequestSummary};
use crate::config::BackendConfig;

const USER_AGENT: &str = concat!("marketfront-storefront/", env!("CARGO_PKG_VERSION"));

/// Per-call data that interceptors read.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallContext<'a> {
    /// Access token of the signed-in customer, if any.
    pub token: Option<&'a AuthToken>,
    /// Id of the inbound request that triggered this call.
    pub request_id: Option<&'a str>,
}

impl<'a> CallContext<'a> {
    #[must_use]
    pub const fn new(token: Option<&'a AuthToken>, request_id: Option<&'a str>) -> Self {
        Self { token, request_id }
    }

    /// A call made on behalf of nobody in particular.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            token: None,
            request_id: None,
        }
    }

    /// The same context without the customer's token.
    #[must_use]
    pub const fn without_token(self) -> Self {
        Self {
            token: None,
            request_id: self.request_id,
        }
    }
}

/// Client for the backend REST API.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    http: reqwest::Client,
    base_url: String,
    interceptors: Vec<Box<dyn Interceptor>>,
}

impl BackendClient {
    /// Create a client with the standard interceptor chain.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let mut interceptors: Vec<Box<dyn Interceptor>> =
            vec![Box::new(ForwardRequestId), Box::new(BearerAuth)];
        if let Some(key) = &config.api_key {
            interceptors.push(Box::new(ApiKey::new(key.clone())));
        }
        interceptors.push(Box::new(TraceRequests));

        Self::with_interceptors(config, interceptors)
    }

    /// Create a client with an explicit interceptor chain.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn with_interceptors(
        config: &BackendConfig,
        interceptors: Vec<Box<dyn Interceptor>>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                http,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                interceptors,
            }),
        })
    }

    /// `GET` a JSON resource.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        ctx: CallContext<'_>,
    ) -> Result<T, ApiError> {
        let body = self
            .send(Method::GET, path, query, None::<&()>, ctx)
            .await?;
        parse_body(path, &body)
    }

    /// `POST` a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error.
    pub async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        ctx: CallContext<'_>,
    ) -> Result<T, ApiError> {
        let text = self.send(Method::POST, path, &[], Some(body), ctx).await?;
        parse_body(path, &text)
    }

    /// `POST` a JSON body, ignoring any response body.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error.
    pub async fn post_no_content<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        ctx: CallContext<'_>,
    ) -> Result<(), ApiError> {
        self.send(Method::POST, path, &[], Some(body), ctx).await?;
        Ok(())
    }

    /// `PATCH` a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error.
    pub async fn patch<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        ctx: CallContext<'_>,
    ) -> Result<T, ApiError> {
        let text = self.send(Method::PATCH, path, &[], Some(body), ctx).await?;
        parse_body(path, &text)
    }

    /// `DELETE` a resource and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        ctx: CallContext<'_>,
    ) -> Result<T, ApiError> {
        let text = self
            .send(Method::DELETE, path, &[], None::<&()>, ctx)
            .await?;
        parse_body(path, &text)
    }

    /// Ping the backend's health endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or unhealthy.
    pub async fn health(&self) -> Result<(), ApiError> {
        self.send(Method::GET, "/health", &[], None::<&()>, CallContext::anonymous())
            .await?;
        Ok(())
    }

    /// Run one request through the interceptor chain and map the status.
    #[instrument(skip(self, query, body, ctx), fields(method = %method))]
    async fn send<B: Serialize + Sync + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
        ctx: CallContext<'_>,
    ) -> Result<String, ApiError> {
        let url = build_url(&self.inner.base_url, path, query)?;
        let mut request = reqwest::Request::new(method.clone(), url);

        if let Some(body) = body {
            let bytes = serde_json::to_vec(body)?;
            request
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            *request.body_mut() = Some(bytes.into());
        }

        for interceptor in &self.inner.interceptors {
            interceptor.before_send(&mut request, &ctx)?;
        }

        let summary = RequestSummary {
            method,
            path: path.to_string(),
        };
        let started = Instant::now();

        let response = match self.inner.http.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                for interceptor in &self.inner.interceptors {
                    interceptor.on_failure(&summary, &err);
                }
                return Err(ApiError::Http(err));
            }
        };

        let status = response.status();
        for interceptor in &self.inner.interceptors {
            interceptor.after_receive(&summary, status, started.elapsed());
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let text = response.text().await?;

        if status.is_success() {
            return Ok(text);
        }

        match status {
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(path.to_string())),
            _ => {
                tracing::error!(
                    status = status.as_u16(),
                    path,
                    body = %truncate(&text, 500),
                    "Backend returned non-success status"
                );
                Err(ApiError::Api {
                    status: status.as_u16(),
                    message: extract_message(&text, status),
                })
            }
        }
    }
}

/// Join the base URL, path, and query pairs.
fn build_url(base_url: &str, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
    let mut url = Url::parse(&format!("{base_url}{path}"))?;
    if !query.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
    }
    Ok(url)
}

fn parse_body<T: DeserializeOwned>(path: &str, text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| {
        tracing::error!(
            error = %e,
            path,
            body = %truncate(text, 500),
            "Failed to parse backend response"
        );
        ApiError::Parse(e)
    })
}

/// Pull a human-readable message out of an error body.
///
/// Looks at `message`, then `error`, then `detail`; falls back to the raw
/// body, then to the status reason.
fn extract_message(body: &str, status: StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error", "detail"] {
            if let Some(message) = value.get(key).and_then(serde_json::Value::as_str)
                && !message.trim().is_empty()
            {
                return message.trim().to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed.starts_with('{') || trimmed.starts_with('<') {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        truncate(trimmed, 200)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_without_query() {
        let url = build_url("http://backend.test/api", "/products/3", &[]).unwrap();
        assert_eq!(url.as_str(), "http://backend.test/api/products/3");
    }

    #[test]
    fn test_build_url_encodes_query() {
        let url = build_url(
            "http://backend.test",
            "/products",
            &[("search", "red shoes".to_string()), ("page", "2".to_string())],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "http://backend.test/products?search=red+shoes&page=2"
        );
    }

    #[test]
    fn test_extract_message_prefers_message_field() {
        let body = r#"{"message":"Invalid discount code","error":"Bad Request"}"#;
        assert_eq!(
            extract_message(body, StatusCode::BAD_REQUEST),
            "Invalid discount code"
        );
    }

    #[test]
    fn test_extract_message_falls_back() {
        assert_eq!(
            extract_message(r#"{"detail":"Cart is locked"}"#, StatusCode::CONFLICT),
            "Cart is locked"
        );
        assert_eq!(
            extract_message("", StatusCode::BAD_GATEWAY),
            "Bad Gateway"
        );
        assert_eq!(
            extract_message("<html>oops</html>", StatusCode::INTERNAL_SERVER_ERROR),
            "Internal Server Error"
        );
        assert_eq!(
            extract_message("plain failure", StatusCode::BAD_REQUEST),
            "plain failure"
        );
    }

    #[test]
    fn test_call_context_without_token() {
        let token = AuthToken::new("t");
        let ctx = CallContext::new(Some(&token), Some("req-1")).without_token();
        assert!(ctx.token.is_none());
        assert_eq!(ctx.request_id, Some("req-1"));
    }
}
