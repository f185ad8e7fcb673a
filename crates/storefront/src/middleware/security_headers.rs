//! Response hardening headers.
//!
//! Every response leaves with a locked-down CSP and isolation headers. The
//! storefront loosens exactly three things: images from any https origin
//! (backend media host), `form-action https:` for the hosted payment redirect,
//! and `geolocation=(self)` for address autofill.

use std::sync::LazyLock;

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

/// CSP directives, joined with `; `.
///
/// `connect-src 'self'` covers the countdown event stream and
/// `/api/location/reverse`.
const CSP_DIRECTIVES: &[&str] = &[
    "default-src 'none'",
    "script-src 'self'",
    "style-src 'self'",
    "font-src 'self'",
    "img-src 'self' https: data:",
    "connect-src 'self'",
    "frame-src 'none'",
    "object-src 'none'",
    "base-uri 'self'",
    "form-action 'self' https:",
    "frame-ancestors 'none'",
    "upgrade-insecure-requests",
];

/// Browser features the pages may use. Everything listed is denied except
/// geolocation.
const PERMISSIONS: &[(&str, &str)] = &[
    ("geolocation", "(self)"),
    ("camera", "()"),
    ("microphone", "()"),
    ("payment", "()"),
    ("usb", "()"),
    ("serial", "()"),
    ("hid", "()"),
    ("browsing-topics", "()"),
    ("interest-cohort", "()"),
    ("display-capture", "()"),
    ("publickey-credentials-get", "()"),
];

static CSP: LazyLock<HeaderValue> = LazyLock::new(|| header_value(&CSP_DIRECTIVES.join("; ")));

static PERMISSIONS_POLICY: LazyLock<HeaderValue> = LazyLock::new(|| {
    let policy = PERMISSIONS
        .iter()
        .map(|(feature, allow)| format!("{feature}={allow}"))
        .collect::<Vec<_>>()
        .join(", ");
    header_value(&policy)
});

/// Fixed headers copied onto every response.
const STATIC_HEADERS: &[(&str, &str)] = &[
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("x-dns-prefetch-control", "off"),
];

fn header_value(value: &str) -> HeaderValue {
    // Built from the ASCII tables above.
    HeaderValue::from_str(value).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Apply the hardening headers.
///
/// Pages carry per-customer carts and flashes, so they default to
/// `Cache-Control: no-store`. Responses that already chose a cache policy
/// (static assets) keep it.
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(CONTENT_SECURITY_POLICY, CSP.clone());
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        PERMISSIONS_POLICY.clone(),
    );

    for &(name, value) in STATIC_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }

    if !headers.contains_key(CACHE_CONTROL) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, middleware, routing::get};
    use tower::ServiceExt;

    use super::*;

    async fn headers_for(app: Router, uri: &str) -> axum::http::HeaderMap {
        let app = app.layer(middleware::from_fn(security_headers_middleware));
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        response.headers().clone()
    }

    #[tokio::test]
    async fn test_page_headers() {
        let headers = headers_for(Router::new().route("/", get(|| async { "ok" })), "/").await;

        assert_eq!(headers[X_FRAME_OPTIONS], "DENY");
        assert_eq!(headers[X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[CACHE_CONTROL], "no-store, max-age=0");
        assert_eq!(headers["cross-origin-opener-policy"], "same-origin");

        let csp = headers[CONTENT_SECURITY_POLICY].to_str().unwrap();
        assert!(csp.starts_with("default-src 'none'; script-src 'self'"));
        assert!(csp.contains("form-action 'self' https:"));
        assert!(csp.contains("connect-src 'self'"));

        let permissions = headers["permissions-policy"].to_str().unwrap();
        assert!(permissions.starts_with("geolocation=(self), camera=()"));
    }

    #[tokio::test]
    async fn test_existing_cache_control_kept() {
        let app = Router::new().route(
            "/asset",
            get(|| async { ([(CACHE_CONTROL, "public, max-age=3600")], "css") }),
        );

        let headers = headers_for(app, "/asset").await;
        assert_eq!(headers[CACHE_CONTROL], "public, max-age=3600");
    }
}
