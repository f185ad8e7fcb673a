//! Integration test harness for Marketfront.
//!
//! Each test starts two servers on ephemeral loopback ports:
//!
//! - a [`MockBackend`] that answers the backend REST API with canned data
//!   and records every call it receives
//! - the real storefront router, configured against the mock
//!
//! Tests drive the storefront with a cookie-keeping `reqwest` client and then
//! assert on the pages returned and on the calls the backend saw.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p marketfront-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::{Body, to_bytes},
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{TimeDelta, Utc};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use marketfront_storefront::app::build_router;
use marketfront_storefront::config::StorefrontConfig;
use marketfront_storefront::state::AppState;

/// Token issued for `ada@example.com`.
pub const VALID_TOKEN: &str = "tok-valid";
/// Token issued for `expired@example.com`; every authenticated call with it
/// is rejected.
pub const EXPIRED_TOKEN: &str = "tok-expired";
/// Password the mock accepts.
pub const PASSWORD: &str = "correct-horse";
/// Units in stock for the only sized variant.
pub const STOCK_LEFT: u32 = 2;

// =============================================================================
// Call log
// =============================================================================

/// One request as received by the mock backend.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
    pub user_agent: Option<String>,
    pub body: String,
}

#[derive(Debug, Default)]
struct CallLog {
    calls: Mutex<Vec<RecordedCall>>,
}

async fn record(State(log): State<Arc<CallLog>>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, 1024 * 1024).await.unwrap_or_default();

    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };

    log.calls.lock().unwrap().push(RecordedCall {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(String::from),
        authorization: header("authorization"),
        request_id: header("x-request-id"),
        user_agent: header("user-agent"),
        body: String::from_utf8_lossy(&bytes).into_owned(),
    });

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

// =============================================================================
// Mock backend
// =============================================================================

/// Canned backend API.
pub struct MockBackend {
    addr: SocketAddr,
    log: Arc<CallLog>,
    filters_down: Arc<AtomicBool>,
}

impl MockBackend {
    /// Start the mock on an ephemeral port.
    pub async fn start() -> Self {
        let log = Arc::new(CallLog::default());
        let filters_down = Arc::new(AtomicBool::new(false));
        let categories_down = filters_down.clone();
        let brands_down = filters_down.clone();

        let app = Router::new()
            .route("/health", get(|| async { StatusCode::OK }))
            .route("/auth/login", post(login))
            .route("/auth/logout", post(|| async { StatusCode::NO_CONTENT }))
            .route(
                "/categories",
                get(move || categories(categories_down.clone())),
            )
            .route("/brands", get(move || brands(brands_down.clone())))
            .route("/products", get(products))
            .route("/products/{id}", get(product))
            .route("/shops", get(|| async { Json(json!([])) }))
            .route("/discounts", get(discounts))
            .route("/discounts/{id}", get(discount))
            .route("/cart", get(cart))
            .route("/cart/items", post(add_cart_item))
            .route("/payments/cancel", post(|| async { StatusCode::NO_CONTENT }))
            .route("/reverse", get(reverse_geocode))
            .layer(middleware::from_fn_with_state(log.clone(), record));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            log,
            filters_down,
        }
    }

    /// Make `/categories` and `/brands` answer 500.
    pub fn fail_filter_tables(&self) {
        self.filters_down.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Every call received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.log.calls.lock().unwrap().clone()
    }

    /// Calls matching a method and path.
    #[must_use]
    pub fn calls_to(&self, method: &str, path: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && c.path == path)
            .collect()
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    if body["password"] != PASSWORD {
        return error(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }

    let token = if email == "expired@example.com" {
        EXPIRED_TOKEN
    } else {
        VALID_TOKEN
    };

    Json(json!({
        "token": token,
        "user": { "id": 1, "name": "Ada Lovelace", "email": email, "points": 120 }
    }))
    .into_response()
}

async fn categories(down: Arc<AtomicBool>) -> Response {
    if down.load(Ordering::SeqCst) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Catalog unavailable");
    }
    Json(json!([
        { "id": 1, "name": "Coffee" },
        { "id": 2, "name": "Tea" }
    ]))
    .into_response()
}

async fn brands(down: Arc<AtomicBool>) -> Response {
    if down.load(Ordering::SeqCst) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Catalog unavailable");
    }
    Json(json!([{ "id": 10, "name": "Acme Roasters" }])).into_response()
}

fn sample_product() -> Value {
    json!({
        "id": 1,
        "name": "House Blend",
        "description": "A balanced everyday roast.",
        "price": "8.00",
        "compare_at_price": "10.00",
        "category": { "id": 1, "name": "Coffee" },
        "brand": { "id": 10, "name": "Acme Roasters" },
        "variants": [
            { "id": 11, "name": "Large", "price": "8.00", "stock": STOCK_LEFT },
            { "id": 12, "name": "Small", "price": "5.00", "stock": 0 }
        ]
    })
}

async fn products() -> Json<Value> {
    Json(json!({
        "data": [sample_product()],
        "meta": { "page": 1, "per_page": 24, "total": 1 }
    }))
}

async fn product(Path(id): Path<i64>) -> Response {
    if id == 1 {
        Json(sample_product()).into_response()
    } else {
        error(StatusCode::NOT_FOUND, "Product not found")
    }
}

/// Discount 1 has already ended; discount 2 ends in an hour.
fn sample_discount(id: i64) -> Value {
    let ends_at = if id == 1 {
        Utc::now() - TimeDelta::seconds(5)
    } else {
        Utc::now() + TimeDelta::hours(1)
    };
    json!({
        "id": id,
        "title": format!("Deal {id}"),
        "code": "SAVE20",
        "kind": "percentage",
        "value": "20",
        "ends_at": ends_at.to_rfc3339(),
    })
}

async fn discounts() -> Json<Value> {
    Json(json!([sample_discount(2)]))
}

async fn discount(Path(id): Path<i64>) -> Json<Value> {
    Json(sample_discount(id))
}

async fn cart(headers: HeaderMap) -> Response {
    match bearer(&headers) {
        Some(VALID_TOKEN) => Json(json!({
            "items": [],
            "subtotal": "0",
            "discount_total": "0",
            "total": "0"
        }))
        .into_response(),
        _ => error(StatusCode::UNAUTHORIZED, "Token expired"),
    }
}

async fn add_cart_item(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if bearer(&headers) != Some(VALID_TOKEN) {
        return error(StatusCode::UNAUTHORIZED, "Token expired");
    }

    let requested = body["quantity"].as_u64().unwrap_or(1);
    if requested > u64::from(STOCK_LEFT) {
        return error(
            StatusCode::UNPROCESSABLE_ENTITY,
            &format!(
                r#"Insufficient stock for variant "Large": available {STOCK_LEFT}, requested {requested}"#
            ),
        );
    }

    Json(json!({
        "items": [{
            "id": 100,
            "product_id": 1,
            "variant_id": 11,
            "name": "House Blend",
            "variant_name": "Large",
            "unit_price": "8.00",
            "quantity": requested
        }],
        "subtotal": "8.00",
        "total": "8.00"
    }))
    .into_response()
}

/// Stands in for the public reverse geocoder.
async fn reverse_geocode() -> Json<Value> {
    Json(json!({
        "display_name": "1 Rue de Rivoli, Paris",
        "address": {
            "house_number": "1",
            "road": "Rue de Rivoli",
            "city": "Paris",
            "postcode": "75001",
            "country": "France"
        }
    }))
}

// =============================================================================
// Storefront
// =============================================================================

/// A running storefront wired to a fresh mock backend.
pub struct TestContext {
    pub backend: MockBackend,
    pub base_url: String,
    pub client: reqwest::Client,
    /// Shared with the running router.
    pub state: AppState,
}

impl TestContext {
    /// Start a mock backend and a storefront pointed at it.
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Like [`start`](Self::start), with a chance to adjust the storefront
    /// configuration first.
    pub async fn start_with(configure: impl FnOnce(&mut StorefrontConfig)) -> Self {
        let backend = MockBackend::start().await;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{addr}");

        let mut config = StorefrontConfig::local(&base_url, backend.url());
        configure(&mut config);
        let state = AppState::new(config).unwrap();
        let app = build_router(state.clone());
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .unwrap();

        Self {
            backend,
            base_url,
            client,
            state,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET a page, following redirects, and return the final URL path and
    /// body.
    pub async fn get_page(&self, path: &str) -> (String, String) {
        let response = self.client.get(self.url(path)).send().await.unwrap();
        let final_path = response.url().path().to_string();
        (final_path, response.text().await.unwrap())
    }

    /// POST a form, following redirects, and return the final URL path and
    /// body.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> (String, String) {
        let response = self
            .client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .unwrap();
        let final_path = response.url().path().to_string();
        (final_path, response.text().await.unwrap())
    }

    /// Sign in through the login form.
    pub async fn login(&self, email: &str) -> String {
        let (_, body) = self
            .post_form("/auth/login", &[("email", email), ("password", PASSWORD)])
            .await;
        body
    }
}
