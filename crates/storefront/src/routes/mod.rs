//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page (featured products, active discounts)
//!
//! # Catalog
//! GET  /products                  - Product listing (page, sort, search, category, brand)
//! GET  /products/{id}             - Product detail
//! GET  /shops                     - Shop listing (?near=me, ?fulfillment=)
//! GET  /shops/{id}                - Shop detail with warehouses and products
//!
//! # Discounts & rewards
//! GET  /discounts                 - Active discounts with countdowns
//! GET  /discounts/{id}/countdown  - Countdown event stream (SSE)
//! GET  /rewards                   - Points and rewards (auth)
//! POST /rewards/{id}/redeem       - Redeem a reward (auth)
//!
//! # Cart & checkout (auth)
//! GET  /cart                      - Cart page with checkout form
//! POST /cart/add                  - Add to cart
//! POST /cart/update               - Update quantity
//! POST /cart/remove               - Remove item
//! POST /checkout                  - Create payment session, redirect to provider
//! GET  /checkout/success          - Order confirmation
//! GET  /checkout/cancel           - Payment cancellation cleanup
//!
//! # Orders (auth)
//! GET  /orders                    - Order history
//! GET  /orders/{id}               - Order detail
//!
//! # Auth
//! GET  /auth/login                - Login page
//! POST /auth/login                - Login action
//! GET  /auth/register             - Register page
//! POST /auth/register             - Register action
//! GET  /auth/forgot-password      - Forgot password page
//! POST /auth/forgot-password      - Request reset email
//! POST /auth/logout               - Logout action
//!
//! # JSON API
//! GET  /api/location/reverse      - Reverse geocode for address autofill
//! ```

pub mod api;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod discounts;
pub mod home;
pub mod orders;
pub mod products;
pub mod rewards;
pub mod shops;

use axum::{
    Router,
    routing::{get, post},
};
use url::form_urlencoded;

use crate::api::CallContext;
use crate::api::types::PageMeta;
use crate::middleware::{RequestId, api_rate_limiter, auth_rate_limiter};
use crate::models::SessionUser;
use crate::state::AppState;

/// Create the auth routes router.
///
/// Form submissions share one strict rate limiter; the pages themselves are
/// not limited.
pub fn auth_routes() -> Router<AppState> {
    let limiter = auth_rate_limiter();

    Router::new()
        .route(
            "/login",
            post(auth::login)
                .layer(limiter.clone())
                .get(auth::login_page),
        )
        .route(
            "/register",
            post(auth::register)
                .layer(limiter.clone())
                .get(auth::register_page),
        )
        .route(
            "/forgot-password",
            post(auth::forgot_password)
                .layer(limiter)
                .get(auth::forgot_password_page),
        )
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the shop routes router.
pub fn shop_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(shops::index))
        .route("/{id}", get(shops::show))
}

/// Create the discount routes router.
pub fn discount_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(discounts::index))
        .route("/{id}/countdown", get(discounts::countdown))
}

/// Create the rewards routes router.
pub fn reward_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(rewards::index))
        .route("/{id}/redeem", post(rewards::redeem))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .layer(api_rate_limiter())
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::create))
        .route("/success", get(checkout::success))
        .route("/cancel", get(checkout::cancel))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/location/reverse", get(api::location::reverse))
        .layer(api_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/shops", shop_routes())
        .nest("/discounts", discount_routes())
        .nest("/rewards", reward_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/orders", order_routes())
        .nest("/auth", auth_routes())
        .nest("/api", api_routes())
}

/// Backend call context for the current request.
pub(crate) fn call_context<'a>(
    user: Option<&'a SessionUser>,
    request_id: &'a RequestId,
) -> CallContext<'a> {
    CallContext::new(user.map(|u| &u.token), Some(request_id.as_str()))
}

/// Previous/next links for a paginated listing.
#[derive(Debug, Clone, Default)]
pub struct Pagination {
    pub current: u32,
    pub total: u32,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

impl Pagination {
    /// Build links for `path`, carrying `params` (minus `page`) along.
    #[must_use]
    pub fn new(meta: &PageMeta, path: &str, params: &[(&str, String)]) -> Self {
        let link = |page: u32| {
            let mut query = form_urlencoded::Serializer::new(String::new());
            for (key, value) in params.iter().filter(|(_, v)| !v.is_empty()) {
                query.append_pair(key, value);
            }
            query.append_pair("page", &page.to_string());
            format!("{path}?{}", query.finish())
        };

        Self {
            current: meta.page,
            total: meta.total_pages(),
            prev_url: meta.has_previous().then(|| link(meta.page - 1)),
            next_url: meta.has_next().then(|| link(meta.page + 1)),
        }
    }

    /// Whether there is more than one page.
    #[must_use]
    pub const fn is_paginated(&self) -> bool {
        self.total > 1
    }
}

/// Split a comma-separated filter parameter into trimmed names.
pub(crate) fn split_names(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

/// Only same-site paths are accepted as post-action redirect targets.
pub(crate) fn local_redirect(target: Option<&str>, fallback: &str) -> String {
    match target {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_links_keep_filters() {
        let meta = PageMeta {
            page: 2,
            per_page: 10,
            total: 35,
        };
        let pagination = Pagination::new(
            &meta,
            "/products",
            &[("search", "red mug".to_string()), ("brand", String::new())],
        );
        assert_eq!(pagination.total, 4);
        assert_eq!(
            pagination.prev_url.as_deref(),
            Some("/products?search=red+mug&page=1")
        );
        assert_eq!(
            pagination.next_url.as_deref(),
            Some("/products?search=red+mug&page=3")
        );
        assert!(pagination.is_paginated());
    }

    #[test]
    fn test_split_names() {
        assert_eq!(
            split_names(Some(" Shoes, ,Hats ")),
            vec!["Shoes".to_string(), "Hats".to_string()]
        );
        assert!(split_names(None).is_empty());
    }

    #[test]
    fn test_local_redirect() {
        assert_eq!(local_redirect(Some("/products/3"), "/cart"), "/products/3");
        assert_eq!(local_redirect(Some("//evil.test"), "/cart"), "/cart");
        assert_eq!(local_redirect(Some("https://evil.test"), "/cart"), "/cart");
        assert_eq!(local_redirect(None, "/cart"), "/cart");
    }
}
