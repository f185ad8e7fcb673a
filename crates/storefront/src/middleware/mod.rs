//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction capture)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions, in-memory store)
//! 5. Session expiry (flush sessions the backend stopped accepting)
//! 6. Error pages (re-render with the customer's layout)
//! 7. Security headers (CSP, frame and referrer policies)
//! 8. Rate limiting (governor, per route group)

pub mod auth;
pub mod error_page;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    OptionalAuth, RequireAuth, clear_current_user, expire_session_middleware, set_current_user,
};
pub use error_page::error_page_middleware;
pub use rate_limit::{ClientIp, api_rate_limiter, auth_rate_limiter, client_ip};
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
