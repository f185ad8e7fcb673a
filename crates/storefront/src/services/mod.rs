//! Thin wrappers over backend endpoints.
//!
//! Each service borrows the shared `BackendClient`, forwards one request per
//! operation, and returns backend DTOs. Services are built per request:
//!
//! ```rust,ignore
//! let products = ProductService::new(state.backend())
//!     .list(ctx, &ProductQuery::default())
//!     .await?;
//! ```
//!
//! # Services
//!
//! - `auth` - Login, registration, logout, password reset
//! - `products` - Catalog listing, detail, categories, brands
//! - `shops` - Shop discovery and warehouses
//! - `discounts` / `rewards` - Active discounts, loyalty points
//! - `cart` / `checkout` / `orders` - Purchasing flow
//! - `geolocation` - Third-party IP lookup and reverse geocoding
//! - `filter_mapping` - Cached filter name to ID tables
//! - `countdown` - Discount countdown ticker

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod countdown;
pub mod discounts;
pub mod filter_mapping;
pub mod geolocation;
pub mod orders;
pub mod products;
pub mod rewards;
pub mod shops;

pub use auth::{AuthError, AuthService};
pub use cart::CartService;
pub use checkout::CheckoutService;
pub use discounts::DiscountService;
pub use filter_mapping::{FilterLoadError, FilterMappingCache, ResolvedIds};
pub use geolocation::{Coordinates, GeolocationService};
pub use orders::OrderService;
pub use products::{ProductQuery, ProductService, ProductSort};
pub use rewards::RewardService;
pub use shops::{ShopQuery, ShopService};
