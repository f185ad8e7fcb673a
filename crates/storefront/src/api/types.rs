//! Data shapes exchanged with the backend.
//!
//! These mirror the backend's JSON. The storefront never owns their
//! lifecycle; they are fetched per request and turned into view structs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use marketfront_core::{
    BrandId, CartItemId, CategoryId, Countdown, DiscountId, FulfillmentType, OrderId, OrderStatus,
    PaymentStatus, ProductId, RewardId, ShopId, UserId, VariantId, WarehouseId,
};

// =============================================================================
// Pagination
// =============================================================================

/// Pagination block returned alongside list responses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

impl PageMeta {
    /// Number of pages, at least one.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 1;
        }
        let pages = self.total.div_ceil(u64::from(self.per_page));
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// A page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

// =============================================================================
// Users & Auth
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub points: i64,
}

/// Response to a successful login or registration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordRequest<'a> {
    pub email: &'a str,
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: VariantId,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub compare_at_price: Option<Decimal>,
    #[serde(default)]
    pub stock: u32,
}

impl ProductVariant {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub compare_at_price: Option<Decimal>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub brand: Option<Brand>,
    #[serde(default)]
    pub shop_id: Option<ShopId>,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
}

impl Product {
    /// Whether any variant can be bought.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.variants.is_empty() || self.variants.iter().any(ProductVariant::in_stock)
    }
}

// =============================================================================
// Shops
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shop {
    pub id: ShopId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    /// Distance from the requested coordinates, when given.
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub fulfillment_types: Vec<FulfillmentType>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub fulfillment_types: Vec<FulfillmentType>,
}

// =============================================================================
// Discounts & Rewards
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Percentage,
    FixedAmount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discount {
    pub id: DiscountId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    pub kind: DiscountKind,
    pub value: Decimal,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

impl Discount {
    /// Countdown to the end of the discount window, if it has one.
    #[must_use]
    pub fn countdown(&self) -> Option<Countdown> {
        self.ends_at.map(Countdown::new)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reward {
    pub id: RewardId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub points_cost: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardSummary {
    pub points: i64,
    #[serde(default)]
    pub rewards: Vec<Reward>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Redemption {
    #[serde(default)]
    pub code: Option<String>,
    pub remaining_points: i64,
}

// =============================================================================
// Cart & Checkout
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    pub name: String,
    #[serde(default)]
    pub variant_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl CartItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub subtotal: Decimal,
    #[serde(default)]
    pub discount_total: Decimal,
    #[serde(default)]
    pub total: Decimal,
}

impl Cart {
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

#[derive(Debug, Serialize)]
pub struct AddCartItem {
    pub product_id: ProductId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct UpdateCartItem {
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutRequest {
    pub fulfillment_type: FulfillmentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop_id: Option<ShopId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_code: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
}

/// A payment session created by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub session_token: String,
    pub payment_url: String,
}

#[derive(Debug, Serialize)]
pub struct CancelPayment<'a> {
    pub session_token: &'a str,
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub status: OrderStatus,
    #[serde(default = "unknown_payment")]
    pub payment_status: PaymentStatus,
    pub total: Decimal,
    pub item_count: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    #[serde(default)]
    pub variant_name: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    #[serde(default = "unknown_payment")]
    pub payment_status: PaymentStatus,
    pub fulfillment_type: FulfillmentType,
    #[serde(default)]
    pub shop: Option<Shop>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    #[serde(default)]
    pub discount_total: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

const fn unknown_payment() -> PaymentStatus {
    PaymentStatus::Unknown
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_meta() {
        let meta = PageMeta {
            page: 2,
            per_page: 10,
            total: 25,
        };
        assert_eq!(meta.total_pages(), 3);
        assert!(meta.has_next());
        assert!(meta.has_previous());

        let empty = PageMeta {
            page: 1,
            per_page: 10,
            total: 0,
        };
        assert_eq!(empty.total_pages(), 1);
        assert!(!empty.has_next());
    }

    #[test]
    fn test_product_deserializes_minimal() {
        let json = r#"{"id": 7, "name": "Tote Bag", "price": "19.99"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id.get(), 7);
        assert!(product.variants.is_empty());
        assert!(product.is_available());
    }

    #[test]
    fn test_product_availability_follows_variants() {
        let json = r#"{
            "id": 1, "name": "Mug", "price": "8",
            "variants": [{"id": 2, "name": "Blue", "price": "8", "stock": 0}]
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert!(!product.is_available());
    }

    #[test]
    fn test_cart_totals() {
        let json = r#"{
            "items": [
                {"id": 1, "product_id": 3, "name": "Mug", "unit_price": "8.50", "quantity": 2},
                {"id": 2, "product_id": 4, "name": "Tee", "unit_price": "20", "quantity": 1}
            ],
            "subtotal": "37", "total": "37"
        }"#;
        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.items[0].line_total(), Decimal::new(17, 0));
    }

    #[test]
    fn test_order_tolerates_unknown_status() {
        let json = r#"{
            "id": 9, "status": "on_hold", "total": "10", "item_count": 1,
            "created_at": "2026-10-01T12:00:00Z"
        }"#;
        let order: OrderSummary = serde_json::from_str(json).unwrap();
        assert_eq!(order.status, OrderStatus::Unknown);
        assert_eq!(order.payment_status, PaymentStatus::Unknown);
    }

    #[test]
    fn test_checkout_request_skips_empty_fields() {
        let request = CheckoutRequest {
            fulfillment_type: FulfillmentType::Pickup,
            shop_id: Some(ShopId::new(3)),
            address: None,
            discount_code: None,
            success_url: "https://shop.test/checkout/success".to_string(),
            cancel_url: "https://shop.test/checkout/cancel".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["fulfillment_type"], "pickup");
        assert!(json.get("address").is_none());
        assert!(json.get("discount_code").is_none());
    }
}
