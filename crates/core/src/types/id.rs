//! Newtype IDs for type-safe references to backend entities.
//!
//! The backend owns every entity; the storefront only carries their IDs
//! between pages and API calls. `define_id!` keeps a `ShopId` from being
//! passed where a `ProductId` is expected.

/// Macro to define a type-safe backend ID wrapper.
///
/// Creates a newtype wrapper around `i64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - `new()`, `get()`, `Display` and `FromStr`
/// - `From<i64>` and `Into<i64>` implementations
///
/// # Example
///
/// ```rust
/// # use marketfront_core::define_id;
/// define_id!(ShopId);
/// define_id!(OrderId);
///
/// let shop = ShopId::new(7);
/// assert_eq!(shop.to_string(), "7");
/// assert_eq!("7".parse::<ShopId>().ok(), Some(shop));
///
/// // Different types, so this won't compile:
/// // let _: ShopId = OrderId::new(7);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from the backend's numeric value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying numeric value.
            #[must_use]
            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(UserId);
define_id!(ProductId);
define_id!(VariantId);
define_id!(CategoryId);
define_id!(BrandId);
define_id!(ShopId);
define_id!(WarehouseId);
define_id!(DiscountId);
define_id!(RewardId);
define_id!(OrderId);
define_id!(CartItemId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_is_transparent_in_json() {
        let id = ProductId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");

        let parsed: ProductId = serde_json::from_str("42").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_id_from_str_trims() {
        assert_eq!(" 15 ".parse::<ShopId>().unwrap(), ShopId::new(15));
        assert!("shop-15".parse::<ShopId>().is_err());
    }

    #[test]
    fn test_id_conversions() {
        let id = OrderId::from(9_i64);
        assert_eq!(i64::from(id), 9);
        assert_eq!(id.get(), 9);
    }
}
