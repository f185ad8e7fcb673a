//! Cart service.
//!
//! The cart lives on the backend, keyed by the customer's token. Every
//! mutation returns the updated cart so pages can re-render without a second
//! round trip.

use tracing::instrument;

use marketfront_core::{CartItemId, ProductId, VariantId};

use crate::api::types::{AddCartItem, Cart, UpdateCartItem};
use crate::api::{ApiError, BackendClient, CallContext};

/// Largest quantity accepted for one line.
pub const MAX_LINE_QUANTITY: u32 = 99;

pub struct CartService<'a> {
    client: &'a BackendClient,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(client: &'a BackendClient) -> Self {
        Self { client }
    }

    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self, ctx))]
    pub async fn get(&self, ctx: CallContext<'_>) -> Result<Cart, ApiError> {
        self.client.get("/cart", &[], ctx).await
    }

    /// Add a product (or one of its variants) to the cart.
    ///
    /// # Errors
    ///
    /// Returns the backend error; stock shortages arrive as `ApiError::Api`.
    #[instrument(skip(self, ctx))]
    pub async fn add_item(
        &self,
        ctx: CallContext<'_>,
        product_id: ProductId,
        variant_id: Option<VariantId>,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        let body = AddCartItem {
            product_id,
            variant_id,
            quantity: quantity.clamp(1, MAX_LINE_QUANTITY),
        };
        self.client.post("/cart/items", &body, ctx).await
    }

    /// Change a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self, ctx))]
    pub async fn update_item(
        &self,
        ctx: CallContext<'_>,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        if quantity == 0 {
            return self.remove_item(ctx, item_id).await;
        }
        let body = UpdateCartItem {
            quantity: quantity.min(MAX_LINE_QUANTITY),
        };
        self.client
            .patch(&format!("/cart/items/{item_id}"), &body, ctx)
            .await
    }

    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self, ctx))]
    pub async fn remove_item(
        &self,
        ctx: CallContext<'_>,
        item_id: CartItemId,
    ) -> Result<Cart, ApiError> {
        self.client
            .delete(&format!("/cart/items/{item_id}"), ctx)
            .await
    }
}
