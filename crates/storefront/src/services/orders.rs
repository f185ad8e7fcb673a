//! Order history service.

use tracing::instrument;

use marketfront_core::OrderId;

use crate::api::types::{Order, OrderSummary, Page};
use crate::api::{ApiError, BackendClient, CallContext};

/// Orders shown per history page.
pub const ORDERS_PER_PAGE: u32 = 10;

pub struct OrderService<'a> {
    client: &'a BackendClient,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(client: &'a BackendClient) -> Self {
        Self { client }
    }

    /// The customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self, ctx))]
    pub async fn list(
        &self,
        ctx: CallContext<'_>,
        page: u32,
    ) -> Result<Page<OrderSummary>, ApiError> {
        let query = [
            ("page", page.max(1).to_string()),
            ("per_page", ORDERS_PER_PAGE.to_string()),
        ];
        self.client.get("/orders", &query, ctx).await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown ids or other customers' orders.
    #[instrument(skip(self, ctx))]
    pub async fn get(&self, ctx: CallContext<'_>, id: OrderId) -> Result<Order, ApiError> {
        self.client.get(&format!("/orders/{id}"), &[], ctx).await
    }
}
