//! Discount service.

use tracing::instrument;

use marketfront_core::DiscountId;

use crate::api::types::Discount;
use crate::api::{ApiError, BackendClient, CallContext};

pub struct DiscountService<'a> {
    client: &'a BackendClient,
}

impl<'a> DiscountService<'a> {
    #[must_use]
    pub const fn new(client: &'a BackendClient) -> Self {
        Self { client }
    }

    /// Discounts that are currently running.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self, ctx))]
    pub async fn list_active(&self, ctx: CallContext<'_>) -> Result<Vec<Discount>, ApiError> {
        self.client
            .get("/discounts", &[("active", "true".to_string())], ctx)
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown ids.
    #[instrument(skip(self, ctx))]
    pub async fn get(&self, ctx: CallContext<'_>, id: DiscountId) -> Result<Discount, ApiError> {
        self.client.get(&format!("/discounts/{id}"), &[], ctx).await
    }
}
