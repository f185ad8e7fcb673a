//! Loyalty rewards service.

use tracing::instrument;

use marketfront_core::RewardId;

use crate::api::types::{Redemption, RewardSummary};
use crate::api::{ApiError, BackendClient, CallContext};

/// Loyalty points and rewards. Every call needs a signed-in customer.
pub struct RewardService<'a> {
    client: &'a BackendClient,
}

impl<'a> RewardService<'a> {
    #[must_use]
    pub const fn new(client: &'a BackendClient) -> Self {
        Self { client }
    }

    /// The customer's points balance and the rewards on offer.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self, ctx))]
    pub async fn summary(&self, ctx: CallContext<'_>) -> Result<RewardSummary, ApiError> {
        self.client.get("/rewards", &[], ctx).await
    }

    /// Spend points on a reward.
    ///
    /// # Errors
    ///
    /// Returns the backend error; "not enough points" arrives as
    /// `ApiError::Api` and reads well through `user_message()`.
    #[instrument(skip(self, ctx))]
    pub async fn redeem(&self, ctx: CallContext<'_>, id: RewardId) -> Result<Redemption, ApiError> {
        self.client
            .post(&format!("/rewards/{id}/redeem"), &serde_json::json!({}), ctx)
            .await
    }
}
