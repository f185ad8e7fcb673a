//! Checkout and payment session service.
//!
//! The backend creates a payment session and returns a hosted payment URL.
//! The payment provider sends the customer back to `/checkout/success` or
//! `/checkout/cancel` with the session token in the query string.

use tracing::instrument;

use crate::api::types::{CancelPayment, CheckoutRequest, CheckoutSession, Order};
use crate::api::{ApiError, BackendClient, CallContext};

/// Longest session token accepted from a redirect.
const MAX_SESSION_TOKEN_LEN: usize = 255;

/// Whether a token from the query string is safe to forward.
///
/// Tokens end up in a backend URL path, so only URL-safe characters pass.
#[must_use]
pub fn is_valid_session_token(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= MAX_SESSION_TOKEN_LEN
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

pub struct CheckoutService<'a> {
    client: &'a BackendClient,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(client: &'a BackendClient) -> Self {
        Self { client }
    }

    /// Turn the customer's cart into a payment session.
    ///
    /// # Errors
    ///
    /// Returns the backend error; stock and discount problems arrive as
    /// `ApiError::Api` with a message fit for `user_message()`.
    #[instrument(skip(self, ctx, request), fields(fulfillment = %request.fulfillment_type))]
    pub async fn create_session(
        &self,
        ctx: CallContext<'_>,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, ApiError> {
        self.client.post("/checkout", request, ctx).await
    }

    /// Tell the backend the customer abandoned payment.
    ///
    /// Sent exactly once per visit to the cancel page. There is no retry and
    /// no idempotency key; the backend treats repeated cancels as no-ops.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self, ctx, session_token))]
    pub async fn cancel_payment(
        &self,
        ctx: CallContext<'_>,
        session_token: &str,
    ) -> Result<(), ApiError> {
        self.client
            .post_no_content("/payments/cancel", &CancelPayment { session_token }, ctx)
            .await
    }

    /// The order created by a completed payment session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` while the backend has not yet recorded it.
    #[instrument(skip(self, ctx, session_token))]
    pub async fn order_for_session(
        &self,
        ctx: CallContext<'_>,
        session_token: &str,
    ) -> Result<Order, ApiError> {
        self.client
            .get(&format!("/payments/{session_token}/order"), &[], ctx)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_token_validation() {
        assert!(is_valid_session_token("cs_test_a1B2c3"));
        assert!(is_valid_session_token("3f0c-9a.b_1"));
        assert!(!is_valid_session_token(""));
        assert!(!is_valid_session_token("../admin"));
        assert!(!is_valid_session_token("tok en"));
        assert!(!is_valid_session_token(&"a".repeat(256)));
    }
}
