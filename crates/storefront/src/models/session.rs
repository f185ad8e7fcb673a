//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use marketfront_core::UserId;

use crate::api::types::AuthSession;
use crate::api::{AuthToken, CallContext};

/// Session-stored customer identity.
///
/// Holds the backend access token; it never reaches the browser, which only
/// sees the opaque session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub token: AuthToken,
}

impl SessionUser {
    /// Call context acting on behalf of this customer.
    #[must_use]
    pub fn context<'a>(&'a self, request_id: Option<&'a str>) -> CallContext<'a> {
        CallContext::new(Some(&self.token), request_id)
    }

    /// First word of the display name, for greetings.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

impl From<AuthSession> for SessionUser {
    fn from(session: AuthSession) -> Self {
        Self {
            id: session.user.id,
            name: session.user.name,
            email: session.user.email,
            token: AuthToken::new(session.token),
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in customer.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for queued flash notifications.
    pub const FLASHES: &str = "flashes";

    /// Key for the payment session token of the checkout in progress.
    pub const CHECKOUT_SESSION: &str = "checkout_session";
}
