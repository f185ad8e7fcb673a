//! Authentication service.
//!
//! The backend owns accounts and credentials; this service validates form
//! input, forwards it, and maps the backend's answers to `AuthError`.

mod error;

pub use error::AuthError;

use tracing::instrument;

use marketfront_core::Email;

use crate::api::types::{AuthSession, ForgotPasswordRequest, LoginRequest, RegisterRequest};
use crate::api::{ApiError, BackendClient, CallContext};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
pub struct AuthService<'a> {
    client: &'a BackendClient,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(client: &'a BackendClient) -> Self {
        Self { client }
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the backend rejects them.
    #[instrument(skip(self, password, ctx))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        ctx: CallContext<'_>,
    ) -> Result<AuthSession, AuthError> {
        let email = Email::parse(email)?;
        if password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let body = LoginRequest {
            email: email.as_str(),
            password,
        };

        self.client
            .post("/auth/login", &body, ctx.without_token())
            .await
            .map_err(|e| match e {
                ApiError::Unauthorized => AuthError::InvalidCredentials,
                ApiError::Api { status: 400, .. } => AuthError::InvalidCredentials,
                other => AuthError::Api(other),
            })
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserAlreadyExists` if the email is taken.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    #[instrument(skip(self, password, ctx))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        ctx: CallContext<'_>,
    ) -> Result<AuthSession, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }
        let email = Email::parse(email)?;
        validate_password(password)?;

        let body = RegisterRequest {
            name,
            email: email.as_str(),
            password,
        };

        self.client
            .post("/auth/register", &body, ctx.without_token())
            .await
            .map_err(|e| match e {
                ApiError::Api { status: 409, .. } => AuthError::UserAlreadyExists,
                other => AuthError::Api(other),
            })
    }

    /// Revoke the caller's token on the backend.
    ///
    /// Best effort: the local session is cleared regardless, so failures are
    /// only logged.
    #[instrument(skip(self, ctx))]
    pub async fn logout(&self, ctx: CallContext<'_>) {
        if ctx.token.is_none() {
            return;
        }
        if let Err(e) = self
            .client
            .post_no_content("/auth/logout", &serde_json::json!({}), ctx)
            .await
        {
            tracing::warn!(error = %e, "Backend logout failed");
        }
    }

    /// Ask the backend to send a password reset email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for malformed input. An unknown
    /// email is not an error, so account existence is not revealed.
    #[instrument(skip(self, ctx))]
    pub async fn forgot_password(&self, email: &str, ctx: CallContext<'_>) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        let body = ForgotPasswordRequest {
            email: email.as_str(),
        };

        match self
            .client
            .post_no_content("/auth/forgot-password", &body, ctx.without_token())
            .await
        {
            Ok(()) | Err(ApiError::NotFound(_)) => Ok(()),
            Err(e) => Err(AuthError::Api(e)),
        }
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}
