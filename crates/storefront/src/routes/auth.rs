//! Authentication route handlers.
//!
//! Login, registration and password reset are forwarded to the backend. The
//! returned access token is kept in the server-side session only.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::local_redirect;
use crate::api::CallContext;
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, RequestId, clear_current_user, set_current_user};
use crate::models::{Flash, PageContext, SessionUser};
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    /// Same-site path to return to after login.
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// Login page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    /// Set when the previous session's token was rejected.
    pub expired: Option<String>,
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub next: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
}

/// Forgot password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub page: PageContext,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(mut page: PageContext, Query(query): Query<LoginQuery>) -> LoginTemplate {
    if query.expired.is_some() {
        page.flash(Flash::info("Your session has expired. Please sign in again."));
    }

    LoginTemplate {
        page,
        next: local_redirect(query.next.as_deref(), "/"),
    }
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    request_id: RequestId,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect> {
    let ctx = CallContext::new(None, Some(request_id.as_str()));

    match AuthService::new(state.backend())
        .login(&form.email, &form.password, ctx)
        .await
    {
        Ok(auth) => {
            let user = SessionUser::from(auth);
            set_current_user(&session, &user).await?;
            add_breadcrumb("auth", "Signed in", None);
            Flash::success(format!("Welcome back, {}!", user.first_name()))
                .push(&session)
                .await;
            Ok(Redirect::to(&local_redirect(form.next.as_deref(), "/")))
        }
        Err(e) => {
            log_auth_failure("Login", &e);
            Flash::error(e.user_message()).push(&session).await;
            Ok(Redirect::to("/auth/login"))
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(page: PageContext) -> RegisterTemplate {
    RegisterTemplate { page }
}

/// Handle registration form submission.
///
/// The backend signs the new customer in straight away.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    request_id: RequestId,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Redirect> {
    if form.password != form.password_confirm {
        Flash::error("Passwords do not match.").push(&session).await;
        return Ok(Redirect::to("/auth/register"));
    }

    let ctx = CallContext::new(None, Some(request_id.as_str()));
    match AuthService::new(state.backend())
        .register(&form.name, &form.email, &form.password, ctx)
        .await
    {
        Ok(auth) => {
            let user = SessionUser::from(auth);
            set_current_user(&session, &user).await?;
            add_breadcrumb("auth", "Registered", None);
            Flash::success(format!("Welcome, {}! Your account is ready.", user.first_name()))
                .push(&session)
                .await;
            Ok(Redirect::to("/"))
        }
        Err(e) => {
            log_auth_failure("Registration", &e);
            Flash::error(e.user_message()).push(&session).await;
            Ok(Redirect::to("/auth/register"))
        }
    }
}

// =============================================================================
// Password Reset Routes
// =============================================================================

/// Display the forgot password page.
pub async fn forgot_password_page(page: PageContext) -> ForgotPasswordTemplate {
    ForgotPasswordTemplate { page }
}

/// Handle forgot password form submission.
///
/// Always reports success for a well-formed address so the form cannot be
/// used to find out which emails have accounts.
#[instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    request_id: RequestId,
    session: Session,
    Form(form): Form<ForgotPasswordForm>,
) -> Redirect {
    let ctx = CallContext::new(None, Some(request_id.as_str()));
    let flash = match AuthService::new(state.backend())
        .forgot_password(&form.email, ctx)
        .await
    {
        Err(e @ AuthError::InvalidEmail(_)) => Flash::error(e.user_message()),
        result => {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Password recovery request failed");
            }
            Flash::success("If an account exists for that email, a reset link is on its way.")
        }
    };
    flash.push(&session).await;

    Redirect::to("/auth/forgot-password")
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
///
/// The backend token is revoked best effort; the local session is always
/// discarded.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    request_id: RequestId,
    session: Session,
) -> Result<Redirect> {
    if let Some(user) = &user {
        AuthService::new(state.backend())
            .logout(user.context(Some(request_id.as_str())))
            .await;
    }

    clear_current_user(&session).await?;
    Flash::info("You have been signed out.").push(&session).await;

    Ok(Redirect::to("/"))
}

fn log_auth_failure(action: &str, error: &AuthError) {
    match error {
        AuthError::Api(e) => tracing::warn!(error = %e, "{action} failed"),
        other => tracing::info!(reason = %other, "{action} rejected"),
    }
}
