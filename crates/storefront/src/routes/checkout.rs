//! Checkout route handlers.
//!
//! `POST /checkout` asks the backend for a payment session and sends the
//! customer to the hosted payment page. The provider redirects back to
//! `/checkout/success` or `/checkout/cancel` with `?session_id=`.

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

use marketfront_core::{FulfillmentType, ShopId};

use super::call_context;
use super::orders::OrderDetail;
use crate::api::types::{Address, CheckoutRequest};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, RequestId, RequireAuth};
use crate::models::{Flash, PageContext, session_keys};
use crate::services::CheckoutService;
use crate::services::checkout::is_valid_session_token;
use crate::state::AppState;

/// Placeholder the payment provider replaces with the session token.
const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Checkout form data, posted from the cart page.
///
/// Numeric fields arrive as strings because empty inputs are submitted too.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutForm {
    pub fulfillment_type: String,
    pub shop_id: Option<String>,
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub discount_code: Option<String>,
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(String::from)
}

impl CheckoutForm {
    /// Validate the form into a backend request.
    ///
    /// Pickup needs a shop; delivery needs at least a street and city.
    fn into_request(self, base_url: &str) -> std::result::Result<CheckoutRequest, &'static str> {
        let base = base_url.trim_end_matches('/');
        let success_url = format!("{base}/checkout/success?session_id={SESSION_ID_PLACEHOLDER}");
        let cancel_url = format!("{base}/checkout/cancel?session_id={SESSION_ID_PLACEHOLDER}");
        let discount_code = non_empty(self.discount_code.as_ref());

        match self.fulfillment_type.as_str() {
            "pickup" => {
                let shop_id = non_empty(self.shop_id.as_ref())
                    .and_then(|id| id.parse().ok())
                    .map(ShopId::new)
                    .ok_or("Choose a shop to pick up from.")?;
                Ok(CheckoutRequest {
                    fulfillment_type: FulfillmentType::Pickup,
                    shop_id: Some(shop_id),
                    address: None,
                    discount_code,
                    success_url,
                    cancel_url,
                })
            }
            "delivery" => {
                let line1 = non_empty(self.line1.as_ref()).ok_or("Enter a delivery address.")?;
                let city = non_empty(self.city.as_ref()).ok_or("Enter a delivery city.")?;
                let coordinate = |v: Option<&String>| non_empty(v).and_then(|v| v.parse::<f64>().ok());
                Ok(CheckoutRequest {
                    fulfillment_type: FulfillmentType::Delivery,
                    shop_id: None,
                    address: Some(Address {
                        line1,
                        line2: non_empty(self.line2.as_ref()),
                        city,
                        postal_code: non_empty(self.postal_code.as_ref()),
                        lat: coordinate(self.lat.as_ref()),
                        lng: coordinate(self.lng.as_ref()),
                    }),
                    discount_code,
                    success_url,
                    cancel_url,
                })
            }
            _ => Err("Choose pickup or delivery."),
        }
    }
}

/// Create a payment session and redirect to the provider.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    request_id: RequestId,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Result<Redirect> {
    let request = match form.into_request(&state.config().base_url) {
        Ok(request) => request,
        Err(message) => {
            Flash::error(message).push(&session).await;
            return Ok(Redirect::to("/cart"));
        }
    };

    let ctx = call_context(Some(&user), &request_id);
    match CheckoutService::new(state.backend())
        .create_session(ctx, &request)
        .await
    {
        Ok(checkout) => {
            session
                .insert(session_keys::CHECKOUT_SESSION, &checkout.session_token)
                .await?;
            add_breadcrumb(
                "checkout",
                "Payment session created",
                Some(&[("fulfillment", request.fulfillment_type.as_str())]),
            );
            Ok(Redirect::to(&checkout.payment_url))
        }
        Err(e) if e.is_unauthorized() => Err(e.into()),
        Err(e) => {
            tracing::info!(error = %e, "Checkout rejected");
            Flash::error(e.user_message()).push(&session).await;
            Ok(Redirect::to("/cart"))
        }
    }
}

/// Payment provider redirect parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PaymentReturnQuery {
    pub session_id: Option<String>,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct CheckoutSuccessTemplate {
    pub page: PageContext,
    /// `None` while the backend is still confirming the payment.
    pub order: Option<OrderDetail>,
}

/// Payment cancellation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/cancel.html")]
pub struct CheckoutCancelTemplate {
    pub page: PageContext,
}

/// Show the order created by a completed payment.
///
/// The session token comes from the redirect, or from the session when the
/// provider did not pass it along.
#[instrument(skip_all)]
pub async fn success(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    request_id: RequestId,
    session: Session,
    page: PageContext,
    Query(query): Query<PaymentReturnQuery>,
) -> Result<CheckoutSuccessTemplate> {
    let stored: Option<String> = session
        .remove(session_keys::CHECKOUT_SESSION)
        .await
        .ok()
        .flatten();
    let token = query
        .session_id
        .filter(|t| is_valid_session_token(t))
        .or(stored.filter(|t| is_valid_session_token(t)))
        .ok_or_else(|| AppError::BadRequest("missing payment session".to_string()))?;

    let ctx = call_context(user.as_ref(), &request_id);
    let order = match CheckoutService::new(state.backend())
        .order_for_session(ctx, &token)
        .await
    {
        Ok(order) => Some(OrderDetail::new(&order, &state)),
        Err(e) if e.is_not_found() => None,
        Err(e) => return Err(e.into()),
    };

    Ok(CheckoutSuccessTemplate { page, order })
}

/// Release a cancelled payment session.
///
/// Sends exactly one cancel request when a token is present; a failure only
/// adds a flash and the page renders either way.
#[instrument(skip_all)]
pub async fn cancel(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    request_id: RequestId,
    session: Session,
    mut page: PageContext,
    Query(query): Query<PaymentReturnQuery>,
) -> CheckoutCancelTemplate {
    if let Err(e) = session
        .remove::<String>(session_keys::CHECKOUT_SESSION)
        .await
    {
        tracing::warn!(error = %e, "Failed to clear checkout session");
    }

    match query.session_id.as_deref() {
        Some(token) if is_valid_session_token(token) => {
            let ctx = call_context(user.as_ref(), &request_id);
            match CheckoutService::new(state.backend())
                .cancel_payment(ctx, token)
                .await
            {
                Ok(()) => page.flash(Flash::info("Your payment was cancelled. Your cart is unchanged.")),
                Err(e) => {
                    tracing::warn!(error = %e, "Payment cancellation failed");
                    page.flash(Flash::error(e.user_message()));
                }
            }
        }
        Some(_) => tracing::warn!("Ignoring malformed payment session token"),
        None => {}
    }

    CheckoutCancelTemplate { page }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://shop.example.com/";

    #[test]
    fn test_pickup_requires_shop() {
        let form = CheckoutForm {
            fulfillment_type: "pickup".to_string(),
            shop_id: Some(String::new()),
            ..CheckoutForm::default()
        };
        assert_eq!(form.into_request(BASE).err(), Some("Choose a shop to pick up from."));
    }

    #[test]
    fn test_delivery_request() {
        let form = CheckoutForm {
            fulfillment_type: "delivery".to_string(),
            line1: Some("1 Main St".to_string()),
            city: Some("Springfield".to_string()),
            lat: Some("40.5".to_string()),
            lng: Some(String::new()),
            discount_code: Some("  ".to_string()),
            ..CheckoutForm::default()
        };
        let request = form.into_request(BASE).ok();
        let request = request.as_ref();
        let address = request.and_then(|r| r.address.as_ref());
        assert_eq!(address.map(|a| a.city.as_str()), Some("Springfield"));
        assert_eq!(address.and_then(|a| a.lat), Some(40.5));
        assert_eq!(address.and_then(|a| a.lng), None);
        assert!(request.is_some_and(|r| r.discount_code.is_none()));
        assert_eq!(
            request.map(|r| r.success_url.as_str()),
            Some("https://shop.example.com/checkout/success?session_id={CHECKOUT_SESSION_ID}")
        );
    }

    #[test]
    fn test_unknown_fulfillment_rejected() {
        let form = CheckoutForm {
            fulfillment_type: "drone".to_string(),
            ..CheckoutForm::default()
        };
        assert!(form.into_request(BASE).is_err());
    }
}
