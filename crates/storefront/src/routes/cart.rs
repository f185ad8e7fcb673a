//! Cart route handlers.
//!
//! The cart lives in the backend, keyed by the customer's token. Mutations
//! are plain form posts that flash a result and redirect.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, extract::State, response::Redirect};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use marketfront_core::{CartItemId, FulfillmentType, ProductId, VariantId};

use super::call_context;
use super::shops::ShopView;
use crate::api::ApiError;
use crate::api::types::{Cart, CartItem};
use crate::error::Result;
use crate::filters;
use crate::middleware::{RequestId, RequireAuth};
use crate::models::{Flash, PageContext};
use crate::services::{CartService, ShopQuery, ShopService};
use crate::state::AppState;

/// Cart line display data.
#[derive(Clone)]
pub struct CartItemView {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub name: String,
    pub variant_name: Option<String>,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

impl CartItemView {
    fn new(item: &CartItem, state: &AppState) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            name: item.name.clone(),
            variant_name: item.variant_name.clone(),
            image_url: item.image_url.clone(),
            quantity: item.quantity,
            unit_price: state.format_price(item.unit_price),
            line_total: state.format_price(item.line_total()),
        }
    }
}

/// Cart display data.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub subtotal: String,
    /// Only set when a discount applies.
    pub discount_total: Option<String>,
    pub total: String,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, state: &AppState) -> Self {
        Self {
            items: cart
                .items
                .iter()
                .map(|item| CartItemView::new(item, state))
                .collect(),
            item_count: cart.item_count(),
            subtotal: state.format_price(cart.subtotal),
            discount_total: (!cart.discount_total.is_zero())
                .then(|| state.format_price(cart.discount_total)),
            total: state.format_price(cart.total),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: CartView,
    /// Shops offering pickup, for the checkout form.
    pub pickup_shops: Vec<ShopView>,
}

/// Display the cart with the checkout form.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    request_id: RequestId,
    mut page: PageContext,
) -> Result<CartShowTemplate> {
    let ctx = call_context(Some(&user), &request_id);
    let pickup = ShopQuery {
        near: None,
        fulfillment: Some(FulfillmentType::Pickup),
    };

    let carts = CartService::new(state.backend());
    let shops = ShopService::new(state.backend());
    let (cart, shops) = tokio::join!(carts.get(ctx), shops.list(ctx, &pickup));
    let cart = cart?;

    let pickup_shops = match shops {
        Ok(shops) => shops.iter().map(ShopView::from).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load pickup shops");
            if !cart.items.is_empty() {
                page.flash(Flash::info(
                    "Pickup locations are unavailable right now. Delivery still works.",
                ));
            }
            Vec::new()
        }
    };

    Ok(CartShowTemplate {
        page,
        cart: CartView::new(&cart, &state),
        pickup_shops,
    })
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: i64,
    /// Empty when the product has no variants.
    pub variant_id: Option<String>,
    pub quantity: Option<u32>,
}

impl AddToCartForm {
    fn variant_id(&self) -> Option<VariantId> {
        self.variant_id
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .and_then(|v| v.parse().ok())
            .map(VariantId::new)
    }
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub item_id: i64,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: i64,
}

/// Turn a failed cart mutation into a flash, or propagate an expired token.
async fn flash_failure(session: &Session, error: ApiError) -> Result<()> {
    if error.is_unauthorized() {
        return Err(error.into());
    }
    tracing::info!(error = %error, "Cart update rejected");
    Flash::error(error.user_message()).push(session).await;
    Ok(())
}

/// Add an item to the cart.
///
/// Success goes to the cart; a rejection (typically stock) returns to the
/// product page with the reason.
#[instrument(skip(state, user, request_id, session))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    request_id: RequestId,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect> {
    let ctx = call_context(Some(&user), &request_id);
    let product_id = ProductId::new(form.product_id);

    match CartService::new(state.backend())
        .add_item(ctx, product_id, form.variant_id(), form.quantity.unwrap_or(1))
        .await
    {
        Ok(_) => {
            Flash::success("Added to your cart.").push(&session).await;
            Ok(Redirect::to("/cart"))
        }
        Err(e) => {
            flash_failure(&session, e).await?;
            Ok(Redirect::to(&format!("/products/{product_id}")))
        }
    }
}

/// Change a cart line's quantity.
#[instrument(skip(state, user, request_id, session))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    request_id: RequestId,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Result<Redirect> {
    let ctx = call_context(Some(&user), &request_id);

    if let Err(e) = CartService::new(state.backend())
        .update_item(ctx, CartItemId::new(form.item_id), form.quantity)
        .await
    {
        flash_failure(&session, e).await?;
    }

    Ok(Redirect::to("/cart"))
}

/// Remove a cart line.
#[instrument(skip(state, user, request_id, session))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    request_id: RequestId,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Redirect> {
    let ctx = call_context(Some(&user), &request_id);

    match CartService::new(state.backend())
        .remove_item(ctx, CartItemId::new(form.item_id))
        .await
    {
        Ok(_) => Flash::info("Item removed.").push(&session).await,
        Err(e) => flash_failure(&session, e).await?,
    }

    Ok(Redirect::to("/cart"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(variant_id: Option<&str>) -> AddToCartForm {
        AddToCartForm {
            product_id: 7,
            variant_id: variant_id.map(String::from),
            quantity: None,
        }
    }

    #[test]
    fn test_variant_id_parsing() {
        assert_eq!(form(Some("12")).variant_id(), Some(VariantId::new(12)));
        assert_eq!(form(Some("")).variant_id(), None);
        assert_eq!(form(Some("abc")).variant_id(), None);
        assert_eq!(form(None).variant_id(), None);
    }
}
