//! Order history route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use tracing::instrument;

use marketfront_core::OrderId;
use marketfront_core::format::{format_date, format_date_time};

use super::{Pagination, call_context};
use crate::api::types::{Order, OrderItem, OrderSummary};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequestId, RequireAuth};
use crate::models::PageContext;
use crate::services::OrderService;
use crate::state::AppState;

/// Order history row.
#[derive(Clone)]
pub struct OrderRow {
    pub id: OrderId,
    pub date: String,
    pub status: &'static str,
    pub payment_status: &'static str,
    pub item_count: u32,
    pub total: String,
    pub open: bool,
}

impl OrderRow {
    fn new(order: &OrderSummary, state: &AppState) -> Self {
        Self {
            id: order.id,
            date: format_date(order.created_at),
            status: order.status.label(),
            payment_status: order.payment_status.label(),
            item_count: order.item_count,
            total: state.format_price(order.total),
            open: order.status.is_open(),
        }
    }
}

/// Order line display data.
#[derive(Clone)]
pub struct OrderItemView {
    pub name: String,
    pub variant_name: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
}

impl OrderItemView {
    fn new(item: &OrderItem, state: &AppState) -> Self {
        Self {
            name: item.name.clone(),
            variant_name: item.variant_name.clone(),
            quantity: item.quantity,
            unit_price: state.format_price(item.unit_price),
        }
    }
}

/// Full order display data, shared with the checkout confirmation page.
#[derive(Clone)]
pub struct OrderDetail {
    pub id: OrderId,
    pub placed_at: String,
    pub status: &'static str,
    pub payment_status: &'static str,
    pub fulfillment: &'static str,
    /// Pickup shop name or delivery address, whichever applies.
    pub destination: Option<String>,
    pub items: Vec<OrderItemView>,
    pub subtotal: String,
    pub discount_total: Option<String>,
    pub total: String,
}

impl OrderDetail {
    #[must_use]
    pub fn new(order: &Order, state: &AppState) -> Self {
        let destination = order.shop.as_ref().map(|s| s.name.clone()).or_else(|| {
            order.address.as_ref().map(|a| {
                [Some(a.line1.as_str()), a.line2.as_deref(), Some(a.city.as_str())]
                    .into_iter()
                    .flatten()
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
        });

        Self {
            id: order.id,
            placed_at: format_date_time(order.created_at),
            status: order.status.label(),
            payment_status: order.payment_status.label(),
            fulfillment: order.fulfillment_type.label(),
            destination,
            items: order
                .items
                .iter()
                .map(|item| OrderItemView::new(item, state))
                .collect(),
            subtotal: state.format_price(order.subtotal),
            discount_total: (!order.discount_total.is_zero())
                .then(|| state.format_price(order.discount_total)),
            total: state.format_price(order.total),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    pub page: Option<u32>,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub page: PageContext,
    pub orders: Vec<OrderRow>,
    pub pagination: Pagination,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub page: PageContext,
    pub order: OrderDetail,
}

/// Display the customer's order history.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    request_id: RequestId,
    page: PageContext,
    Query(query): Query<OrdersQuery>,
) -> Result<OrdersIndexTemplate> {
    let ctx = call_context(Some(&user), &request_id);
    let listing = OrderService::new(state.backend())
        .list(ctx, query.page.unwrap_or(1).max(1))
        .await?;

    Ok(OrdersIndexTemplate {
        page,
        orders: listing
            .data
            .iter()
            .map(|o| OrderRow::new(o, &state))
            .collect(),
        pagination: Pagination::new(&listing.meta, "/orders", &[]),
    })
}

/// Display one order.
#[instrument(skip(state, user, request_id, page))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    request_id: RequestId,
    page: PageContext,
    Path(id): Path<i64>,
) -> Result<OrderShowTemplate> {
    let ctx = call_context(Some(&user), &request_id);
    let order = OrderService::new(state.backend())
        .get(ctx, OrderId::new(id))
        .await
        .map_err(|e| {
            if e.is_not_found() {
                AppError::NotFound(format!("order {id}"))
            } else {
                AppError::Api(e)
            }
        })?;

    Ok(OrderShowTemplate {
        page,
        order: OrderDetail::new(&order, &state),
    })
}
