//! Shop discovery route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use tracing::instrument;

use marketfront_core::{FulfillmentType, ShopId};

use super::call_context;
use super::products::ProductCard;
use crate::api::types::{Shop, Warehouse};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{ClientIp, OptionalAuth, RequestId};
use crate::models::{Flash, PageContext};
use crate::services::{Coordinates, ProductQuery, ProductService, ShopQuery, ShopService};
use crate::state::AppState;

/// Shop display data.
#[derive(Clone)]
pub struct ShopView {
    pub id: ShopId,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub image_url: Option<String>,
    /// e.g. `2.4 km away`.
    pub distance: Option<String>,
    /// e.g. `Pickup · Delivery`.
    pub fulfillment: String,
}

impl From<&Shop> for ShopView {
    fn from(shop: &Shop) -> Self {
        Self {
            id: shop.id,
            name: shop.name.clone(),
            description: shop.description.clone(),
            address: shop.address.clone(),
            image_url: shop.image_url.clone(),
            distance: shop.distance_km.map(format_distance),
            fulfillment: fulfillment_label(&shop.fulfillment_types),
        }
    }
}

/// Warehouse display data.
#[derive(Clone)]
pub struct WarehouseView {
    pub name: String,
    pub address: Option<String>,
    pub fulfillment: String,
}

impl From<&Warehouse> for WarehouseView {
    fn from(warehouse: &Warehouse) -> Self {
        Self {
            name: warehouse.name.clone(),
            address: warehouse.address.clone(),
            fulfillment: fulfillment_label(&warehouse.fulfillment_types),
        }
    }
}

fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{:.0} m away", (km * 1000.0).round())
    } else {
        format!("{km:.1} km away")
    }
}

fn fulfillment_label(types: &[FulfillmentType]) -> String {
    types
        .iter()
        .map(|t| t.label())
        .collect::<Vec<_>>()
        .join(" · ")
}

/// Shop listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ShopsQuery {
    /// `me` to sort by distance from the visitor's IP location.
    pub near: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub fulfillment: Option<String>,
}

/// Shop listing template.
#[derive(Template, WebTemplate)]
#[template(path = "shops/index.html")]
pub struct ShopsIndexTemplate {
    pub page: PageContext,
    pub shops: Vec<ShopView>,
    pub near_me: bool,
    pub located_city: Option<String>,
    pub fulfillment: &'static str,
}

/// Shop detail template.
#[derive(Template, WebTemplate)]
#[template(path = "shops/show.html")]
pub struct ShopShowTemplate {
    pub page: PageContext,
    pub shop: ShopView,
    pub warehouses: Vec<WarehouseView>,
    pub products: Vec<ProductCard>,
}

fn parse_fulfillment(value: Option<&str>) -> Option<FulfillmentType> {
    match value.map(str::trim) {
        Some("pickup") => Some(FulfillmentType::Pickup),
        Some("delivery") => Some(FulfillmentType::Delivery),
        _ => None,
    }
}

/// Display shops, optionally nearest first.
///
/// `?near=me` locates the visitor by IP through the geolocation service;
/// explicit `lat`/`lng` take precedence. A failed lookup falls back to the
/// unsorted listing.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    request_id: RequestId,
    ClientIp(client_ip): ClientIp,
    mut page: PageContext,
    Query(query): Query<ShopsQuery>,
) -> Result<ShopsIndexTemplate> {
    let ctx = call_context(user.as_ref(), &request_id);
    let fulfillment = parse_fulfillment(query.fulfillment.as_deref());
    let near_me = query.near.as_deref() == Some("me");

    let mut near = query.lat.zip(query.lng).and_then(|(lat, lng)| Coordinates::new(lat, lng));
    let mut located_city = None;

    if near.is_none() && near_me {
        let located = match client_ip {
            Some(ip) => state.geolocation().locate_ip(ip).await,
            None => Ok(None),
        };
        match located {
            Ok(Some(location)) => {
                near = Some(location.coordinates);
                located_city = location.city;
            }
            Ok(None) => page.flash(Flash::info(
                "We couldn't determine your location, so shops are shown unsorted.",
            )),
            Err(e) => {
                tracing::warn!(error = %e, "IP geolocation failed");
                page.flash(Flash::info(
                    "Location lookup is unavailable right now, so shops are shown unsorted.",
                ));
            }
        }
    }

    let shops = ShopService::new(state.backend())
        .list(ctx, &ShopQuery { near, fulfillment })
        .await?;

    Ok(ShopsIndexTemplate {
        page,
        shops: shops.iter().map(ShopView::from).collect(),
        near_me: near.is_some(),
        located_city,
        fulfillment: fulfillment.map_or("", FulfillmentType::as_str),
    })
}

/// Display a shop with its warehouses and products.
#[instrument(skip(state, user, request_id, page))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    request_id: RequestId,
    page: PageContext,
    Path(id): Path<i64>,
) -> Result<ShopShowTemplate> {
    let ctx = call_context(user.as_ref(), &request_id);
    let shop_id = ShopId::new(id);
    let shops = ShopService::new(state.backend());
    let products = ProductService::new(state.backend());
    let product_query = ProductQuery {
        shop_id: Some(shop_id),
        ..ProductQuery::default()
    };

    let (shop, warehouses, listing) = tokio::try_join!(
        shops.get(ctx, shop_id),
        shops.warehouses(ctx, shop_id),
        products.list(ctx, &product_query),
    )
    .map_err(|e| {
        if e.is_not_found() {
            AppError::NotFound(format!("shop {id}"))
        } else {
            AppError::Api(e)
        }
    })?;

    Ok(ShopShowTemplate {
        page,
        shop: ShopView::from(&shop),
        warehouses: warehouses.iter().map(WarehouseView::from).collect(),
        products: listing
            .data
            .iter()
            .map(|p| ProductCard::new(p, &state))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0.35), "350 m away");
        assert_eq!(format_distance(2.44), "2.4 km away");
    }

    #[test]
    fn test_fulfillment_label() {
        assert_eq!(
            fulfillment_label(&[FulfillmentType::Pickup, FulfillmentType::Delivery]),
            "Pickup · Delivery"
        );
        assert_eq!(fulfillment_label(&[]), "");
    }

    #[test]
    fn test_parse_fulfillment() {
        assert_eq!(parse_fulfillment(Some("pickup")), Some(FulfillmentType::Pickup));
        assert_eq!(parse_fulfillment(Some("drone")), None);
        assert_eq!(parse_fulfillment(None), None);
    }
}
