//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use marketfront_core::{ProductId, format_discount_percentage};

use super::{Pagination, call_context, split_names};
use crate::api::types::{Product, ProductVariant};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{OptionalAuth, RequestId};
use crate::models::{Flash, PageContext};
use crate::services::{ProductQuery, ProductService, ProductSort};
use crate::state::AppState;

/// Product card data for listings.
#[derive(Clone)]
pub struct ProductCard {
    pub id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    pub price: String,
    pub compare_at_price: Option<String>,
    /// e.g. `20%`, shown as a "-20%" badge.
    pub discount: Option<String>,
    pub brand: Option<String>,
    pub available: bool,
}

impl ProductCard {
    #[must_use]
    pub fn new(product: &Product, state: &AppState) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            image_url: product.image_url.clone(),
            price: state.format_price(product.price),
            compare_at_price: markdown(product.price, product.compare_at_price)
                .map(|original| state.format_price(original)),
            discount: discount_label(product.price, product.compare_at_price),
            brand: product.brand.as_ref().map(|b| b.name.clone()),
            available: product.is_available(),
        }
    }
}

/// Variant display data for the detail page.
#[derive(Clone)]
pub struct VariantView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub discount: Option<String>,
    pub in_stock: bool,
    pub stock_note: Option<String>,
}

/// Low-stock threshold for the "Only N left" note.
const LOW_STOCK: u32 = 5;

impl VariantView {
    fn new(variant: &ProductVariant, state: &AppState) -> Self {
        let stock_note = match variant.stock {
            0 => Some("Out of stock".to_string()),
            n if n <= LOW_STOCK => Some(format!("Only {n} left")),
            _ => None,
        };

        Self {
            id: variant.id.to_string(),
            name: variant.name.clone(),
            price: state.format_price(variant.price),
            compare_at_price: markdown(variant.price, variant.compare_at_price)
                .map(|original| state.format_price(original)),
            discount: discount_label(variant.price, variant.compare_at_price),
            in_stock: variant.in_stock(),
            stock_note,
        }
    }
}

/// Product detail data.
pub struct ProductDetail {
    pub card: ProductCard,
    pub description: Option<String>,
    pub category: Option<String>,
    pub variants: Vec<VariantView>,
}

/// The original price, when it is above the selling price.
fn markdown(price: Decimal, compare_at: Option<Decimal>) -> Option<Decimal> {
    compare_at.filter(|original| *original > price)
}

fn discount_label(price: Decimal, compare_at: Option<Decimal>) -> Option<String> {
    markdown(price, compare_at).map(|original| format_discount_percentage(original, price))
}

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub page: Option<u32>,
    pub sort: Option<String>,
    pub search: Option<String>,
    /// Comma-separated category names.
    pub category: Option<String>,
    /// Comma-separated brand names.
    pub brand: Option<String>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub products: Vec<ProductCard>,
    pub pagination: Pagination,
    /// "1 product" / "24 products".
    pub result_count: String,
    pub search: String,
    pub sort: &'static str,
    pub category: String,
    pub brand: String,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: ProductDetail,
}

/// Display product listing page.
///
/// Category and brand filters arrive as names and are resolved to IDs
/// through the filter cache. Names that match nothing are dropped from the
/// filter and reported in a flash.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    request_id: RequestId,
    mut page: PageContext,
    Query(query): Query<ListingQuery>,
) -> Result<ProductsIndexTemplate> {
    let ctx = call_context(user.as_ref(), &request_id);
    let client = state.backend();

    let mut product_query = ProductQuery {
        page: query.page.unwrap_or(1).max(1),
        search: query.search.clone(),
        sort: ProductSort::from_param(query.sort.as_deref()),
        ..ProductQuery::default()
    };

    let mut unmapped = Vec::new();

    // Both lookups share one table load; a failed load is reported once.
    let category_names = split_names(query.category.as_deref());
    let mut tables_loaded = true;
    match state
        .filters()
        .resolve_categories(client, ctx, &category_names)
        .await
    {
        Ok(resolved) => {
            product_query.category_ids = resolved.ids;
            unmapped.extend(resolved.unmapped);
        }
        Err(e) => {
            tables_loaded = false;
            page.flash(Flash::error(e.user_message()));
        }
    }

    let brand_names = split_names(query.brand.as_deref());
    if tables_loaded {
        match state
            .filters()
            .resolve_brands(client, ctx, &brand_names)
            .await
        {
            Ok(resolved) => {
                product_query.brand_ids = resolved.ids;
                unmapped.extend(resolved.unmapped);
            }
            Err(e) => page.flash(Flash::error(e.user_message())),
        }
    }

    if !unmapped.is_empty() {
        page.flash(Flash::info(format!(
            "No products match the filter {}, so it was ignored.",
            unmapped.join(", ")
        )));
    }

    let listing = ProductService::new(client)
        .list(ctx, &product_query)
        .await?;

    let search = query.search.unwrap_or_default();
    let category = query.category.unwrap_or_default();
    let brand = query.brand.unwrap_or_default();
    let sort = product_query.sort.as_str();

    let pagination = Pagination::new(
        &listing.meta,
        "/products",
        &[
            ("search", search.clone()),
            ("sort", sort.to_string()),
            ("category", category.clone()),
            ("brand", brand.clone()),
        ],
    );

    Ok(ProductsIndexTemplate {
        products: listing
            .data
            .iter()
            .map(|p| ProductCard::new(p, &state))
            .collect(),
        result_count: result_count(listing.meta.total),
        pagination,
        page,
        search,
        sort,
        category,
        brand,
    })
}

fn result_count(total: u64) -> String {
    if total == 1 {
        "1 product".to_string()
    } else {
        format!("{total} products")
    }
}

/// Display product detail page.
#[instrument(skip(state, user, request_id, page))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    request_id: RequestId,
    page: PageContext,
    Path(id): Path<i64>,
) -> Result<ProductShowTemplate> {
    let ctx = call_context(user.as_ref(), &request_id);

    let product = ProductService::new(state.backend())
        .get(ctx, ProductId::new(id))
        .await
        .map_err(|e| {
            if e.is_not_found() {
                AppError::NotFound(format!("product {id}"))
            } else {
                AppError::Api(e)
            }
        })?;

    let detail = ProductDetail {
        card: ProductCard::new(&product, &state),
        description: product.description.clone(),
        category: product.category.as_ref().map(|c| c.name.clone()),
        variants: product
            .variants
            .iter()
            .map(|v| VariantView::new(v, &state))
            .collect(),
    };

    Ok(ProductShowTemplate {
        page,
        product: detail,
    })
}
