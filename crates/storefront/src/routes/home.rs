//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use super::call_context;
use super::discounts::DiscountView;
use super::products::ProductCard;
use crate::filters;
use crate::middleware::{OptionalAuth, RequestId};
use crate::models::{Flash, PageContext};
use crate::services::{DiscountService, ProductQuery, ProductService, ProductSort};
use crate::state::AppState;

/// Number of products featured on the home page.
const FEATURED_COUNT: u32 = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub featured: Vec<ProductCard>,
    pub discounts: Vec<DiscountView>,
}

/// Display the home page.
///
/// Products and discounts load concurrently. Either failing leaves its
/// section empty and adds a flash rather than failing the page.
#[instrument(skip_all)]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    request_id: RequestId,
    mut page: PageContext,
) -> HomeTemplate {
    let ctx = call_context(user.as_ref(), &request_id);
    let query = ProductQuery {
        per_page: FEATURED_COUNT,
        sort: ProductSort::Newest,
        ..ProductQuery::default()
    };

    let products = ProductService::new(state.backend());
    let discounts = DiscountService::new(state.backend());
    let (products, discounts) = tokio::join!(products.list(ctx, &query), discounts.list_active(ctx));

    let featured = match products {
        Ok(listing) => listing
            .data
            .iter()
            .map(|p| ProductCard::new(p, &state))
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load featured products");
            page.flash(Flash::error(e.user_message()));
            Vec::new()
        }
    };

    let discounts = match discounts {
        Ok(discounts) => discounts
            .iter()
            .map(|d| DiscountView::new(d, &state))
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load discounts");
            Vec::new()
        }
    };

    HomeTemplate {
        page,
        featured,
        discounts,
    }
}
