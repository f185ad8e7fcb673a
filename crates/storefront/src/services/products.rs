//! Product catalog service.

use tracing::instrument;

use marketfront_core::{BrandId, CategoryId, ProductId, ShopId};

use crate::api::types::{Brand, Category, Page, Product};
use crate::api::{ApiError, BackendClient, CallContext};

/// Default page size for product listings.
pub const DEFAULT_PER_PAGE: u32 = 24;

/// Largest page size the storefront will ask for.
pub const MAX_PER_PAGE: u32 = 100;

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl ProductSort {
    /// Value sent to the backend and used in query strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Name => "name",
        }
    }

    /// Parse a query-string value, falling back to the default.
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("price_asc") => Self::PriceAsc,
            Some("price_desc") => Self::PriceDesc,
            Some("name") => Self::Name,
            _ => Self::Newest,
        }
    }
}

/// Filters for a product listing.
#[derive(Debug, Clone)]
pub struct ProductQuery {
    pub page: u32,
    pub per_page: u32,
    pub search: Option<String>,
    pub sort: ProductSort,
    pub category_ids: Vec<CategoryId>,
    pub brand_ids: Vec<BrandId>,
    pub shop_id: Option<ShopId>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            search: None,
            sort: ProductSort::default(),
            category_ids: Vec::new(),
            brand_ids: Vec::new(),
            shop_id: None,
        }
    }
}

impl ProductQuery {
    /// Query-string pairs for the backend.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.max(1).to_string()),
            ("per_page", self.per_page.clamp(1, MAX_PER_PAGE).to_string()),
            ("sort", self.sort.as_str().to_string()),
        ];

        if let Some(search) = self.search.as_deref().map(str::trim)
            && !search.is_empty()
        {
            pairs.push(("search", search.to_string()));
        }
        if !self.category_ids.is_empty() {
            pairs.push(("category_ids", join_ids(&self.category_ids)));
        }
        if !self.brand_ids.is_empty() {
            pairs.push(("brand_ids", join_ids(&self.brand_ids)));
        }
        if let Some(shop_id) = self.shop_id {
            pairs.push(("shop_id", shop_id.to_string()));
        }

        pairs
    }
}

fn join_ids<T: ToString>(ids: &[T]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

/// Product catalog service.
pub struct ProductService<'a> {
    client: &'a BackendClient,
}

impl<'a> ProductService<'a> {
    #[must_use]
    pub const fn new(client: &'a BackendClient) -> Self {
        Self { client }
    }

    /// List products matching `query`.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self, ctx))]
    pub async fn list(
        &self,
        ctx: CallContext<'_>,
        query: &ProductQuery,
    ) -> Result<Page<Product>, ApiError> {
        self.client.get("/products", &query.to_pairs(), ctx).await
    }

    /// Fetch a single product with its variants.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown ids.
    #[instrument(skip(self, ctx))]
    pub async fn get(&self, ctx: CallContext<'_>, id: ProductId) -> Result<Product, ApiError> {
        self.client.get(&format!("/products/{id}"), &[], ctx).await
    }

    /// All product categories.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self, ctx))]
    pub async fn list_categories(&self, ctx: CallContext<'_>) -> Result<Vec<Category>, ApiError> {
        self.client.get("/categories", &[], ctx).await
    }

    /// All product brands.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self, ctx))]
    pub async fn list_brands(&self, ctx: CallContext<'_>) -> Result<Vec<Brand>, ApiError> {
        self.client.get("/brands", &[], ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query_pairs() {
        let pairs = ProductQuery::default().to_pairs();
        assert_eq!(
            pairs,
            vec![
                ("page", "1".to_string()),
                ("per_page", "24".to_string()),
                ("sort", "newest".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_pairs_with_filters() {
        let query = ProductQuery {
            page: 0,
            per_page: 500,
            search: Some("  mug ".to_string()),
            sort: ProductSort::PriceDesc,
            category_ids: vec![CategoryId::new(3), CategoryId::new(5)],
            brand_ids: vec![BrandId::new(8)],
            shop_id: Some(ShopId::new(2)),
        };
        let pairs = query.to_pairs();
        assert!(pairs.contains(&("page", "1".to_string())));
        assert!(pairs.contains(&("per_page", "100".to_string())));
        assert!(pairs.contains(&("search", "mug".to_string())));
        assert!(pairs.contains(&("category_ids", "3,5".to_string())));
        assert!(pairs.contains(&("brand_ids", "8".to_string())));
        assert!(pairs.contains(&("shop_id", "2".to_string())));
    }

    #[test]
    fn test_blank_search_is_dropped() {
        let query = ProductQuery {
            search: Some("   ".to_string()),
            ..ProductQuery::default()
        };
        assert!(!query.to_pairs().iter().any(|(k, _)| *k == "search"));
    }

    #[test]
    fn test_sort_from_param() {
        assert_eq!(ProductSort::from_param(Some("price_asc")), ProductSort::PriceAsc);
        assert_eq!(ProductSort::from_param(Some("bogus")), ProductSort::Newest);
        assert_eq!(ProductSort::from_param(None), ProductSort::Newest);
    }
}
