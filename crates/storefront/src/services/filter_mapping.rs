//! Category and brand name to ID resolution.
//!
//! Listing URLs carry human-readable filter names (`?category=Shoes`), while
//! the backend filters by ID. Both name tables are fetched together, cached
//! as a single entry, and reloaded lazily once the TTL passes.
//!
//! Names are matched case-insensitively after trimming. Names with no match
//! are logged, left out of the ID list, and returned in
//! [`ResolvedIds::unmapped`] so the page can say which filters were ignored.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use thiserror::Error;
use tracing::instrument;

use marketfront_core::{BrandId, CategoryId};

use crate::api::{ApiError, BackendClient, CallContext};
use crate::services::products::ProductService;

/// Failed to load the name tables from the backend.
#[derive(Debug, Clone, Error)]
#[error("failed to load filter mappings: {0}")]
pub struct FilterLoadError(Arc<ApiError>);

impl FilterLoadError {
    #[must_use]
    pub fn user_message(&self) -> String {
        self.0.user_message()
    }
}

/// Result of resolving a list of filter names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIds<I> {
    /// IDs for the names that matched, in input order, without duplicates.
    pub ids: Vec<I>,
    /// Names that matched nothing, as given.
    pub unmapped: Vec<String>,
}

impl<I> Default for ResolvedIds<I> {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            unmapped: Vec::new(),
        }
    }
}

/// Both name tables, keyed by normalized name.
#[derive(Debug, Default)]
struct FilterMappings {
    categories: HashMap<String, CategoryId>,
    brands: HashMap<String, BrandId>,
}

/// Cached name to ID tables for listing filters.
///
/// Constructed once at startup and shared through `AppState`.
#[derive(Clone)]
pub struct FilterMappingCache {
    cache: Cache<(), Arc<FilterMappings>>,
}

impl FilterMappingCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    /// Resolve category names to IDs.
    ///
    /// # Errors
    ///
    /// Returns an error if the tables are not cached and cannot be loaded.
    pub async fn resolve_categories(
        &self,
        client: &BackendClient,
        ctx: CallContext<'_>,
        names: &[String],
    ) -> Result<ResolvedIds<CategoryId>, FilterLoadError> {
        if names.is_empty() {
            return Ok(ResolvedIds::default());
        }
        let mappings = self.mappings(client, ctx).await?;
        Ok(resolve(&mappings.categories, names, "category"))
    }

    /// Resolve brand names to IDs.
    ///
    /// # Errors
    ///
    /// Returns an error if the tables are not cached and cannot be loaded.
    pub async fn resolve_brands(
        &self,
        client: &BackendClient,
        ctx: CallContext<'_>,
        names: &[String],
    ) -> Result<ResolvedIds<BrandId>, FilterLoadError> {
        if names.is_empty() {
            return Ok(ResolvedIds::default());
        }
        let mappings = self.mappings(client, ctx).await?;
        Ok(resolve(&mappings.brands, names, "brand"))
    }

    /// Drop the cached tables; the next lookup reloads them.
    pub async fn invalidate(&self) {
        self.cache.invalidate(&()).await;
    }

    /// Cached tables, loading them if absent or expired.
    ///
    /// Concurrent callers during a load wait for the same load.
    async fn mappings(
        &self,
        client: &BackendClient,
        ctx: CallContext<'_>,
    ) -> Result<Arc<FilterMappings>, FilterLoadError> {
        self.cache
            .try_get_with((), load(client, ctx))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to load filter mappings");
                FilterLoadError(e)
            })
    }
}

#[instrument(skip(client, ctx))]
async fn load(
    client: &BackendClient,
    ctx: CallContext<'_>,
) -> Result<Arc<FilterMappings>, ApiError> {
    let products = ProductService::new(client);
    let ctx = ctx.without_token();
    let (categories, brands) =
        tokio::try_join!(products.list_categories(ctx), products.list_brands(ctx))?;

    let mappings = FilterMappings {
        categories: categories
            .into_iter()
            .map(|c| (normalize(&c.name), c.id))
            .collect(),
        brands: brands
            .into_iter()
            .map(|b| (normalize(&b.name), b.id))
            .collect(),
    };

    tracing::debug!(
        categories = mappings.categories.len(),
        brands = mappings.brands.len(),
        "Loaded filter mappings"
    );

    Ok(Arc::new(mappings))
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

fn resolve<I: Copy + PartialEq>(
    table: &HashMap<String, I>,
    names: &[String],
    kind: &'static str,
) -> ResolvedIds<I> {
    let mut resolved = ResolvedIds::default();

    for name in names {
        let key = normalize(name);
        if key.is_empty() {
            continue;
        }
        match table.get(&key) {
            Some(id) if !resolved.ids.contains(id) => resolved.ids.push(*id),
            Some(_) => {}
            None => {
                tracing::warn!(kind, name = %name, "No ID found for filter name");
                resolved.unmapped.push(name.trim().to_string());
            }
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> HashMap<String, CategoryId> {
        [("shoes", 1), ("hats", 2)]
            .into_iter()
            .map(|(name, id)| (name.to_string(), CategoryId::new(id)))
            .collect()
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let names = vec![" Shoes ".to_string(), "HATS".to_string()];
        let resolved = resolve(&table(), &names, "category");
        assert_eq!(resolved.ids, vec![CategoryId::new(1), CategoryId::new(2)]);
        assert!(resolved.unmapped.is_empty());
    }

    #[test]
    fn test_resolve_reports_unmapped() {
        let names = vec!["shoes".to_string(), "Scarves".to_string(), String::new()];
        let resolved = resolve(&table(), &names, "category");
        assert_eq!(resolved.ids, vec![CategoryId::new(1)]);
        assert_eq!(resolved.unmapped, vec!["Scarves".to_string()]);
    }

    #[test]
    fn test_resolve_deduplicates() {
        let names = vec!["shoes".to_string(), "SHOES".to_string()];
        let resolved = resolve(&table(), &names, "category");
        assert_eq!(resolved.ids, vec![CategoryId::new(1)]);
    }
}
