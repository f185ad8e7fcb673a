//! Application state shared across handlers.

use std::sync::Arc;

use marketfront_core::PriceFormat;

use crate::api::{ApiError, BackendClient};
use crate::config::StorefrontConfig;
use crate::services::FilterMappingCache;
use crate::services::geolocation::{GeolocationService, lookup_client};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// backend client, the filter-name cache and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: BackendClient,
    filters: FilterMappingCache,
    price_format: PriceFormat,
    lookup_http: reqwest::Client,
}

impl AppState {
    /// Create a new application state with the standard backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let backend = BackendClient::new(&config.backend)?;
        Self::with_backend(config, backend)
    }

    /// Create state around an existing backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup HTTP client cannot be built.
    pub fn with_backend(config: StorefrontConfig, backend: BackendClient) -> Result<Self, ApiError> {
        let lookup_http = lookup_client()?;
        let filters = FilterMappingCache::new(config.filter_cache_ttl);
        let price_format = PriceFormat::default()
            .with_symbol(config.currency_symbol.clone())
            .fraction_digits(2, 2);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                filters,
                price_format,
                lookup_http,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    /// Get a reference to the filter name cache.
    #[must_use]
    pub fn filters(&self) -> &FilterMappingCache {
        &self.inner.filters
    }

    /// Price format for every amount shown on a page.
    #[must_use]
    pub fn price_format(&self) -> &PriceFormat {
        &self.inner.price_format
    }

    /// Format an amount with the configured currency symbol.
    #[must_use]
    pub fn format_price(&self, amount: rust_decimal::Decimal) -> String {
        marketfront_core::format_price(amount, &self.inner.price_format)
    }

    /// Geolocation service on the dedicated lookup client.
    #[must_use]
    pub fn geolocation(&self) -> GeolocationService<'_> {
        GeolocationService::new(&self.inner.lookup_http, &self.inner.config.geo)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_pages_use_configured_symbol_and_cents() {
        let mut config = StorefrontConfig::local("http://localhost:3000", "http://127.0.0.1:9");
        config.currency_symbol = "€".to_string();
        let state = AppState::new(config).unwrap();

        assert_eq!(state.format_price(Decimal::new(12345, 1)), "€ 1,234.50");
        assert_eq!(state.format_price(Decimal::new(5, 0)), "€ 5.00");
    }
}
