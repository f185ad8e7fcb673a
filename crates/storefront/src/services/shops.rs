//! Shop discovery service.

use tracing::instrument;

use marketfront_core::{FulfillmentType, ShopId};

use crate::api::types::{Shop, Warehouse};
use crate::api::{ApiError, BackendClient, CallContext};
use crate::services::geolocation::Coordinates;

/// Filters for a shop listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShopQuery {
    /// Sort by distance from here when set.
    pub near: Option<Coordinates>,
    pub fulfillment: Option<FulfillmentType>,
}

impl ShopQuery {
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(near) = self.near {
            pairs.push(("lat", near.lat.to_string()));
            pairs.push(("lng", near.lng.to_string()));
        }
        if let Some(fulfillment) = self.fulfillment {
            pairs.push(("fulfillment", fulfillment.as_str().to_string()));
        }
        pairs
    }
}

pub struct ShopService<'a> {
    client: &'a BackendClient,
}

impl<'a> ShopService<'a> {
    #[must_use]
    pub const fn new(client: &'a BackendClient) -> Self {
        Self { client }
    }

    /// List shops, nearest first when coordinates are given.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self, ctx))]
    pub async fn list(&self, ctx: CallContext<'_>, query: &ShopQuery) -> Result<Vec<Shop>, ApiError> {
        self.client.get("/shops", &query.to_pairs(), ctx).await
    }

    /// Fetch one shop.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown ids.
    #[instrument(skip(self, ctx))]
    pub async fn get(&self, ctx: CallContext<'_>, id: ShopId) -> Result<Shop, ApiError> {
        self.client.get(&format!("/shops/{id}"), &[], ctx).await
    }

    /// Warehouses that fulfil orders for a shop.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self, ctx))]
    pub async fn warehouses(
        &self,
        ctx: CallContext<'_>,
        shop_id: ShopId,
    ) -> Result<Vec<Warehouse>, ApiError> {
        self.client
            .get(&format!("/shops/{shop_id}/warehouses"), &[], ctx)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shop_query_pairs() {
        assert!(ShopQuery::default().to_pairs().is_empty());

        let query = ShopQuery {
            near: Coordinates::new(52.52, 13.405),
            fulfillment: Some(FulfillmentType::Delivery),
        };
        assert_eq!(
            query.to_pairs(),
            vec![
                ("lat", "52.52".to_string()),
                ("lng", "13.405".to_string()),
                ("fulfillment", "delivery".to_string()),
            ]
        );
    }
}
