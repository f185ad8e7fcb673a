//! Reverse geocoding for the checkout address autofill.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use super::JsonError;
use crate::services::Coordinates;
use crate::services::geolocation::ReverseGeocode;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReverseQuery {
    pub lat: f64,
    pub lng: f64,
}

/// Address for browser-supplied coordinates.
///
/// Called by `address.js` with the position from the Geolocation API.
#[instrument(skip(state))]
pub async fn reverse(
    State(state): State<AppState>,
    Query(query): Query<ReverseQuery>,
) -> Result<Json<ReverseGeocode>, JsonError> {
    let at = Coordinates::new(query.lat, query.lng)
        .ok_or_else(|| JsonError::new(StatusCode::BAD_REQUEST, "Coordinates out of range"))?;

    state
        .geolocation()
        .reverse_geocode(at)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::warn!(error = %e, "Reverse geocoding failed");
            JsonError::new(StatusCode::BAD_GATEWAY, "Address lookup is unavailable right now")
        })
}
