//! IP geolocation and reverse geocoding.
//!
//! Both are read-only third-party APIs. They get their own HTTP client with
//! a short timeout, outside the backend interceptor chain, so the backend
//! API key and customer tokens never leave for a third party.

use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::ApiError;
use crate::config::GeoConfig;

/// A validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// `None` unless both values are finite and in range.
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);
        valid.then_some(Self { lat, lng })
    }
}

/// Where an IP address appears to be.
#[derive(Debug, Clone, Serialize)]
pub struct IpLocation {
    pub coordinates: Coordinates,
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    error: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// A human-readable address for a coordinate.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReverseGeocode {
    pub display_name: String,
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    address: ReverseAddress,
}

#[derive(Debug, Default, Deserialize)]
struct ReverseAddress {
    house_number: Option<String>,
    road: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
}

impl From<ReverseResponse> for ReverseGeocode {
    fn from(response: ReverseResponse) -> Self {
        let address = response.address;
        let street = match (address.road, address.house_number) {
            (Some(road), Some(number)) => Some(format!("{road} {number}")),
            (Some(road), None) => Some(road),
            (None, _) => None,
        };

        Self {
            display_name: response.display_name.unwrap_or_default(),
            street,
            city: address.city.or(address.town).or(address.village),
            postal_code: address.postcode,
            country: address.country,
        }
    }
}

/// Lookups sit on the page path, so they give up quickly.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Identifies the storefront to the public lookup services.
pub const LOOKUP_USER_AGENT: &str = concat!(
    "marketfront-storefront/",
    env!("CARGO_PKG_VERSION"),
    " (location lookup)"
);

/// Build the HTTP client used for third-party lookups.
///
/// # Errors
///
/// Returns an error if the client cannot be built.
pub fn lookup_client() -> Result<reqwest::Client, ApiError> {
    Ok(reqwest::Client::builder()
        .timeout(LOOKUP_TIMEOUT)
        .user_agent(LOOKUP_USER_AGENT)
        .build()?)
}

pub struct GeolocationService<'a> {
    http: &'a reqwest::Client,
    config: &'a GeoConfig,
}

impl<'a> GeolocationService<'a> {
    #[must_use]
    pub const fn new(http: &'a reqwest::Client, config: &'a GeoConfig) -> Self {
        Self { http, config }
    }

    /// Approximate location of a client IP.
    ///
    /// Private, loopback and otherwise unroutable addresses resolve to
    /// `None` without a lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup service fails.
    #[instrument(skip(self))]
    pub async fn locate_ip(&self, ip: IpAddr) -> Result<Option<IpLocation>, ApiError> {
        if !is_public_ip(ip) {
            return Ok(None);
        }

        let url = format!("{}/{ip}/json/", self.config.geolocation_url);
        let response: IpLookupResponse = self.fetch_json(&url, &[]).await?;

        if response.error {
            tracing::debug!(reason = ?response.reason, "IP lookup returned no location");
            return Ok(None);
        }

        Ok(response
            .latitude
            .zip(response.longitude)
            .and_then(|(lat, lng)| Coordinates::new(lat, lng))
            .map(|coordinates| IpLocation {
                coordinates,
                city: response.city,
            }))
    }

    /// Address at a coordinate.
    ///
    /// # Errors
    ///
    /// Returns an error if the geocoding service fails.
    #[instrument(skip(self))]
    pub async fn reverse_geocode(&self, at: Coordinates) -> Result<ReverseGeocode, ApiError> {
        let url = format!("{}/reverse", self.config.geocoding_url);
        let query = [
            ("format", "jsonv2".to_string()),
            ("lat", at.lat.to_string()),
            ("lon", at.lng.to_string()),
        ];
        let response: ReverseResponse = self.fetch_json(&url, &query).await?;
        Ok(response.into())
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let mut url = url::Url::parse(url)?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }

        let response = self.http.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::RateLimited(60));
        }
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Location service returned non-success status");
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("error").to_string(),
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

fn is_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation())
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            !(v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_validation() {
        assert!(Coordinates::new(48.85, 2.35).is_some());
        assert!(Coordinates::new(91.0, 0.0).is_none());
        assert!(Coordinates::new(0.0, -181.0).is_none());
        assert!(Coordinates::new(f64::NAN, 0.0).is_none());
    }

    #[test]
    fn test_is_public_ip() {
        assert!(is_public_ip("8.8.8.8".parse().unwrap()));
        assert!(!is_public_ip("10.0.0.1".parse().unwrap()));
        assert!(!is_public_ip("127.0.0.1".parse().unwrap()));
        assert!(!is_public_ip("192.168.1.10".parse().unwrap()));
        assert!(!is_public_ip("::1".parse().unwrap()));
        assert!(!is_public_ip("fd00::1".parse().unwrap()));
        assert!(is_public_ip("2606:4700::1111".parse().unwrap()));
    }

    #[test]
    fn test_reverse_geocode_from_response() {
        let json = r#"{
            "display_name": "12 Main St, Springfield",
            "address": {"road": "Main St", "house_number": "12", "town": "Springfield", "postcode": "12345"}
        }"#;
        let response: ReverseResponse = serde_json::from_str(json).unwrap();
        let geocode = ReverseGeocode::from(response);
        assert_eq!(geocode.street.as_deref(), Some("Main St 12"));
        assert_eq!(geocode.city.as_deref(), Some("Springfield"));
        assert_eq!(geocode.postal_code.as_deref(), Some("12345"));
        assert!(geocode.country.is_none());
    }

    #[tokio::test]
    async fn test_locate_private_ip_skips_lookup() {
        let http = reqwest::Client::new();
        let config = GeoConfig {
            geolocation_url: "http://127.0.0.1:1".to_string(),
            geocoding_url: "http://127.0.0.1:1".to_string(),
        };
        let service = GeolocationService::new(&http, &config);
        let located = service
            .locate_ip("192.168.0.4".parse().unwrap())
            .await
            .unwrap();
        assert!(located.is_none());
    }
}
