//! Reverse geocoding for the "use my current location" shortcut.
//!
//! A lookup only ever proposes address parts; the controller decides which
//! form fields to fill and leaves everything alone when the lookup fails.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use crate::config::ClientConfig;
use crate::error::ApiError;

/// Address parts recovered from a coordinate pair. Every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialAddress {
    pub street: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub postal_code: Option<String>,
}

impl PartialAddress {
    pub fn is_empty(&self) -> bool {
        self.street.is_none()
            && self.city.is_none()
            && self.district.is_none()
            && self.postal_code.is_none()
    }
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<PartialAddress, ApiError>;
}

/// [`Geocoder`] backed by a Nominatim-compatible `/reverse` endpoint.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: NominatimAddress,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    house_number: Option<String>,
    road: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    suburb: Option<String>,
    city_district: Option<String>,
    county: Option<String>,
    postcode: Option<String>,
}

impl From<NominatimAddress> for PartialAddress {
    fn from(a: NominatimAddress) -> Self {
        let street = match (a.house_number, a.road) {
            (Some(number), Some(road)) => Some(format!("{number} {road}")),
            (None, Some(road)) => Some(road),
            _ => None,
        };
        Self {
            street,
            city: a.city.or(a.town).or(a.village),
            district: a.suburb.or(a.city_district).or(a.county),
            postal_code: a.postcode,
        }
    }
}

impl NominatimGeocoder {
    /// Build a geocoder from config; `None` when geocoding is disabled.
    pub fn from_config(config: &ClientConfig) -> Result<Option<Self>, ApiError> {
        let Some(base) = config.geocoder_url.as_deref() else {
            return Ok(None);
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("repairhub-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(client, base).map(Some)
    }

    pub fn with_client(client: reqwest::Client, base: &str) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base).map_err(|e| ApiError::InvalidUrl(format!("{base}: {e}")))?;
        Ok(Self { client, base_url })
    }

    pub fn reverse_url(&self, latitude: f64, longitude: f64) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("reverse");
        url.query_pairs_mut()
            .append_pair("format", "jsonv2")
            .append_pair("lat", &latitude.to_string())
            .append_pair("lon", &longitude.to_string());
        Ok(url)
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<PartialAddress, ApiError> {
        let url = self.reverse_url(latitude, longitude)?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: None,
                body,
            });
        }

        let body: ReverseResponse = response.json().await?;
        Ok(body.address.into())
    }
}
