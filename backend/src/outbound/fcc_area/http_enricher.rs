//! Reqwest-backed census area lookup.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode, Url};

use super::dto::AreaResponseDto;
use crate::domain::AreaAttributes;
use crate::domain::ports::{GeoEnricher, GeoEnrichmentError};
use crate::outbound::http_support::{is_timeout_status, status_message};

/// Geo enricher calling the FCC census area endpoint.
pub struct FccAreaGeoEnricher {
    client: Client,
    endpoint: Url,
    census_year: u16,
}

impl FccAreaGeoEnricher {
    /// Build an enricher using a reqwest client with an explicit request timeout.
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, census_year: u16, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            census_year,
        })
    }
}

#[async_trait]
impl GeoEnricher for FccAreaGeoEnricher {
    async fn resolve(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<AreaAttributes, GeoEnrichmentError> {
        let url = lookup_url(&self.endpoint, latitude, longitude, self.census_year);
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        parse_area(body.as_ref(), latitude, longitude)
    }
}

fn lookup_url(endpoint: &Url, latitude: f64, longitude: f64, census_year: u16) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("lat", &latitude.to_string())
        .append_pair("lon", &longitude.to_string())
        .append_pair("censusYear", &census_year.to_string())
        .append_pair("format", "json");
    url
}

fn parse_area(
    body: &[u8],
    latitude: f64,
    longitude: f64,
) -> Result<AreaAttributes, GeoEnrichmentError> {
    let decoded: AreaResponseDto = serde_json::from_slice(body).map_err(|error| {
        GeoEnrichmentError::decode(format!("invalid census area payload: {error}"))
    })?;
    decoded.into_first_area().ok_or_else(|| {
        GeoEnrichmentError::no_matching_area(format!("({latitude}, {longitude})"))
    })
}

fn map_transport_error(error: reqwest::Error) -> GeoEnrichmentError {
    if error.is_timeout() {
        GeoEnrichmentError::timeout(error.to_string())
    } else {
        GeoEnrichmentError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> GeoEnrichmentError {
    let message = status_message(status, body);
    if is_timeout_status(status) {
        GeoEnrichmentError::timeout(message)
    } else {
        GeoEnrichmentError::status(status.as_u16(), message)
    }
}
