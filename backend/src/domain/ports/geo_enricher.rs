//! Driven port resolving a coordinate to its administrative area.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::AreaAttributes;

define_port_error! {
    /// Errors raised while resolving a coordinate.
    pub enum GeoEnrichmentError {
        /// The lookup succeeded but no area contains the coordinate.
        NoMatchingArea {
            /// Error detail.
            message: String,
        } => "no census area matched: {message}",
        /// Network transport failed before receiving a response.
        Transport {
            /// Error detail.
            message: String,
        } => "area lookup transport failed: {message}",
        /// The request exceeded its timeout.
        Timeout {
            /// Error detail.
            message: String,
        } => "area lookup timeout: {message}",
        /// The lookup service answered with an unexpected status.
        Status {
            /// HTTP status code.
            status: u16,
            /// Error detail.
            message: String,
        } => "area lookup returned status {status}: {message}",
        /// The response body could not be decoded.
        Decode {
            /// Error detail.
            message: String,
        } => "area lookup response decode failed: {message}",
    }
}

/// Port enriching outage coordinates with state, county, and census block.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GeoEnricher: Send + Sync {
    /// Resolve the area containing `(latitude, longitude)`.
    async fn resolve(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<AreaAttributes, GeoEnrichmentError>;
}

/// Fixture enricher placing every coordinate in one fixed area.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureGeoEnricher;

#[async_trait]
impl GeoEnricher for FixtureGeoEnricher {
    async fn resolve(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<AreaAttributes, GeoEnrichmentError> {
        Ok(AreaAttributes {
            state: "North Carolina".to_owned(),
            county: "Mecklenburg County".to_owned(),
            block_fips: "371190001001000".to_owned(),
        })
    }
}
