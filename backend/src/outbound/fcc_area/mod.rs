//! FCC census area adapter implementing the `GeoEnricher` port.

mod dto;
mod http_enricher;

pub use http_enricher::FccAreaGeoEnricher;
