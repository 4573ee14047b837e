//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Each driven adapter (outage provider, area lookup, PostgreSQL) implements
//! one of these traits and maps its failures into the port's error enum.

mod macros;
pub(crate) use macros::define_port_error;

mod geo_enricher;
mod outage_feed;
mod outage_store;
mod provider_credentials;
mod tracker_store;

#[cfg(test)]
pub use geo_enricher::MockGeoEnricher;
pub use geo_enricher::{FixtureGeoEnricher, GeoEnricher, GeoEnrichmentError};
#[cfg(test)]
pub use outage_feed::MockOutageFeed;
pub use outage_feed::{FixtureOutageFeed, OutageFeed, OutageFeedError};
#[cfg(test)]
pub use outage_store::MockOutageStore;
pub use outage_store::{EventUpsert, FixtureOutageStore, OutageStore, OutageStoreError};
#[cfg(test)]
pub use provider_credentials::MockCredentialSource;
pub use provider_credentials::{
    CredentialSource, CredentialSourceError, FixtureCredentialSource, ProviderCredentials,
};
#[cfg(test)]
pub use tracker_store::MockTrackerStore;
pub use tracker_store::{FixtureTrackerStore, TrackerStore, TrackerStoreError};

#[cfg(test)]
mod tests;
