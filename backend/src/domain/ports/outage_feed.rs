//! Driven port for fetching the provider's current outage snapshot.

use async_trait::async_trait;

use super::define_port_error;
use super::provider_credentials::ProviderCredentials;
use crate::domain::OutageEvent;

define_port_error! {
    /// Errors surfaced while fetching an outage snapshot.
    pub enum OutageFeedError {
        /// Network transport failed before receiving a response.
        Transport {
            /// Error detail.
            message: String,
        } => "outage feed transport failed: {message}",
        /// The request exceeded its timeout.
        Timeout {
            /// Error detail.
            message: String,
        } => "outage feed timeout: {message}",
        /// The provider rejected the credentials.
        Unauthorized {
            /// Error detail.
            message: String,
        } => "outage feed rejected credentials: {message}",
        /// The provider answered with an unexpected status.
        Status {
            /// HTTP status code.
            status: u16,
            /// Error detail.
            message: String,
        } => "outage feed returned status {status}: {message}",
        /// The response body could not be decoded.
        Decode {
            /// Error detail.
            message: String,
        } => "outage feed response decode failed: {message}",
    }
}

impl OutageFeedError {
    /// Return whether fresh credentials may let a retry succeed.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// Port producing the full list of currently reported outages.
///
/// A snapshot is all-or-nothing: if any jurisdiction cannot be fetched the
/// whole call fails, so callers never mistake an unreachable region for
/// restored outages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OutageFeed: Send + Sync {
    /// Fetch every outage currently reported for `jurisdictions`.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use outage_tracker::domain::ports::{
    ///     FixtureOutageFeed, OutageFeed, ProviderCredentials,
    /// };
    ///
    /// let feed = FixtureOutageFeed;
    /// let credentials = ProviderCredentials::new("Basic abc", None);
    /// let snapshot = feed
    ///     .fetch_snapshot(&["DEC".to_owned()], &credentials)
    ///     .await?;
    /// assert!(snapshot.is_empty());
    /// # Ok::<(), outage_tracker::domain::ports::OutageFeedError>(())
    /// ```
    async fn fetch_snapshot(
        &self,
        jurisdictions: &[String],
        credentials: &ProviderCredentials,
    ) -> Result<Vec<OutageEvent>, OutageFeedError>;
}

/// Fixture feed that always reports no outages.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureOutageFeed;

#[async_trait]
impl OutageFeed for FixtureOutageFeed {
    async fn fetch_snapshot(
        &self,
        _jurisdictions: &[String],
        _credentials: &ProviderCredentials,
    ) -> Result<Vec<OutageEvent>, OutageFeedError> {
        Ok(Vec::new())
    }
}
