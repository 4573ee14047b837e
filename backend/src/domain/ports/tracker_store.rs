//! Driven port for the enriched outage lifecycle table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::define_port_error;
use crate::domain::{FixDuration, OutageId, TrackedOutage};

define_port_error! {
    /// Errors raised while reading or writing tracked lifecycles.
    pub enum TrackerStoreError {
        /// Store connection could not be established.
        Connection {
            /// Error detail.
            message: String,
        } => "tracker store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query {
            /// Error detail.
            message: String,
        } => "tracker store query failed: {message}",
    }
}

/// Port for tracked outage lifecycles.
///
/// Writes are conditional so overlapping reconciliation runs never create
/// duplicates or restore a lifecycle twice.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackerStore: Send + Sync {
    /// Return the subset of `ids` that have no tracked lifecycle yet.
    async fn filter_untracked(&self, ids: &[OutageId]) -> Result<Vec<OutageId>, TrackerStoreError>;

    /// Insert an open lifecycle unless one already exists for its identifier.
    ///
    /// Returns `true` when this call created the row.
    async fn insert_tracked(&self, record: &TrackedOutage) -> Result<bool, TrackerStoreError>;

    /// Restore the lifecycle for `outage_id` only if it is still open.
    ///
    /// Returns `true` when this call performed the transition.
    async fn restore_if_open(
        &self,
        outage_id: &OutageId,
        ended_at: DateTime<Utc>,
        fix_duration: FixDuration,
    ) -> Result<bool, TrackerStoreError>;

    /// List every tracked lifecycle ordered by identifier.
    async fn list_tracked(&self) -> Result<Vec<TrackedOutage>, TrackerStoreError>;
}

/// Fixture store treating every identifier as untracked.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureTrackerStore;

#[async_trait]
impl TrackerStore for FixtureTrackerStore {
    async fn filter_untracked(&self, ids: &[OutageId]) -> Result<Vec<OutageId>, TrackerStoreError> {
        Ok(ids.to_vec())
    }

    async fn insert_tracked(&self, _record: &TrackedOutage) -> Result<bool, TrackerStoreError> {
        Ok(true)
    }

    async fn restore_if_open(
        &self,
        _outage_id: &OutageId,
        _ended_at: DateTime<Utc>,
        _fix_duration: FixDuration,
    ) -> Result<bool, TrackerStoreError> {
        Ok(false)
    }

    async fn list_tracked(&self) -> Result<Vec<TrackedOutage>, TrackerStoreError> {
        Ok(Vec::new())
    }
}
