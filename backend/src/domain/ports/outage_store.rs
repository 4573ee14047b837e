//! Driven port for the raw outage event table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::define_port_error;
use crate::domain::{OpenLifecycle, OutageEvent, StoredOutageEvent};

/// Outcome of writing one raw event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventUpsert {
    /// No row existed for the identifier; the event was written.
    Inserted,
    /// A row already existed and was left untouched.
    AlreadyPresent,
}

define_port_error! {
    /// Errors raised while reading or writing raw outage events.
    pub enum OutageStoreError {
        /// Store connection could not be established.
        Connection {
            /// Error detail.
            message: String,
        } => "outage store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query {
            /// Error detail.
            message: String,
        } => "outage store query failed: {message}",
    }
}

/// Port for the append-only raw event table.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OutageStore: Send + Sync {
    /// Write `event` unless its identifier is already stored.
    ///
    /// The first write for an identifier wins; later writes never modify it.
    /// `seen_at` is recorded as the first-seen timestamp on insert.
    async fn upsert_event(
        &self,
        event: &OutageEvent,
        seen_at: DateTime<Utc>,
    ) -> Result<EventUpsert, OutageStoreError>;

    /// List identifier and start time of every tracked lifecycle still open.
    async fn list_open_tracked(&self) -> Result<Vec<OpenLifecycle>, OutageStoreError>;

    /// List every stored raw event ordered by identifier.
    async fn list_events(&self) -> Result<Vec<StoredOutageEvent>, OutageStoreError>;
}

/// Fixture store that accepts every write and holds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureOutageStore;

#[async_trait]
impl OutageStore for FixtureOutageStore {
    async fn upsert_event(
        &self,
        _event: &OutageEvent,
        _seen_at: DateTime<Utc>,
    ) -> Result<EventUpsert, OutageStoreError> {
        Ok(EventUpsert::Inserted)
    }

    async fn list_open_tracked(&self) -> Result<Vec<OpenLifecycle>, OutageStoreError> {
        Ok(Vec::new())
    }

    async fn list_events(&self) -> Result<Vec<StoredOutageEvent>, OutageStoreError> {
        Ok(Vec::new())
    }
}
