//! PostgreSQL-backed adapter for the raw outage event table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{EventUpsert, OutageStore, OutageStoreError};
use crate::domain::{OpenLifecycle, OutageEvent, StoredOutageEvent};

use super::diesel_helpers::{map_decode_error, map_diesel_error, map_pool_error};
use super::models::{LIFECYCLE_OPEN, NewOutageEventRow, OpenLifecycleRow, OutageEventRow};
use super::pool::{DbPool, PoolError};
use super::schema::{outage_events, outage_tracker};

/// Diesel-backed implementation of [`OutageStore`].
#[derive(Clone)]
pub struct DieselOutageStore {
    pool: DbPool,
}

impl DieselOutageStore {
    /// Create a store backed by `pool`.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> OutageStoreError {
    map_pool_error(error, OutageStoreError::connection)
}

fn diesel_error(operation: &'static str) -> impl FnOnce(diesel::result::Error) -> OutageStoreError {
    move |error| {
        map_diesel_error(
            error,
            operation,
            OutageStoreError::query,
            OutageStoreError::connection,
        )
    }
}

#[async_trait]
impl OutageStore for DieselOutageStore {
    async fn upsert_event(
        &self,
        event: &OutageEvent,
        seen_at: DateTime<Utc>,
    ) -> Result<EventUpsert, OutageStoreError> {
        let row = NewOutageEventRow::from_event(event, seen_at);
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let inserted = diesel::insert_into(outage_events::table)
            .values(&row)
            .on_conflict(outage_events::outage_id)
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(diesel_error("upsert outage event"))?;

        Ok(if inserted == 0 {
            EventUpsert::AlreadyPresent
        } else {
            EventUpsert::Inserted
        })
    }

    async fn list_open_tracked(&self) -> Result<Vec<OpenLifecycle>, OutageStoreError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let rows: Vec<OpenLifecycleRow> = outage_tracker::table
            .filter(outage_tracker::lifecycle_state.eq(LIFECYCLE_OPEN))
            .select((outage_tracker::outage_id, outage_tracker::started_at))
            .order(outage_tracker::outage_id.asc())
            .load(&mut conn)
            .await
            .map_err(diesel_error("list open lifecycles"))?;

        rows.into_iter()
            .map(|row| {
                OpenLifecycle::try_from(row)
                    .map_err(|err| map_decode_error(&err, OutageStoreError::query))
            })
            .collect()
    }

    async fn list_events(&self) -> Result<Vec<StoredOutageEvent>, OutageStoreError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let rows = outage_events::table
            .select(OutageEventRow::as_select())
            .order(outage_events::outage_id.asc())
            .load::<OutageEventRow>(&mut conn)
            .await
            .map_err(diesel_error("list outage events"))?;

        rows.into_iter()
            .map(|row| {
                StoredOutageEvent::try_from(row)
                    .map_err(|err| map_decode_error(&err, OutageStoreError::query))
            })
            .collect()
    }
}
