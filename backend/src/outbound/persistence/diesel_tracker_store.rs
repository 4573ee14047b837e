//! PostgreSQL-backed adapter for tracked outage lifecycles.
//!
//! Inserts use `ON CONFLICT DO NOTHING` and restores are guarded by
//! `lifecycle_state = 'open'`, so the row count tells the caller whether this
//! call won a race with a concurrent cycle.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{TrackerStore, TrackerStoreError};
use crate::domain::{FixDuration, OutageId, TrackedOutage};

use super::diesel_helpers::{map_decode_error, map_diesel_error, map_pool_error};
use super::models::{LIFECYCLE_OPEN, LIFECYCLE_RESTORED, NewTrackedOutageRow, TrackedOutageRow};
use super::pool::{DbPool, PoolError};
use super::schema::outage_tracker;

/// Move one open lifecycle to restored. Matches no row once the lifecycle
/// has left `open`.
macro_rules! restore_if_open_statement {
    ($outage_id:expr, $ended_at:expr, $fix_duration:expr) => {
        diesel::update(
            outage_tracker::table
                .filter(outage_tracker::outage_id.eq($outage_id))
                .filter(outage_tracker::lifecycle_state.eq(LIFECYCLE_OPEN)),
        )
        .set((
            outage_tracker::lifecycle_state.eq(LIFECYCLE_RESTORED),
            outage_tracker::ended_at.eq(Some($ended_at)),
            outage_tracker::fix_duration.eq(Some($fix_duration)),
        ))
    };
}

/// Diesel-backed implementation of [`TrackerStore`].
#[derive(Clone)]
pub struct DieselTrackerStore {
    pool: DbPool,
}

impl DieselTrackerStore {
    /// Create a store backed by `pool`.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> TrackerStoreError {
    map_pool_error(error, TrackerStoreError::connection)
}

fn diesel_error(
    operation: &'static str,
) -> impl FnOnce(diesel::result::Error) -> TrackerStoreError {
    move |error| {
        map_diesel_error(
            error,
            operation,
            TrackerStoreError::query,
            TrackerStoreError::connection,
        )
    }
}

/// Keep the order of `ids`, dropping every identifier in `tracked`.
fn untracked_ids(ids: &[OutageId], tracked: &HashSet<String>) -> Vec<OutageId> {
    ids.iter()
        .filter(|id| {
            let raw: &str = id.as_ref();
            !tracked.contains(raw)
        })
        .cloned()
        .collect()
}

#[async_trait]
impl TrackerStore for DieselTrackerStore {
    async fn filter_untracked(&self, ids: &[OutageId]) -> Result<Vec<OutageId>, TrackerStoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let candidates: Vec<&str> = ids.iter().map(OutageId::as_ref).collect();
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let tracked_rows: Vec<String> = outage_tracker::table
            .filter(outage_tracker::outage_id.eq_any(candidates))
            .select(outage_tracker::outage_id)
            .load(&mut conn)
            .await
            .map_err(diesel_error("filter untracked outages"))?;

        Ok(untracked_ids(ids, &tracked_rows.into_iter().collect()))
    }

    async fn insert_tracked(&self, record: &TrackedOutage) -> Result<bool, TrackerStoreError> {
        let row = NewTrackedOutageRow::from(record);
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let inserted = diesel::insert_into(outage_tracker::table)
            .values(&row)
            .on_conflict(outage_tracker::outage_id)
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(diesel_error("insert tracked outage"))?;

        Ok(inserted > 0)
    }

    async fn restore_if_open(
        &self,
        outage_id: &OutageId,
        ended_at: DateTime<Utc>,
        fix_duration: FixDuration,
    ) -> Result<bool, TrackerStoreError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let updated =
            restore_if_open_statement!(outage_id.as_ref(), ended_at, fix_duration.to_string())
                .execute(&mut conn)
                .await
                .map_err(diesel_error("restore tracked outage"))?;

        Ok(updated > 0)
    }

    async fn list_tracked(&self) -> Result<Vec<TrackedOutage>, TrackerStoreError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let rows = outage_tracker::table
            .select(TrackedOutageRow::as_select())
            .order(outage_tracker::outage_id.asc())
            .load::<TrackedOutageRow>(&mut conn)
            .await
            .map_err(diesel_error("list tracked outages"))?;

        rows.into_iter()
            .map(|row| {
                TrackedOutage::try_from(row)
                    .map_err(|err| map_decode_error(&err, TrackerStoreError::query))
            })
            .collect()
    }
}
