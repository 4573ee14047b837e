//! In-memory doubles for the outage ports.
//!
//! [`InMemoryOutageTables`] mimics the two PostgreSQL tables, including the
//! conditional writes and the foreign key from lifecycles to raw events.
//! Failures can be injected per identifier or per step.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::ports::{
    EventUpsert, GeoEnricher, GeoEnrichmentError, OutageStore, OutageStoreError, TrackerStore,
    TrackerStoreError,
};
use crate::domain::{
    AreaAttributes, FixDuration, LifecycleState, OpenLifecycle, OutageEvent, OutageId,
    StoredOutageEvent, TrackedOutage,
};

/// Clock double that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Clock frozen at `now`.
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Move the clock forward by `seconds`.
    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    /// Jump the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock_clock() = now;
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

#[derive(Default)]
struct Tables {
    events: BTreeMap<OutageId, StoredOutageEvent>,
    tracked: BTreeMap<OutageId, TrackedOutage>,
    failing_upserts: HashSet<OutageId>,
    failing_inserts: HashSet<OutageId>,
    failing_restores: HashSet<OutageId>,
    fail_filter_untracked: bool,
    fail_list_open: bool,
}

/// Shared state behind [`InMemoryOutageStore`] and [`InMemoryTrackerStore`].
#[derive(Default)]
pub struct InMemoryOutageTables {
    tables: Mutex<Tables>,
}

impl InMemoryOutageTables {
    /// Empty tables behind a shared handle.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Build the outage store view over these tables.
    #[must_use]
    pub fn outage_store(self: &Arc<Self>) -> InMemoryOutageStore {
        InMemoryOutageStore {
            tables: Arc::clone(self),
        }
    }

    /// Build the tracker store view over these tables.
    #[must_use]
    pub fn tracker_store(self: &Arc<Self>) -> InMemoryTrackerStore {
        InMemoryTrackerStore {
            tables: Arc::clone(self),
        }
    }

    /// Make raw writes for `id` fail.
    pub fn fail_upsert_for(&self, id: &OutageId) {
        self.lock().failing_upserts.insert(id.clone());
    }

    /// Make lifecycle inserts for `id` fail.
    pub fn fail_insert_for(&self, id: &OutageId) {
        self.lock().failing_inserts.insert(id.clone());
    }

    /// Make restores for `id` fail.
    pub fn fail_restore_for(&self, id: &OutageId) {
        self.lock().failing_restores.insert(id.clone());
    }

    /// Toggle failure of the untracked lookup.
    pub fn fail_filter_untracked(&self, fail: bool) {
        self.lock().fail_filter_untracked = fail;
    }

    /// Toggle failure of the open lifecycle listing.
    pub fn fail_list_open(&self, fail: bool) {
        self.lock().fail_list_open = fail;
    }

    /// Remove every injected failure.
    pub fn heal(&self) {
        let mut tables = self.lock();
        tables.failing_upserts.clear();
        tables.failing_inserts.clear();
        tables.failing_restores.clear();
        tables.fail_filter_untracked = false;
        tables.fail_list_open = false;
    }

    /// Stored raw event for `id`.
    #[must_use]
    pub fn event(&self, id: &OutageId) -> Option<StoredOutageEvent> {
        self.lock().events.get(id).cloned()
    }

    /// Tracked lifecycle for `id`.
    #[must_use]
    pub fn tracked(&self, id: &OutageId) -> Option<TrackedOutage> {
        self.lock().tracked.get(id).cloned()
    }

    /// Number of stored raw events.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.lock().events.len()
    }

    /// Number of tracked lifecycles.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.lock().tracked.len()
    }

    /// Insert a lifecycle directly, bypassing the engine.
    pub fn seed_tracked(&self, record: TrackedOutage) {
        self.lock().tracked.insert(record.outage_id.clone(), record);
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-memory [`OutageStore`].
#[derive(Clone)]
pub struct InMemoryOutageStore {
    tables: Arc<InMemoryOutageTables>,
}

#[async_trait]
impl OutageStore for InMemoryOutageStore {
    async fn upsert_event(
        &self,
        event: &OutageEvent,
        seen_at: DateTime<Utc>,
    ) -> Result<EventUpsert, OutageStoreError> {
        let mut tables = self.tables.lock();
        if tables.failing_upserts.contains(&event.outage_id) {
            return Err(OutageStoreError::query(format!(
                "injected upsert failure for {}",
                event.outage_id
            )));
        }
        if tables.events.contains_key(&event.outage_id) {
            return Ok(EventUpsert::AlreadyPresent);
        }
        tables.events.insert(
            event.outage_id.clone(),
            StoredOutageEvent {
                event: event.clone(),
                first_seen_at: seen_at,
            },
        );
        Ok(EventUpsert::Inserted)
    }

    async fn list_open_tracked(&self) -> Result<Vec<OpenLifecycle>, OutageStoreError> {
        let tables = self.tables.lock();
        if tables.fail_list_open {
            return Err(OutageStoreError::connection("injected list failure"));
        }
        Ok(tables
            .tracked
            .values()
            .filter(|record| record.lifecycle.is_open())
            .map(|record| OpenLifecycle {
                outage_id: record.outage_id.clone(),
                started_at: record.started_at,
            })
            .collect())
    }

    async fn list_events(&self) -> Result<Vec<StoredOutageEvent>, OutageStoreError> {
        Ok(self.tables.lock().events.values().cloned().collect())
    }
}

/// In-memory [`TrackerStore`].
#[derive(Clone)]
pub struct InMemoryTrackerStore {
    tables: Arc<InMemoryOutageTables>,
}

#[async_trait]
impl TrackerStore for InMemoryTrackerStore {
    async fn filter_untracked(&self, ids: &[OutageId]) -> Result<Vec<OutageId>, TrackerStoreError> {
        let tables = self.tables.lock();
        if tables.fail_filter_untracked {
            return Err(TrackerStoreError::connection("injected filter failure"));
        }
        Ok(ids
            .iter()
            .filter(|id| !tables.tracked.contains_key(*id))
            .cloned()
            .collect())
    }

    async fn insert_tracked(&self, record: &TrackedOutage) -> Result<bool, TrackerStoreError> {
        let mut tables = self.tables.lock();
        if tables.failing_inserts.contains(&record.outage_id) {
            return Err(TrackerStoreError::query(format!(
                "injected insert failure for {}",
                record.outage_id
            )));
        }
        if !tables.events.contains_key(&record.outage_id) {
            return Err(TrackerStoreError::query(format!(
                "no raw event for {}",
                record.outage_id
            )));
        }
        if tables.tracked.contains_key(&record.outage_id) {
            return Ok(false);
        }
        tables
            .tracked
            .insert(record.outage_id.clone(), record.clone());
        Ok(true)
    }

    async fn restore_if_open(
        &self,
        outage_id: &OutageId,
        ended_at: DateTime<Utc>,
        fix_duration: FixDuration,
    ) -> Result<bool, TrackerStoreError> {
        let mut tables = self.tables.lock();
        if tables.failing_restores.contains(outage_id) {
            return Err(TrackerStoreError::query(format!(
                "injected restore failure for {outage_id}"
            )));
        }
        match tables.tracked.get_mut(outage_id) {
            Some(record) if record.lifecycle.is_open() => {
                record.lifecycle = LifecycleState::Restored {
                    ended_at,
                    fix_duration,
                };
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_tracked(&self) -> Result<Vec<TrackedOutage>, TrackerStoreError> {
        Ok(self.tables.lock().tracked.values().cloned().collect())
    }
}

/// [`GeoEnricher`] resolving every coordinate to one area unless told to fail.
pub struct ScriptedGeoEnricher {
    area: AreaAttributes,
    failing: Mutex<Vec<(f64, f64)>>,
    fail_everything: Mutex<bool>,
    calls: AtomicUsize,
}

impl ScriptedGeoEnricher {
    /// Enricher resolving every coordinate to `area`.
    #[must_use]
    pub const fn new(area: AreaAttributes) -> Self {
        Self {
            area,
            failing: Mutex::new(Vec::new()),
            fail_everything: Mutex::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail lookups for exactly this coordinate.
    pub fn fail_at(&self, latitude: f64, longitude: f64) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((latitude, longitude));
    }

    /// Toggle failure of every lookup.
    pub fn fail_all(&self, fail: bool) {
        *self
            .fail_everything
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = fail;
    }

    /// Remove every injected failure.
    pub fn heal(&self) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.fail_all(false);
    }

    /// Number of lookups attempted so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedGeoEnricher {
    fn default() -> Self {
        Self::new(mecklenburg())
    }
}

#[async_trait]
impl GeoEnricher for ScriptedGeoEnricher {
    async fn resolve(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<AreaAttributes, GeoEnrichmentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let fail_all = *self
            .fail_everything
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let fail_here = self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|&(lat, lon)| {
                lat.to_bits() == latitude.to_bits() && lon.to_bits() == longitude.to_bits()
            });
        if fail_all || fail_here {
            return Err(GeoEnrichmentError::transport(format!(
                "injected lookup failure at ({latitude}, {longitude})"
            )));
        }
        Ok(self.area.clone())
    }
}

/// Area used by the default enricher.
#[must_use]
pub fn mecklenburg() -> AreaAttributes {
    AreaAttributes {
        state: "North Carolina".to_owned(),
        county: "Mecklenburg County".to_owned(),
        block_fips: "371190001001000".to_owned(),
    }
}

/// Build a raw event with the given identifier and coordinate.
///
/// # Panics
/// Panics when `id` is not a valid [`OutageId`].
#[must_use]
pub fn outage_event(id: &str, latitude: f64, longitude: f64) -> OutageEvent {
    let outage_id = match OutageId::new(id) {
        Ok(valid) => valid,
        Err(error) => panic!("invalid test outage id `{id}`: {error}"),
    };
    OutageEvent {
        outage_id,
        latitude,
        longitude,
        affected_customers: 10,
        cause: "wind".to_owned(),
        jurisdiction: "DEC".to_owned(),
        convex_hull: serde_json::Value::Null,
    }
}
