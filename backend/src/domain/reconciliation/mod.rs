//! Reconciliation engine merging one provider snapshot into persisted state.
//!
//! A cycle runs three steps in order:
//! 1. write raw events, first write wins;
//! 2. open an enriched lifecycle for every event not yet tracked;
//! 3. restore open lifecycles whose identifier left the snapshot.
//!
//! Every store write is conditional, so overlapping cycles and retries after
//! a crash never duplicate rows or restore a lifecycle twice. Failures are
//! contained to the row (or step) that produced them.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use mockable::Clock;
use tracing::{debug, warn};

use crate::domain::ports::{EventUpsert, GeoEnricher, OutageStore, TrackerStore};
use crate::domain::{
    AreaAttributes, FixDuration, OpenLifecycle, OutageEvent, OutageId, TrackedOutage,
};

mod report;

pub use report::ReconcileReport;

/// Origin tag written on lifecycles when none is configured.
pub const DEFAULT_ORIGIN: &str = "Duke Energy";

/// Tunables for the reconciliation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Upper bound on concurrent area lookups. Values below 1 are treated as 1.
    pub max_concurrent_enrichments: usize,
    /// Provider tag stored on every new lifecycle.
    pub origin: String,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_enrichments: 4,
            origin: DEFAULT_ORIGIN.to_owned(),
        }
    }
}

/// Port bundle required by the reconciliation engine.
pub struct ReconcilerPorts {
    /// Raw event persistence.
    pub outage_store: Arc<dyn OutageStore>,
    /// Lifecycle persistence.
    pub tracker_store: Arc<dyn TrackerStore>,
    /// Coordinate to area lookup.
    pub geo_enricher: Arc<dyn GeoEnricher>,
}

impl ReconcilerPorts {
    /// Build a strongly-typed engine port bundle.
    #[must_use]
    pub const fn new(
        outage_store: Arc<dyn OutageStore>,
        tracker_store: Arc<dyn TrackerStore>,
        geo_enricher: Arc<dyn GeoEnricher>,
    ) -> Self {
        Self {
            outage_store,
            tracker_store,
            geo_enricher,
        }
    }
}

enum CreationOutcome {
    Created,
    AlreadyTracked,
    EnrichmentFailed,
    PersistenceFailed,
}

/// Domain-owned reconciliation engine.
pub struct OutageReconciler {
    outage_store: Arc<dyn OutageStore>,
    tracker_store: Arc<dyn TrackerStore>,
    geo_enricher: Arc<dyn GeoEnricher>,
    clock: Arc<dyn Clock>,
    config: ReconcilerConfig,
}

impl OutageReconciler {
    /// Build an engine from its ports, a clock, and tunables.
    /// ```rust,ignore
    /// let reconciler = OutageReconciler::new(ports, Arc::new(DefaultClock), ReconcilerConfig::default());
    /// ```
    #[must_use]
    pub fn new(ports: ReconcilerPorts, clock: Arc<dyn Clock>, config: ReconcilerConfig) -> Self {
        let ReconcilerPorts {
            outage_store,
            tracker_store,
            geo_enricher,
        } = ports;
        Self {
            outage_store,
            tracker_store,
            geo_enricher,
            clock,
            config,
        }
    }

    /// Merge `snapshot` into the stores and report what changed.
    ///
    /// The clock is read once per call; that instant is used as first-seen,
    /// start, and end timestamp for everything the cycle writes. When the
    /// snapshot repeats an identifier, its first occurrence is used.
    pub async fn reconcile(&self, snapshot: &[OutageEvent]) -> ReconcileReport {
        let now = self.clock.utc();
        let events = dedupe_by_identifier(snapshot);
        let mut report = ReconcileReport::default();

        let written = self.persist_events(&events, now, &mut report).await;
        self.open_lifecycles(&written, now, &mut report).await;
        self.restore_missing(&events, now, &mut report).await;

        report.log();
        report
    }

    /// Step 1. Returns the events whose raw row is known to exist.
    async fn persist_events<'a>(
        &self,
        events: &[&'a OutageEvent],
        now: DateTime<Utc>,
        report: &mut ReconcileReport,
    ) -> Vec<&'a OutageEvent> {
        let mut written = Vec::with_capacity(events.len());
        for event in events.iter().copied() {
            match self.outage_store.upsert_event(event, now).await {
                Ok(EventUpsert::Inserted) => {
                    report.events_persisted += 1;
                    written.push(event);
                }
                Ok(EventUpsert::AlreadyPresent) => {
                    report.events_unchanged += 1;
                    written.push(event);
                }
                Err(error) => {
                    report.persistence_failures += 1;
                    warn!(
                        outage_id = %event.outage_id,
                        error = %error,
                        "failed to persist raw outage event"
                    );
                }
            }
        }
        written
    }

    /// Step 2. Lifecycles are only opened for events with a raw row.
    async fn open_lifecycles(
        &self,
        events: &[&OutageEvent],
        now: DateTime<Utc>,
        report: &mut ReconcileReport,
    ) {
        if events.is_empty() {
            return;
        }
        let ids = events
            .iter()
            .map(|event| event.outage_id.clone())
            .collect::<Vec<_>>();
        let untracked = match self.tracker_store.filter_untracked(&ids).await {
            Ok(found) => found.into_iter().collect::<HashSet<_>>(),
            Err(error) => {
                report.persistence_failures += 1;
                warn!(error = %error, "skipping lifecycle creation: untracked lookup failed");
                return;
            }
        };

        let pending = events
            .iter()
            .copied()
            .filter(|event| untracked.contains(&event.outage_id));
        let outcomes = stream::iter(pending)
            .map(|event| self.open_lifecycle(event, now))
            .buffer_unordered(self.config.max_concurrent_enrichments.max(1))
            .collect::<Vec<_>>()
            .await;

        for outcome in outcomes {
            match outcome {
                CreationOutcome::Created => report.lifecycles_created += 1,
                CreationOutcome::AlreadyTracked => report.lifecycles_already_tracked += 1,
                CreationOutcome::EnrichmentFailed => report.enrichment_failures += 1,
                CreationOutcome::PersistenceFailed => report.persistence_failures += 1,
            }
        }
    }

    async fn open_lifecycle(&self, event: &OutageEvent, now: DateTime<Utc>) -> CreationOutcome {
        match self.enrich(event).await {
            Some(area) => self.insert_lifecycle(event, area, now).await,
            None => CreationOutcome::EnrichmentFailed,
        }
    }

    async fn enrich(&self, event: &OutageEvent) -> Option<AreaAttributes> {
        self.geo_enricher
            .resolve(event.latitude, event.longitude)
            .await
            .inspect_err(|error| {
                warn!(
                    outage_id = %event.outage_id,
                    error = %error,
                    "area enrichment failed; retrying next cycle"
                );
            })
            .ok()
    }

    async fn insert_lifecycle(
        &self,
        event: &OutageEvent,
        area: AreaAttributes,
        now: DateTime<Utc>,
    ) -> CreationOutcome {
        let record = TrackedOutage::open(event, area, self.config.origin.as_str(), now);
        match self.tracker_store.insert_tracked(&record).await {
            Ok(true) => CreationOutcome::Created,
            Ok(false) => {
                debug!(outage_id = %event.outage_id, "lifecycle created by an overlapping run");
                CreationOutcome::AlreadyTracked
            }
            Err(error) => {
                warn!(
                    outage_id = %event.outage_id,
                    error = %error,
                    "failed to persist outage lifecycle"
                );
                CreationOutcome::PersistenceFailed
            }
        }
    }

    /// Step 3. Every identifier in the snapshot counts as present, even when
    /// its raw write failed this cycle.
    async fn restore_missing(
        &self,
        events: &[&OutageEvent],
        now: DateTime<Utc>,
        report: &mut ReconcileReport,
    ) {
        let open = match self.outage_store.list_open_tracked().await {
            Ok(rows) => rows,
            Err(error) => {
                report.persistence_failures += 1;
                warn!(error = %error, "skipping restoration: open lifecycle lookup failed");
                return;
            }
        };
        let present = events
            .iter()
            .map(|event| &event.outage_id)
            .collect::<HashSet<&OutageId>>();

        for lifecycle in open
            .into_iter()
            .filter(|lifecycle| !present.contains(&lifecycle.outage_id))
        {
            self.restore(&lifecycle, now, report).await;
        }
    }

    async fn restore(
        &self,
        lifecycle: &OpenLifecycle,
        now: DateTime<Utc>,
        report: &mut ReconcileReport,
    ) {
        let ended_at = now.max(lifecycle.started_at);
        let fix_duration = FixDuration::between(lifecycle.started_at, ended_at);
        match self
            .tracker_store
            .restore_if_open(&lifecycle.outage_id, ended_at, fix_duration)
            .await
        {
            Ok(true) => report.lifecycles_restored += 1,
            Ok(false) => {
                report.restorations_skipped += 1;
                debug!(outage_id = %lifecycle.outage_id, "lifecycle already restored");
            }
            Err(error) => {
                report.persistence_failures += 1;
                warn!(
                    outage_id = %lifecycle.outage_id,
                    error = %error,
                    "failed to restore outage lifecycle"
                );
            }
        }
    }
}

fn dedupe_by_identifier(snapshot: &[OutageEvent]) -> Vec<&OutageEvent> {
    let mut seen = HashSet::with_capacity(snapshot.len());
    let mut unique = Vec::with_capacity(snapshot.len());
    for event in snapshot {
        if seen.insert(&event.outage_id) {
            unique.push(event);
        }
    }
    unique
}
