//! Per-cycle counters returned by the reconciliation engine.

use serde::Serialize;

/// Counts describing what one reconciliation cycle did.
///
/// The report exists for observability; callers never branch on it for
/// correctness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Raw events written for the first time.
    pub events_persisted: usize,
    /// Raw events whose identifier was already stored.
    pub events_unchanged: usize,
    /// Lifecycles opened by this cycle.
    pub lifecycles_created: usize,
    /// Lifecycle inserts that found a row created by an overlapping run.
    pub lifecycles_already_tracked: usize,
    /// Events left untracked because area lookup failed.
    pub enrichment_failures: usize,
    /// Lifecycles this cycle moved to restored.
    pub lifecycles_restored: usize,
    /// Restorations that found the lifecycle already restored.
    pub restorations_skipped: usize,
    /// Per-row or per-step store errors.
    pub persistence_failures: usize,
}

impl ReconcileReport {
    /// Return `true` when nothing failed during the cycle.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.enrichment_failures == 0 && self.persistence_failures == 0
    }

    /// Emit the report as one structured `info` event.
    pub fn log(&self) {
        tracing::info!(
            events_persisted = self.events_persisted,
            events_unchanged = self.events_unchanged,
            lifecycles_created = self.lifecycles_created,
            lifecycles_already_tracked = self.lifecycles_already_tracked,
            enrichment_failures = self.enrichment_failures,
            lifecycles_restored = self.lifecycles_restored,
            restorations_skipped = self.restorations_skipped,
            persistence_failures = self.persistence_failures,
            "outage reconciliation cycle completed"
        );
    }
}
