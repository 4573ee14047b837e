//! Domain primitives, ports, and services for outage tracking.
//!
//! Public surface:
//! - [`OutageEvent`] and [`TrackedOutage`]: raw report and enriched lifecycle.
//! - [`FixDuration`]: elapsed repair time in `"{d}d {h}h {m}m {s}s"` form.
//! - [`OutageReconciler`]: merges one snapshot into persisted state.
//! - [`OutagePollingCycle`]: fetch-then-reconcile glue with credential refresh.
//! - [`OutageExport`]: JSON rendering of both tables.

pub mod fix_duration;
pub mod outage;
pub mod outage_export;
pub mod polling_cycle;
pub mod ports;
pub mod reconciliation;

pub use self::fix_duration::{FixDuration, FixDurationParseError};
pub use self::outage::{
    AreaAttributes, LifecycleState, OpenLifecycle, OutageEvent, OutageId,
    OutageIdValidationError, StoredOutageEvent, TrackedOutage,
};
pub use self::outage_export::{OutageExport, OutageExportError};
pub use self::polling_cycle::{OutagePollingCycle, PollingCycleError};
pub use self::reconciliation::{
    OutageReconciler, ReconcileReport, ReconcilerConfig, ReconcilerPorts,
};
