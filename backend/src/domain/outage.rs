//! Outage data model shared by the reconciliation engine and its adapters.
//!
//! Two records exist per outage:
//! - [`OutageEvent`]: the raw report as the provider published it, written
//!   once per identifier;
//! - [`TrackedOutage`]: the enriched lifecycle, created open and restored at
//!   most once.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fix_duration::FixDuration;

/// Validation errors returned by [`OutageId::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutageIdValidationError {
    /// The identifier was empty or only whitespace.
    Empty,
    /// The identifier had leading or trailing whitespace.
    SurroundingWhitespace,
}

impl fmt::Display for OutageIdValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "outage identifier must not be empty"),
            Self::SurroundingWhitespace => write!(
                f,
                "outage identifier must not have leading or trailing whitespace"
            ),
        }
    }
}

impl std::error::Error for OutageIdValidationError {}

/// Provider-assigned outage identifier.
///
/// # Examples
/// ```
/// use outage_tracker::domain::OutageId;
///
/// let id = OutageId::new("2301234").expect("valid identifier");
/// assert_eq!(id.as_ref(), "2301234");
/// assert!(OutageId::new("  ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OutageId(String);

impl OutageId {
    /// Validate and construct an identifier.
    pub fn new(value: impl Into<String>) -> Result<Self, OutageIdValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(OutageIdValidationError::Empty);
        }
        if raw.trim() != raw {
            return Err(OutageIdValidationError::SurroundingWhitespace);
        }
        Ok(Self(raw))
    }
}

impl AsRef<str> for OutageId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for OutageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OutageId {
    type Error = OutageIdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OutageId> for String {
    fn from(value: OutageId) -> Self {
        value.0
    }
}

/// One outage as reported by the upstream provider in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutageEvent {
    /// Provider-assigned identifier, unique across jurisdictions.
    pub outage_id: OutageId,
    /// Latitude of the reporting device in WGS84.
    pub latitude: f64,
    /// Longitude of the reporting device in WGS84.
    pub longitude: f64,
    /// Number of customers affected.
    pub affected_customers: u32,
    /// Free-text cause; empty when the provider gives none.
    pub cause: String,
    /// Provider jurisdiction code, for example `DEC`.
    pub jurisdiction: String,
    /// Polygon describing the affected area, kept as the provider's JSON.
    pub convex_hull: serde_json::Value,
}

/// Raw event as persisted, including the time it was first written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredOutageEvent {
    /// The raw event payload.
    #[serde(flatten)]
    pub event: OutageEvent,
    /// Timestamp of the first write for this identifier.
    pub first_seen_at: DateTime<Utc>,
}

/// Administrative area resolved for an outage coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaAttributes {
    /// State name, for example `North Carolina`.
    pub state: String,
    /// County name, for example `Mecklenburg County`.
    pub county: String,
    /// Census block FIPS code. Kept as text so leading zeros survive.
    pub block_fips: String,
}

/// Lifecycle state of a tracked outage.
///
/// The restored variant carries the two fields that are written exactly once,
/// so an open record can never hold an end timestamp or duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum LifecycleState {
    /// Still present in the provider's snapshots.
    Open,
    /// Absent from a snapshot after being tracked.
    #[serde(rename_all = "camelCase")]
    Restored {
        /// When the outage was first observed missing.
        ended_at: DateTime<Utc>,
        /// Elapsed time between start and end.
        fix_duration: FixDuration,
    },
}

impl LifecycleState {
    /// Return `true` while the outage has not been restored.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Enriched lifecycle record for one outage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedOutage {
    /// Identifier shared with the raw [`OutageEvent`].
    pub outage_id: OutageId,
    /// Latitude copied from the first report.
    pub latitude: f64,
    /// Longitude copied from the first report.
    pub longitude: f64,
    /// Area resolved once at creation.
    pub area: AreaAttributes,
    /// Polygon copied from the first report.
    pub convex_hull: serde_json::Value,
    /// Provider jurisdiction code.
    pub jurisdiction: String,
    /// Tag naming the upstream provider.
    pub origin: String,
    /// Customers affected at first report.
    pub affected_customers: u32,
    /// Cause at first report.
    pub cause: String,
    /// When tracking started.
    pub started_at: DateTime<Utc>,
    /// Open or restored.
    pub lifecycle: LifecycleState,
}

impl TrackedOutage {
    /// Build a freshly opened lifecycle from a raw event and its resolved area.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use outage_tracker::domain::{AreaAttributes, OutageEvent, OutageId, TrackedOutage};
    ///
    /// let event = OutageEvent {
    ///     outage_id: OutageId::new("A").expect("valid id"),
    ///     latitude: 35.1,
    ///     longitude: -80.8,
    ///     affected_customers: 10,
    ///     cause: "wind".to_owned(),
    ///     jurisdiction: "DEC".to_owned(),
    ///     convex_hull: serde_json::Value::Null,
    /// };
    /// let area = AreaAttributes {
    ///     state: "North Carolina".to_owned(),
    ///     county: "Mecklenburg County".to_owned(),
    ///     block_fips: "371190001001000".to_owned(),
    /// };
    /// let tracked = TrackedOutage::open(&event, area, "Duke Energy", Utc::now());
    /// assert!(tracked.lifecycle.is_open());
    /// ```
    #[must_use]
    pub fn open(
        event: &OutageEvent,
        area: AreaAttributes,
        origin: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            outage_id: event.outage_id.clone(),
            latitude: event.latitude,
            longitude: event.longitude,
            area,
            convex_hull: event.convex_hull.clone(),
            jurisdiction: event.jurisdiction.clone(),
            origin: origin.into(),
            affected_customers: event.affected_customers,
            cause: event.cause.clone(),
            started_at,
            lifecycle: LifecycleState::Open,
        }
    }
}

/// Identifier and start time of a lifecycle that is still open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenLifecycle {
    /// Tracked outage identifier.
    pub outage_id: OutageId,
    /// When tracking started.
    pub started_at: DateTime<Utc>,
}
