//! Internal Diesel row structs for the outage tables.
//!
//! Rows never leave the persistence layer. Conversions into domain types
//! validate identifiers, counts and lifecycle columns, so a hand-edited row
//! surfaces as a query error instead of a corrupt domain value.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::{
    AreaAttributes, FixDuration, LifecycleState, OpenLifecycle, OutageEvent, OutageId,
    StoredOutageEvent, TrackedOutage,
};

use super::schema::{outage_events, outage_tracker};

pub(crate) const LIFECYCLE_OPEN: &str = "open";
pub(crate) const LIFECYCLE_RESTORED: &str = "restored";

/// Reasons a stored row cannot become a domain value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum RowDecodeError {
    #[error("row `{outage_id}` has an invalid identifier")]
    Identifier { outage_id: String },
    #[error("row `{outage_id}` has a negative customer count")]
    NegativeCount { outage_id: String },
    #[error("row `{outage_id}` has unknown lifecycle state `{lifecycle_state}`")]
    UnknownLifecycle {
        outage_id: String,
        lifecycle_state: String,
    },
    #[error("restored row `{outage_id}` is missing its end time or duration")]
    IncompleteRestore { outage_id: String },
    #[error("row `{outage_id}` has a malformed fix duration: {message}")]
    Duration { outage_id: String, message: String },
}

/// Customer counts above `i32::MAX` saturate on the way into the column.
pub(crate) fn customers_to_column(count: u32) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

fn customers_from_column(outage_id: &str, count: i32) -> Result<u32, RowDecodeError> {
    u32::try_from(count).map_err(|_| RowDecodeError::NegativeCount {
        outage_id: outage_id.to_owned(),
    })
}

fn parse_identifier(outage_id: &str) -> Result<OutageId, RowDecodeError> {
    OutageId::new(outage_id).map_err(|_| RowDecodeError::Identifier {
        outage_id: outage_id.to_owned(),
    })
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = outage_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OutageEventRow {
    pub outage_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub affected_customers: i32,
    pub cause: String,
    pub jurisdiction: String,
    pub convex_hull: serde_json::Value,
    pub first_seen_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = outage_events)]
pub(crate) struct NewOutageEventRow<'a> {
    pub outage_id: &'a str,
    pub latitude: f64,
    pub longitude: f64,
    pub affected_customers: i32,
    pub cause: &'a str,
    pub jurisdiction: &'a str,
    pub convex_hull: &'a serde_json::Value,
    pub first_seen_at: DateTime<Utc>,
}

impl<'a> NewOutageEventRow<'a> {
    pub(crate) fn from_event(event: &'a OutageEvent, seen_at: DateTime<Utc>) -> Self {
        Self {
            outage_id: event.outage_id.as_ref(),
            latitude: event.latitude,
            longitude: event.longitude,
            affected_customers: customers_to_column(event.affected_customers),
            cause: event.cause.as_str(),
            jurisdiction: event.jurisdiction.as_str(),
            convex_hull: &event.convex_hull,
            first_seen_at: seen_at,
        }
    }
}

impl TryFrom<OutageEventRow> for StoredOutageEvent {
    type Error = RowDecodeError;

    fn try_from(row: OutageEventRow) -> Result<Self, Self::Error> {
        let affected_customers = customers_from_column(&row.outage_id, row.affected_customers)?;
        Ok(Self {
            event: OutageEvent {
                outage_id: parse_identifier(&row.outage_id)?,
                latitude: row.latitude,
                longitude: row.longitude,
                affected_customers,
                cause: row.cause,
                jurisdiction: row.jurisdiction,
                convex_hull: row.convex_hull,
            },
            first_seen_at: row.first_seen_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = outage_tracker)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TrackedOutageRow {
    pub outage_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub state: String,
    pub county: String,
    pub block_fips: String,
    pub convex_hull: serde_json::Value,
    pub jurisdiction: String,
    pub origin: String,
    pub affected_customers: i32,
    pub cause: String,
    pub lifecycle_state: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub fix_duration: Option<String>,
}

/// Inserts always describe an open lifecycle; restore is a separate update.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = outage_tracker)]
pub(crate) struct NewTrackedOutageRow<'a> {
    pub outage_id: &'a str,
    pub latitude: f64,
    pub longitude: f64,
    pub state: &'a str,
    pub county: &'a str,
    pub block_fips: &'a str,
    pub convex_hull: &'a serde_json::Value,
    pub jurisdiction: &'a str,
    pub origin: &'a str,
    pub affected_customers: i32,
    pub cause: &'a str,
    pub lifecycle_state: &'static str,
    pub started_at: DateTime<Utc>,
}

impl<'a> From<&'a TrackedOutage> for NewTrackedOutageRow<'a> {
    fn from(record: &'a TrackedOutage) -> Self {
        Self {
            outage_id: record.outage_id.as_ref(),
            latitude: record.latitude,
            longitude: record.longitude,
            state: record.area.state.as_str(),
            county: record.area.county.as_str(),
            block_fips: record.area.block_fips.as_str(),
            convex_hull: &record.convex_hull,
            jurisdiction: record.jurisdiction.as_str(),
            origin: record.origin.as_str(),
            affected_customers: customers_to_column(record.affected_customers),
            cause: record.cause.as_str(),
            lifecycle_state: LIFECYCLE_OPEN,
            started_at: record.started_at,
        }
    }
}

fn decode_lifecycle(row: &TrackedOutageRow) -> Result<LifecycleState, RowDecodeError> {
    match row.lifecycle_state.as_str() {
        LIFECYCLE_OPEN => Ok(LifecycleState::Open),
        LIFECYCLE_RESTORED => {
            let (Some(ended_at), Some(raw_duration)) = (row.ended_at, row.fix_duration.as_deref())
            else {
                return Err(RowDecodeError::IncompleteRestore {
                    outage_id: row.outage_id.clone(),
                });
            };
            let fix_duration =
                raw_duration
                    .parse::<FixDuration>()
                    .map_err(|err| RowDecodeError::Duration {
                        outage_id: row.outage_id.clone(),
                        message: err.to_string(),
                    })?;
            Ok(LifecycleState::Restored {
                ended_at,
                fix_duration,
            })
        }
        other => Err(RowDecodeError::UnknownLifecycle {
            outage_id: row.outage_id.clone(),
            lifecycle_state: other.to_owned(),
        }),
    }
}

impl TryFrom<TrackedOutageRow> for TrackedOutage {
    type Error = RowDecodeError;

    fn try_from(row: TrackedOutageRow) -> Result<Self, Self::Error> {
        let lifecycle = decode_lifecycle(&row)?;
        let affected_customers = customers_from_column(&row.outage_id, row.affected_customers)?;
        Ok(Self {
            outage_id: parse_identifier(&row.outage_id)?,
            latitude: row.latitude,
            longitude: row.longitude,
            area: AreaAttributes {
                state: row.state,
                county: row.county,
                block_fips: row.block_fips,
            },
            convex_hull: row.convex_hull,
            jurisdiction: row.jurisdiction,
            origin: row.origin,
            affected_customers,
            cause: row.cause,
            started_at: row.started_at,
            lifecycle,
        })
    }
}

/// Projection of `outage_tracker` used when looking for restorations.
#[derive(Debug, Clone, Queryable)]
pub(crate) struct OpenLifecycleRow {
    pub outage_id: String,
    pub started_at: DateTime<Utc>,
}

impl TryFrom<OpenLifecycleRow> for OpenLifecycle {
    type Error = RowDecodeError;

    fn try_from(row: OpenLifecycleRow) -> Result<Self, Self::Error> {
        Ok(Self {
            outage_id: parse_identifier(&row.outage_id)?,
            started_at: row.started_at,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Row conversion coverage.

    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[fixture]
    fn started_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0)
            .single()
            .expect("valid time")
    }

    #[fixture]
    fn tracked_row(started_at: DateTime<Utc>) -> TrackedOutageRow {
        TrackedOutageRow {
            outage_id: "2301234".to_owned(),
            latitude: 35.22,
            longitude: -80.84,
            state: "North Carolina".to_owned(),
            county: "Mecklenburg County".to_owned(),
            block_fips: "371190001001000".to_owned(),
            convex_hull: serde_json::Value::Null,
            jurisdiction: "DEC".to_owned(),
            origin: "Duke Energy".to_owned(),
            affected_customers: 12,
            cause: "tree".to_owned(),
            lifecycle_state: LIFECYCLE_OPEN.to_owned(),
            started_at,
            ended_at: None,
            fix_duration: None,
        }
    }

    #[rstest]
    fn open_rows_decode_as_open(tracked_row: TrackedOutageRow) {
        let tracked = TrackedOutage::try_from(tracked_row).expect("row should decode");
        assert!(tracked.lifecycle.is_open());
        assert_eq!(tracked.area.block_fips, "371190001001000");
    }

    #[rstest]
    fn restored_rows_carry_end_and_duration(
        mut tracked_row: TrackedOutageRow,
        started_at: DateTime<Utc>,
    ) {
        let ended_at = started_at + chrono::TimeDelta::seconds(90_061);
        tracked_row.lifecycle_state = LIFECYCLE_RESTORED.to_owned();
        tracked_row.ended_at = Some(ended_at);
        tracked_row.fix_duration = Some("1d 1h 1m 1s".to_owned());

        let tracked = TrackedOutage::try_from(tracked_row).expect("row should decode");

        assert_eq!(
            tracked.lifecycle,
            LifecycleState::Restored {
                ended_at,
                fix_duration: FixDuration::from_seconds(90_061),
            }
        );
    }

    #[rstest]
    fn restored_rows_without_duration_are_rejected(mut tracked_row: TrackedOutageRow) {
        tracked_row.lifecycle_state = LIFECYCLE_RESTORED.to_owned();

        let err = TrackedOutage::try_from(tracked_row).expect_err("row must not decode");
        assert!(matches!(err, RowDecodeError::IncompleteRestore { .. }));
    }

    #[rstest]
    fn unknown_lifecycle_states_are_rejected(mut tracked_row: TrackedOutageRow) {
        tracked_row.lifecycle_state = "closed".to_owned();

        let err = TrackedOutage::try_from(tracked_row).expect_err("row must not decode");
        assert!(matches!(err, RowDecodeError::UnknownLifecycle { .. }));
    }

    #[rstest]
    fn negative_counts_are_rejected(mut tracked_row: TrackedOutageRow) {
        tracked_row.affected_customers = -1;

        let err = TrackedOutage::try_from(tracked_row).expect_err("row must not decode");
        assert!(matches!(err, RowDecodeError::NegativeCount { .. }));
    }

    #[rstest]
    #[case::small(42, 42)]
    #[case::saturates(u32::MAX, i32::MAX)]
    fn customer_counts_fit_the_column(#[case] count: u32, #[case] expected: i32) {
        assert_eq!(customers_to_column(count), expected);
    }

    #[rstest]
    fn new_tracked_rows_start_open(tracked_row: TrackedOutageRow) {
        let tracked = TrackedOutage::try_from(tracked_row).expect("row should decode");
        let insert = NewTrackedOutageRow::from(&tracked);

        assert_eq!(insert.lifecycle_state, LIFECYCLE_OPEN);
        assert_eq!(insert.outage_id, "2301234");
        assert_eq!(insert.county, "Mecklenburg County");
    }
}
