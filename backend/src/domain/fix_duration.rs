//! Elapsed outage repair time rendered as `"{d}d {h}h {m}m {s}s"`.
//!
//! Components come from integer division on the whole-second count, so a
//! 25-hour outage renders as `1d 1h 0m 0s` regardless of calendar changes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;

/// Error returned when a stored duration string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("fix duration must look like `1d 2h 3m 4s`, got `{raw}`")]
pub struct FixDurationParseError {
    raw: String,
}

/// Whole-second outage repair duration.
///
/// # Examples
/// ```
/// use outage_tracker::domain::FixDuration;
///
/// let duration = FixDuration::from_seconds(90_061);
/// assert_eq!(duration.to_string(), "1d 1h 1m 1s");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FixDuration {
    total_seconds: u64,
}

impl FixDuration {
    /// Build a duration from a whole-second count.
    #[must_use]
    pub const fn from_seconds(total_seconds: u64) -> Self {
        Self { total_seconds }
    }

    /// Elapsed time between `started_at` and `ended_at`, truncated to whole
    /// seconds. A negative span (clock skew) clamps to zero.
    #[must_use]
    pub fn between(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> Self {
        let seconds = ended_at.signed_duration_since(started_at).num_seconds();
        Self::from_seconds(u64::try_from(seconds).unwrap_or(0))
    }

    /// Total elapsed seconds.
    #[must_use]
    pub const fn total_seconds(self) -> u64 {
        self.total_seconds
    }

    /// Whole days.
    #[must_use]
    #[expect(
        clippy::integer_division,
        clippy::integer_division_remainder_used,
        reason = "duration components are whole units by definition"
    )]
    pub const fn days(self) -> u64 {
        self.total_seconds / SECONDS_PER_DAY
    }

    /// Hours left after removing whole days.
    #[must_use]
    #[expect(
        clippy::integer_division,
        clippy::integer_division_remainder_used,
        reason = "duration components are whole units by definition"
    )]
    pub const fn hours(self) -> u64 {
        (self.total_seconds % SECONDS_PER_DAY) / SECONDS_PER_HOUR
    }

    /// Minutes left after removing whole hours.
    #[must_use]
    #[expect(
        clippy::integer_division,
        clippy::integer_division_remainder_used,
        reason = "duration components are whole units by definition"
    )]
    pub const fn minutes(self) -> u64 {
        (self.total_seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE
    }

    /// Seconds left after removing whole minutes.
    #[must_use]
    #[expect(
        clippy::integer_division_remainder_used,
        reason = "duration components are whole units by definition"
    )]
    pub const fn seconds(self) -> u64 {
        self.total_seconds % SECONDS_PER_MINUTE
    }
}

impl fmt::Display for FixDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}d {}h {}m {}s",
            self.days(),
            self.hours(),
            self.minutes(),
            self.seconds()
        )
    }
}

impl FromStr for FixDuration {
    type Err = FixDurationParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let error = || FixDurationParseError {
            raw: raw.to_owned(),
        };
        let mut parts = raw.split(' ');
        let mut component = |suffix: char| -> Result<u64, FixDurationParseError> {
            parts
                .next()
                .and_then(|part| part.strip_suffix(suffix))
                .and_then(|digits| digits.parse::<u64>().ok())
                .ok_or_else(error)
        };
        let days = component('d')?;
        let hours = component('h')?;
        let minutes = component('m')?;
        let seconds = component('s')?;
        if parts.next().is_some() {
            return Err(error());
        }

        days.checked_mul(SECONDS_PER_DAY)
            .and_then(|total| total.checked_add(hours.checked_mul(SECONDS_PER_HOUR)?))
            .and_then(|total| total.checked_add(minutes.checked_mul(SECONDS_PER_MINUTE)?))
            .and_then(|total| total.checked_add(seconds))
            .map(Self::from_seconds)
            .ok_or_else(error)
    }
}

impl TryFrom<String> for FixDuration {
    type Error = FixDurationParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FixDuration> for String {
    fn from(value: FixDuration) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    //! Formatting and parsing coverage for repair durations.

    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use rstest::rstest;

    #[rstest]
    #[case::zero(0, "0d 0h 0m 0s")]
    #[case::one_of_each(90_061, "1d 1h 1m 1s")]
    #[case::twenty_five_hours(25 * 3_600, "1d 1h 0m 0s")]
    #[case::just_under_a_day(86_399, "0d 23h 59m 59s")]
    #[case::many_days(10 * 86_400 + 61, "10d 0h 1m 1s")]
    fn formats_components_by_integer_division(#[case] seconds: u64, #[case] expected: &str) {
        assert_eq!(FixDuration::from_seconds(seconds).to_string(), expected);
    }

    #[rstest]
    fn between_truncates_sub_second_remainders() {
        let start = Utc
            .with_ymd_and_hms(2026, 10, 1, 8, 0, 0)
            .single()
            .expect("valid time");
        let end = start + TimeDelta::seconds(90_061) + TimeDelta::milliseconds(999);

        assert_eq!(FixDuration::between(start, end).to_string(), "1d 1h 1m 1s");
    }

    #[rstest]
    fn between_clamps_negative_spans_to_zero() {
        let start = Utc
            .with_ymd_and_hms(2026, 10, 1, 8, 0, 0)
            .single()
            .expect("valid time");
        let end = start - TimeDelta::seconds(5);

        assert_eq!(FixDuration::between(start, end).total_seconds(), 0);
    }

    #[rstest]
    fn parses_its_own_rendering() {
        let parsed: FixDuration = "3d 4h 5m 6s".parse().expect("duration should parse");
        assert_eq!(parsed, FixDuration::from_seconds(3 * 86_400 + 4 * 3_600 + 5 * 60 + 6));
    }

    #[rstest]
    #[case::empty("")]
    #[case::missing_seconds("1d 2h 3m")]
    #[case::wrong_suffix("1d 2h 3m 4x")]
    #[case::trailing("1d 2h 3m 4s extra")]
    #[case::negative("-1d 2h 3m 4s")]
    fn rejects_malformed_strings(#[case] raw: &str) {
        assert!(raw.parse::<FixDuration>().is_err(), "`{raw}` should not parse");
    }
}
