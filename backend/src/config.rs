//! Tracker configuration loaded via OrthoConfig.
//!
//! Values merge CLI flags, `OUTAGE_TRACKER_*` environment variables, and
//! configuration files. Every field is optional; accessors apply defaults.

use std::env;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::ReconcilerConfig;
use crate::domain::reconciliation::DEFAULT_ORIGIN;

const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;
const DEFAULT_JURISDICTIONS: [&str; 4] = ["DEF", "DEC", "DEI", "DEM"];
const DEFAULT_OUTAGES_URL: &str = "https://prod.apigee.duke-energy.app/outage-maps/v1/outages";
const DEFAULT_PROVIDER_CONFIG_URL: &str =
    "https://outagemap.duke-energy.com/config/config.prod.json";
const DEFAULT_AREA_URL: &str = "https://geo.fcc.gov/api/census/area";
const DEFAULT_CENSUS_YEAR: u16 = 2020;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_CONCURRENT_ENRICHMENTS: usize = 4;

/// Fallback variable consulted when no database URL is configured.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Configuration values for the polling service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "OUTAGE_TRACKER")]
pub struct TrackerSettings {
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Seconds between polling cycles.
    pub poll_interval_secs: Option<u64>,
    /// Comma-separated provider jurisdiction codes.
    pub jurisdictions: Option<String>,
    /// Outage snapshot endpoint.
    pub outages_url: Option<String>,
    /// Provider configuration document holding the API key pair.
    pub provider_config_url: Option<String>,
    /// Census area lookup endpoint.
    pub area_url: Option<String>,
    /// Census vintage requested from the area lookup.
    pub census_year: Option<u16>,
    /// Timeout applied to every outbound HTTP request.
    pub http_timeout_secs: Option<u64>,
    /// Upper bound on concurrent area lookups per cycle.
    pub max_concurrent_enrichments: Option<usize>,
    /// Origin tag stored on new lifecycles.
    pub origin: Option<String>,
}

impl TrackerSettings {
    /// Configured database URL, falling back to `DATABASE_URL`.
    #[must_use]
    pub fn database_url(&self) -> Option<String> {
        self.database_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| env::var(DATABASE_URL_ENV).ok())
            .filter(|url| !url.trim().is_empty())
    }

    /// Interval between polling cycles. Zero is raised to one second.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(
            self.poll_interval_secs
                .unwrap_or(DEFAULT_POLL_INTERVAL_SECS)
                .max(1),
        )
    }

    /// Jurisdiction codes, trimmed and upper-cased, without blanks.
    #[must_use]
    pub fn jurisdictions(&self) -> Vec<String> {
        let parsed = self
            .jurisdictions
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|code| !code.is_empty())
                    .map(str::to_ascii_uppercase)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        if parsed.is_empty() {
            DEFAULT_JURISDICTIONS.map(str::to_owned).to_vec()
        } else {
            parsed
        }
    }

    /// Outage snapshot endpoint.
    #[must_use]
    pub fn outages_url(&self) -> &str {
        self.outages_url.as_deref().unwrap_or(DEFAULT_OUTAGES_URL)
    }

    /// Provider configuration document URL.
    #[must_use]
    pub fn provider_config_url(&self) -> &str {
        self.provider_config_url
            .as_deref()
            .unwrap_or(DEFAULT_PROVIDER_CONFIG_URL)
    }

    /// Census area lookup endpoint.
    #[must_use]
    pub fn area_url(&self) -> &str {
        self.area_url.as_deref().unwrap_or(DEFAULT_AREA_URL)
    }

    /// Census vintage sent with every area lookup.
    #[must_use]
    pub fn census_year(&self) -> u16 {
        self.census_year.unwrap_or(DEFAULT_CENSUS_YEAR)
    }

    /// Timeout for outbound HTTP requests. Zero is raised to one second.
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(
            self.http_timeout_secs
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS)
                .max(1),
        )
    }

    /// Engine tunables derived from these settings.
    #[must_use]
    pub fn reconciler_config(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            max_concurrent_enrichments: self
                .max_concurrent_enrichments
                .unwrap_or(DEFAULT_MAX_CONCURRENT_ENRICHMENTS)
                .max(1),
            origin: self
                .origin
                .clone()
                .unwrap_or_else(|| DEFAULT_ORIGIN.to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for tracker configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 11] = [
        "OUTAGE_TRACKER_DATABASE_URL",
        "OUTAGE_TRACKER_POLL_INTERVAL_SECS",
        "OUTAGE_TRACKER_JURISDICTIONS",
        "OUTAGE_TRACKER_OUTAGES_URL",
        "OUTAGE_TRACKER_PROVIDER_CONFIG_URL",
        "OUTAGE_TRACKER_AREA_URL",
        "OUTAGE_TRACKER_CENSUS_YEAR",
        "OUTAGE_TRACKER_HTTP_TIMEOUT_SECS",
        "OUTAGE_TRACKER_MAX_CONCURRENT_ENRICHMENTS",
        "OUTAGE_TRACKER_ORIGIN",
        DATABASE_URL_ENV,
    ];

    fn cleared_with(overrides: &[(&str, &str)]) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    fn load_from_empty_args() -> TrackerSettings {
        TrackerSettings::load_from_iter([OsString::from("outage-tracker")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_are_used_when_missing() {
        let _guard = lock_env(cleared_with(&[]));

        let settings = load_from_empty_args();

        assert_eq!(settings.database_url(), None);
        assert_eq!(settings.poll_interval(), Duration::from_secs(300));
        assert_eq!(settings.jurisdictions(), vec!["DEF", "DEC", "DEI", "DEM"]);
        assert_eq!(settings.outages_url(), DEFAULT_OUTAGES_URL);
        assert_eq!(settings.provider_config_url(), DEFAULT_PROVIDER_CONFIG_URL);
        assert_eq!(settings.area_url(), DEFAULT_AREA_URL);
        assert_eq!(settings.census_year(), 2020);
        assert_eq!(settings.http_timeout(), Duration::from_secs(30));
        assert_eq!(settings.reconciler_config(), ReconcilerConfig::default());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(cleared_with(&[
            ("OUTAGE_TRACKER_DATABASE_URL", "postgres://localhost/outages"),
            ("OUTAGE_TRACKER_POLL_INTERVAL_SECS", "60"),
            ("OUTAGE_TRACKER_JURISDICTIONS", " dec, ,dep "),
            ("OUTAGE_TRACKER_HTTP_TIMEOUT_SECS", "5"),
            ("OUTAGE_TRACKER_MAX_CONCURRENT_ENRICHMENTS", "8"),
            ("OUTAGE_TRACKER_ORIGIN", "Progress Energy"),
        ]));

        let settings = load_from_empty_args();

        assert_eq!(
            settings.database_url().as_deref(),
            Some("postgres://localhost/outages")
        );
        assert_eq!(settings.poll_interval(), Duration::from_secs(60));
        assert_eq!(settings.jurisdictions(), vec!["DEC", "DEP"]);
        assert_eq!(settings.http_timeout(), Duration::from_secs(5));
        let reconciler = settings.reconciler_config();
        assert_eq!(reconciler.max_concurrent_enrichments, 8);
        assert_eq!(reconciler.origin, "Progress Energy");
    }

    #[rstest]
    fn database_url_falls_back_to_the_standard_variable() {
        let _guard = lock_env(cleared_with(&[(
            DATABASE_URL_ENV,
            "postgres://fallback/outages",
        )]));

        let settings = load_from_empty_args();

        assert_eq!(
            settings.database_url().as_deref(),
            Some("postgres://fallback/outages")
        );
    }

    #[rstest]
    fn zero_values_are_raised_to_minimums() {
        let _guard = lock_env(cleared_with(&[
            ("OUTAGE_TRACKER_POLL_INTERVAL_SECS", "0"),
            ("OUTAGE_TRACKER_HTTP_TIMEOUT_SECS", "0"),
            ("OUTAGE_TRACKER_MAX_CONCURRENT_ENRICHMENTS", "0"),
        ]));

        let settings = load_from_empty_args();

        assert_eq!(settings.poll_interval(), Duration::from_secs(1));
        assert_eq!(settings.http_timeout(), Duration::from_secs(1));
        assert_eq!(settings.reconciler_config().max_concurrent_enrichments, 1);
    }
}
