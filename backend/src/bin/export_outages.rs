#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]
//! Dump the raw outage events and tracked lifecycles to JSON files.
//!
//! # Examples
//! ```sh
//! cargo run --manifest-path backend/Cargo.toml --bin export-outages -- --output-dir exports
//! ```

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use tokio::runtime::Builder;

use outage_tracker::config::DATABASE_URL_ENV;
use outage_tracker::domain::OutageExport;
use outage_tracker::outbound::persistence::{
    DbPool, DieselOutageStore, DieselTrackerStore, PoolConfig,
};

/// `export-outages` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "export-outages",
    about = "Write outage_events.json and outage_tracker.json from the outage database",
    version
)]
struct CliArgs {
    /// Directory receiving the two JSON files. Created when missing.
    #[arg(long = "output-dir", value_name = "path", default_value = ".")]
    output_dir: PathBuf,
    /// Database connection URL. Falls back to `DATABASE_URL` when omitted.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
}

fn main() -> io::Result<()> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let database_url = resolve_database_url(args.database_url, env::var(DATABASE_URL_ENV).ok())?;

    let pool = DbPool::new(PoolConfig::new(&database_url).with_max_size(1))
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;
    let outage_store = DieselOutageStore::new(pool.clone());
    let tracker_store = DieselTrackerStore::new(pool);

    let export = OutageExport::collect(&outage_store, &tracker_store)
        .await
        .map_err(|error| io::Error::other(format!("read outage tables: {error}")))?;
    let artifacts = export
        .write_to(&args.output_dir)
        .map_err(|error| io::Error::other(format!("write export files: {error}")))?;

    let mut stdout = io::stdout().lock();
    writeln!(
        stdout,
        "Wrote {} events: {}",
        export.events.len(),
        artifacts.events_path.display()
    )?;
    writeln!(
        stdout,
        "Wrote {} tracked outages: {}",
        export.tracked.len(),
        artifacts.tracker_path.display()
    )?;
    Ok(())
}

fn resolve_database_url(explicit: Option<String>, from_env: Option<String>) -> io::Result<String> {
    if let Some(value) = explicit {
        if value.trim().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "--database-url must not be empty when provided",
            ));
        }
        return Ok(value);
    }

    match from_env {
        Some(value) if !value.trim().is_empty() => Ok(value),
        Some(_) => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "DATABASE_URL must not be empty",
        )),
        None => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "database URL missing: set --database-url or DATABASE_URL",
        )),
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for CLI parsing helpers.

    use rstest::rstest;

    use super::{CliArgs, resolve_database_url};
    use clap::Parser;

    #[rstest]
    fn explicit_url_wins_over_environment() {
        let url = resolve_database_url(
            Some("postgres://cli/db".to_owned()),
            Some("postgres://env/db".to_owned()),
        )
        .expect("explicit URL should resolve");
        assert_eq!(url, "postgres://cli/db");
    }

    #[rstest]
    fn environment_is_used_when_flag_is_absent() {
        let url = resolve_database_url(None, Some("postgres://env/db".to_owned()))
            .expect("environment URL should resolve");
        assert_eq!(url, "postgres://env/db");
    }

    #[rstest]
    #[case::blank_flag(Some("   "), None)]
    #[case::blank_env(None, Some(""))]
    #[case::missing(None, None)]
    fn unusable_urls_are_rejected(#[case] explicit: Option<&str>, #[case] from_env: Option<&str>) {
        let error = resolve_database_url(explicit.map(str::to_owned), from_env.map(str::to_owned))
            .expect_err("URL should be rejected");
        assert_eq!(error.kind(), std::io::ErrorKind::InvalidInput);
    }

    #[rstest]
    fn output_dir_defaults_to_current_directory() {
        let args = CliArgs::try_parse_from(["export-outages"]).expect("arguments should parse");
        assert_eq!(args.output_dir, std::path::PathBuf::from("."));
        assert!(args.database_url.is_none());
    }
}
