//! Outage tracker entry point: polls the provider and reconciles snapshots
//! until interrupted.

use std::sync::Arc;

use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use url::Url;

use outage_tracker::config::{DATABASE_URL_ENV, TrackerSettings};
use outage_tracker::domain::{OutagePollingCycle, OutageReconciler, ReconcilerPorts};
use outage_tracker::outbound::duke_energy::{DukeEnergyCredentialSource, DukeEnergyOutageFeed};
use outage_tracker::outbound::fcc_area::FccAreaGeoEnricher;
use outage_tracker::outbound::persistence::{
    DbPool, DieselOutageStore, DieselTrackerStore, PoolConfig, run_pending_migrations,
};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = TrackerSettings::load().wrap_err("load tracker settings")?;
    let database_url = settings
        .database_url()
        .ok_or_else(|| eyre!("database URL missing: set OUTAGE_TRACKER_DATABASE_URL or {DATABASE_URL_ENV}"))?;

    run_pending_migrations(&database_url)
        .await
        .wrap_err("apply database migrations")?;
    let pool = DbPool::new(PoolConfig::new(&database_url))
        .await
        .wrap_err("create database pool")?;

    let cycle = build_polling_cycle(&settings, pool)?;
    info!(
        jurisdictions = ?cycle.jurisdictions(),
        interval_secs = settings.poll_interval().as_secs(),
        "outage polling started"
    );

    cycle
        .run_every(settings.poll_interval(), async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await;
    Ok(())
}

fn build_polling_cycle(settings: &TrackerSettings, pool: DbPool) -> Result<OutagePollingCycle> {
    let timeout = settings.http_timeout();
    let feed = DukeEnergyOutageFeed::new(parse_url(settings.outages_url())?, timeout)
        .wrap_err("build outage feed client")?;
    let credential_source =
        DukeEnergyCredentialSource::new(parse_url(settings.provider_config_url())?, timeout)
            .wrap_err("build credential client")?;
    let enricher =
        FccAreaGeoEnricher::new(parse_url(settings.area_url())?, settings.census_year(), timeout)
            .wrap_err("build area lookup client")?;

    let ports = ReconcilerPorts::new(
        Arc::new(DieselOutageStore::new(pool.clone())),
        Arc::new(DieselTrackerStore::new(pool)),
        Arc::new(enricher),
    );
    let reconciler =
        OutageReconciler::new(ports, Arc::new(DefaultClock), settings.reconciler_config());

    Ok(OutagePollingCycle::new(
        Arc::new(feed),
        Arc::new(credential_source),
        reconciler,
        settings.jurisdictions(),
    ))
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).wrap_err_with(|| format!("invalid URL `{raw}`"))
}
