//! One fetch-then-reconcile cycle and the timer that repeats it.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::domain::ports::{
    CredentialSource, CredentialSourceError, OutageFeed, OutageFeedError, ProviderCredentials,
};
use crate::domain::{OutageEvent, OutageReconciler, ReconcileReport};

/// Reasons a polling cycle stopped before reconciling.
///
/// Either way nothing was written for the cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollingCycleError {
    /// Fresh credentials could not be obtained.
    #[error("could not obtain provider credentials: {0}")]
    Credentials(#[from] CredentialSourceError),
    /// The snapshot could not be fetched.
    #[error("could not fetch outage snapshot: {0}")]
    Fetch(#[from] OutageFeedError),
}

/// Glue between the outage feed and the reconciliation engine.
///
/// Credentials are cached between cycles and replaced when the feed rejects
/// them.
pub struct OutagePollingCycle {
    feed: Arc<dyn OutageFeed>,
    credential_source: Arc<dyn CredentialSource>,
    reconciler: OutageReconciler,
    jurisdictions: Vec<String>,
    credentials: Mutex<Option<ProviderCredentials>>,
}

impl OutagePollingCycle {
    /// Build a cycle fetching `jurisdictions` from `feed`, with credentials
    /// issued by `credential_source` on first use.
    #[must_use]
    pub const fn new(
        feed: Arc<dyn OutageFeed>,
        credential_source: Arc<dyn CredentialSource>,
        reconciler: OutageReconciler,
        jurisdictions: Vec<String>,
    ) -> Self {
        Self {
            feed,
            credential_source,
            reconciler,
            jurisdictions,
            credentials: Mutex::new(None),
        }
    }

    /// Jurisdictions fetched on every cycle.
    #[must_use]
    pub fn jurisdictions(&self) -> &[String] {
        &self.jurisdictions
    }

    /// Fetch one snapshot and reconcile it.
    ///
    /// An `Unauthorized` fetch triggers exactly one credential refresh and
    /// retry. Any other failure aborts the cycle before the first write.
    pub async fn run_once(&self) -> Result<ReconcileReport, PollingCycleError> {
        let snapshot = self.fetch_with_refresh().await?;
        Ok(self.reconciler.reconcile(&snapshot).await)
    }

    /// Run [`Self::run_once`] on a fixed interval until `shutdown` resolves.
    ///
    /// The first cycle starts immediately. Cycles never overlap; a slow cycle
    /// causes missed ticks to be skipped. `shutdown` is only observed between
    /// cycles, so an in-flight cycle always completes.
    pub async fn run_every<F>(&self, interval: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!("outage polling stopped");
                    return;
                }
                _ = ticker.tick() => {}
            }

            if let Err(err) = self.run_once().await {
                error!(error = %err, "outage polling cycle failed");
            }
        }
    }

    async fn fetch_with_refresh(&self) -> Result<Vec<OutageEvent>, PollingCycleError> {
        let credentials = match self.cached_credentials() {
            Some(cached) => cached,
            None => self.refresh_credentials().await?,
        };

        match self
            .feed
            .fetch_snapshot(&self.jurisdictions, &credentials)
            .await
        {
            Ok(snapshot) => Ok(snapshot),
            Err(err) if err.is_unauthorized() => {
                info!("outage feed rejected credentials; refreshing");
                let refreshed = self.refresh_credentials().await?;
                Ok(self
                    .feed
                    .fetch_snapshot(&self.jurisdictions, &refreshed)
                    .await?)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn refresh_credentials(&self) -> Result<ProviderCredentials, PollingCycleError> {
        let issued = self.credential_source.issue().await?;
        *self
            .credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(issued.clone());
        Ok(issued)
    }

    fn cached_credentials(&self) -> Option<ProviderCredentials> {
        self.credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    //! Credential caching and refresh behaviour of the polling cycle.

    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use mockall::Sequence;
    use rstest::rstest;

    use super::*;
    use crate::domain::ports::{MockCredentialSource, MockOutageFeed};
    use crate::domain::{ReconcilerConfig, ReconcilerPorts};
    use crate::test_support::outage_tracking::{
        InMemoryOutageTables, MutableClock, ScriptedGeoEnricher, outage_event,
    };

    fn reconciler(tables: &Arc<InMemoryOutageTables>) -> OutageReconciler {
        let now = Utc
            .with_ymd_and_hms(2026, 10, 1, 8, 0, 0)
            .single()
            .expect("valid time");
        OutageReconciler::new(
            ReconcilerPorts::new(
                Arc::new(tables.outage_store()),
                Arc::new(tables.tracker_store()),
                Arc::new(ScriptedGeoEnricher::default()),
            ),
            Arc::new(MutableClock::new(now)),
            ReconcilerConfig::default(),
        )
    }

    fn credentials(tag: &str) -> ProviderCredentials {
        ProviderCredentials::new(format!("Basic {tag}"), None)
    }

    fn cycle(
        feed: MockOutageFeed,
        source: MockCredentialSource,
        tables: &Arc<InMemoryOutageTables>,
    ) -> OutagePollingCycle {
        OutagePollingCycle::new(
            Arc::new(feed),
            Arc::new(source),
            reconciler(tables),
            vec!["DEC".to_owned(), "DEP".to_owned()],
        )
    }

    #[rstest]
    #[tokio::test]
    async fn credentials_are_issued_once_and_cached() {
        let tables = InMemoryOutageTables::new();
        let mut source = MockCredentialSource::new();
        source
            .expect_issue()
            .times(1)
            .returning(|| Ok(credentials("first")));
        let mut feed = MockOutageFeed::new();
        feed.expect_fetch_snapshot()
            .withf(|jurisdictions, creds| {
                jurisdictions.len() == 2 && creds.authorization() == "Basic first"
            })
            .times(2)
            .returning(|_, _| Ok(vec![outage_event("A", 35.1, -80.8)]));
        let cycle = cycle(feed, source, &tables);

        let first = cycle.run_once().await.expect("first cycle");
        let second = cycle.run_once().await.expect("second cycle");

        assert_eq!(first.events_persisted, 1);
        assert_eq!(second.events_unchanged, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn unauthorized_fetch_refreshes_credentials_once_and_retries() {
        let tables = InMemoryOutageTables::new();
        let mut seq = Sequence::new();
        let mut source = MockCredentialSource::new();
        source
            .expect_issue()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(credentials("stale")));
        let mut feed = MockOutageFeed::new();
        feed.expect_fetch_snapshot()
            .withf(|_, creds| creds.authorization() == "Basic stale")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(OutageFeedError::unauthorized("token expired")));
        source
            .expect_issue()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(credentials("fresh")));
        feed.expect_fetch_snapshot()
            .withf(|_, creds| creds.authorization() == "Basic fresh")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(vec![outage_event("A", 35.1, -80.8)]));
        let cycle = cycle(feed, source, &tables);

        let report = cycle.run_once().await.expect("retry succeeds");

        assert_eq!(report.events_persisted, 1);
        assert_eq!(tables.event_count(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn second_unauthorized_aborts_without_writes() {
        let tables = InMemoryOutageTables::new();
        let mut source = MockCredentialSource::new();
        source
            .expect_issue()
            .times(2)
            .returning(|| Ok(credentials("rejected")));
        let mut feed = MockOutageFeed::new();
        feed.expect_fetch_snapshot()
            .times(2)
            .returning(|_, _| Err(OutageFeedError::unauthorized("denied")));
        let cycle = cycle(feed, source, &tables);

        let err = cycle.run_once().await.expect_err("cycle should fail");

        assert_eq!(
            err,
            PollingCycleError::Fetch(OutageFeedError::unauthorized("denied"))
        );
        assert_eq!(tables.event_count(), 0);
    }

    #[rstest]
    #[case::timeout(OutageFeedError::timeout("30s elapsed"))]
    #[case::status(OutageFeedError::status(502_u16, "bad gateway"))]
    #[case::decode(OutageFeedError::decode("missing data"))]
    #[tokio::test]
    async fn other_fetch_failures_abort_without_refresh(#[case] failure: OutageFeedError) {
        let tables = InMemoryOutageTables::new();
        let mut source = MockCredentialSource::new();
        source
            .expect_issue()
            .times(1)
            .returning(|| Ok(credentials("ok")));
        let mut feed = MockOutageFeed::new();
        let returned = failure.clone();
        feed.expect_fetch_snapshot()
            .times(1)
            .returning(move |_, _| Err(returned.clone()));
        let cycle = cycle(feed, source, &tables);

        let err = cycle.run_once().await.expect_err("cycle should fail");

        assert_eq!(err, PollingCycleError::Fetch(failure));
        assert_eq!(tables.event_count(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn credential_failure_aborts_before_fetching() {
        let tables = InMemoryOutageTables::new();
        let mut source = MockCredentialSource::new();
        source
            .expect_issue()
            .times(1)
            .returning(|| Err(CredentialSourceError::timeout("config fetch")));
        let mut feed = MockOutageFeed::new();
        feed.expect_fetch_snapshot().never();
        let cycle = cycle(feed, source, &tables);

        let err = cycle.run_once().await.expect_err("cycle should fail");

        assert!(matches!(err, PollingCycleError::Credentials(_)));
    }

    #[rstest]
    #[tokio::test]
    async fn run_every_keeps_polling_after_failures_until_shutdown() {
        let tables = InMemoryOutageTables::new();
        let mut source = MockCredentialSource::new();
        source
            .expect_issue()
            .returning(|| Ok(credentials("ok")));
        let mut feed = MockOutageFeed::new();
        feed.expect_fetch_snapshot()
            .returning(|_, _| Err(OutageFeedError::transport("connection refused")));
        let cycle = cycle(feed, source, &tables);

        tokio::time::timeout(
            Duration::from_secs(5),
            cycle.run_every(
                Duration::from_millis(5),
                tokio::time::sleep(Duration::from_millis(40)),
            ),
        )
        .await
        .expect("shutdown future should stop the loop");

        assert_eq!(tables.event_count(), 0);
    }
}
