//! Behaviour of the fixture adapters and error helpers shipped with the ports.

use super::*;
use crate::domain::{FixDuration, OutageEvent, OutageId};
use chrono::Utc;
use rstest::{fixture, rstest};

#[fixture]
fn event() -> OutageEvent {
    OutageEvent {
        outage_id: OutageId::new("2301234").expect("valid id"),
        latitude: 35.2,
        longitude: -80.8,
        affected_customers: 12,
        cause: "Tree on line".to_owned(),
        jurisdiction: "DEC".to_owned(),
        convex_hull: serde_json::Value::Null,
    }
}

#[rstest]
#[tokio::test]
async fn fixture_feed_reports_an_empty_snapshot() {
    let credentials = ProviderCredentials::new("Basic abc", None);
    let snapshot = FixtureOutageFeed
        .fetch_snapshot(&["DEC".to_owned()], &credentials)
        .await
        .expect("fixture feed succeeds");
    assert!(snapshot.is_empty());
}

#[rstest]
#[tokio::test]
async fn fixture_outage_store_accepts_writes(event: OutageEvent) {
    let store = FixtureOutageStore;
    let outcome = store
        .upsert_event(&event, Utc::now())
        .await
        .expect("fixture upsert succeeds");
    assert_eq!(outcome, EventUpsert::Inserted);
    assert!(store.list_open_tracked().await.expect("list").is_empty());
}

#[rstest]
#[tokio::test]
async fn fixture_tracker_store_treats_everything_as_untracked(event: OutageEvent) {
    let store = FixtureTrackerStore;
    let ids = vec![event.outage_id.clone()];

    let untracked = store.filter_untracked(&ids).await.expect("filter");
    let restored = store
        .restore_if_open(&event.outage_id, Utc::now(), FixDuration::from_seconds(1))
        .await
        .expect("restore");

    assert_eq!(untracked, ids);
    assert!(!restored, "fixture store never holds open rows");
}

#[rstest]
#[tokio::test]
async fn fixture_enricher_resolves_a_fixed_area() {
    let area = FixtureGeoEnricher
        .resolve(35.2, -80.8)
        .await
        .expect("fixture enricher succeeds");
    assert_eq!(area.block_fips.len(), 15);
}

#[rstest]
#[case::unauthorized(OutageFeedError::unauthorized("expired"), true)]
#[case::timeout(OutageFeedError::timeout("30s"), false)]
#[case::status(OutageFeedError::status(500_u16, "boom"), false)]
fn only_unauthorized_feed_errors_request_fresh_credentials(
    #[case] error: OutageFeedError,
    #[case] expected: bool,
) {
    assert_eq!(error.is_unauthorized(), expected);
}

#[rstest]
#[tokio::test]
async fn mocked_tracker_store_reports_lost_restore_races() {
    let mut store = MockTrackerStore::new();
    store
        .expect_restore_if_open()
        .times(1)
        .returning(|_, _, _| Ok(false));
    let id = OutageId::new("A").expect("valid id");

    let restored = store
        .restore_if_open(&id, Utc::now(), FixDuration::from_seconds(0))
        .await
        .expect("mock restore");

    assert!(!restored);
}
