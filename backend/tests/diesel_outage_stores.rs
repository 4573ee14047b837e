//! Diesel outage stores against embedded PostgreSQL.
//!
//! Gated by `RUN_PG_EMBEDDED`. Run with
//! `RUN_PG_EMBEDDED=1 cargo test --test diesel_outage_stores -- --ignored`.

use std::sync::Arc;

use chrono::{TimeDelta, TimeZone, Utc};
use pg_embedded_setup_unpriv::TestCluster;
use tokio::runtime::Builder;

use outage_tracker::domain::ports::{EventUpsert, OutageStore, TrackerStore};
use outage_tracker::domain::{
    FixDuration, LifecycleState, OutageExport, OutageId, OutageReconciler, ReconcilerConfig,
    ReconcilerPorts, TrackedOutage,
};
use outage_tracker::outbound::persistence::{
    DbPool, DieselOutageStore, DieselTrackerStore, PoolConfig, run_pending_migrations,
};
use outage_tracker::test_support::outage_tracking::{
    MutableClock, ScriptedGeoEnricher, mecklenburg, outage_event,
};

fn id(raw: &str) -> OutageId {
    OutageId::new(raw).expect("valid id")
}

#[test]
#[ignore = "requires embedded Postgres binaries; opt-in via RUN_PG_EMBEDDED=1"]
fn diesel_stores_honour_conditional_writes() {
    if std::env::var("RUN_PG_EMBEDDED").as_deref() != Ok("1") {
        eprintln!("SKIP-TEST-CLUSTER: set RUN_PG_EMBEDDED=1 to run");
        return;
    }

    let cluster = TestCluster::new().expect("embedded Postgres should start");
    let database_url = cluster.connection().database_url("postgres");
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");

    runtime.block_on(async {
        run_pending_migrations(&database_url)
            .await
            .expect("migrations apply");
        let pool = DbPool::new(PoolConfig::new(&database_url))
            .await
            .expect("pool builds");
        let outage_store = DieselOutageStore::new(pool.clone());
        let tracker_store = DieselTrackerStore::new(pool);
        let started_at = Utc
            .with_ymd_and_hms(2026, 10, 1, 8, 0, 0)
            .single()
            .expect("valid time");

        let event = outage_event("2301234", 35.22, -80.84);
        assert_eq!(
            outage_store
                .upsert_event(&event, started_at)
                .await
                .expect("first upsert"),
            EventUpsert::Inserted
        );
        let mut changed = event.clone();
        changed.affected_customers = 999;
        assert_eq!(
            outage_store
                .upsert_event(&changed, started_at + TimeDelta::seconds(60))
                .await
                .expect("second upsert"),
            EventUpsert::AlreadyPresent
        );
        let events = outage_store.list_events().await.expect("list events");
        let [stored] = events.as_slice() else {
            panic!("expected exactly one stored event, got {}", events.len());
        };
        assert_eq!(stored.event.affected_customers, 10);
        assert_eq!(stored.first_seen_at, started_at);

        let untracked = tracker_store
            .filter_untracked(&[id("2301234"), id("missing")])
            .await
            .expect("filter untracked");
        assert_eq!(untracked, vec![id("2301234"), id("missing")]);

        let record = TrackedOutage::open(&event, mecklenburg(), "Duke Energy", started_at);
        assert!(tracker_store.insert_tracked(&record).await.expect("insert"));
        assert!(!tracker_store.insert_tracked(&record).await.expect("reinsert"));
        let still_untracked = tracker_store
            .filter_untracked(&[id("2301234")])
            .await
            .expect("filter untracked");
        assert!(still_untracked.is_empty());

        let open = outage_store.list_open_tracked().await.expect("list open");
        assert_eq!(open.len(), 1);

        let ended_at = started_at + TimeDelta::seconds(90_061);
        let duration = FixDuration::between(started_at, ended_at);
        assert!(
            tracker_store
                .restore_if_open(&id("2301234"), ended_at, duration)
                .await
                .expect("restore")
        );
        assert!(
            !tracker_store
                .restore_if_open(&id("2301234"), ended_at + TimeDelta::seconds(300), duration)
                .await
                .expect("second restore")
        );

        let tracked = tracker_store.list_tracked().await.expect("list tracked");
        let [restored] = tracked.as_slice() else {
            panic!("expected exactly one tracked outage, got {}", tracked.len());
        };
        assert_eq!(
            restored.lifecycle,
            LifecycleState::Restored {
                ended_at,
                fix_duration: FixDuration::from_seconds(90_061),
            }
        );
        assert!(
            outage_store
                .list_open_tracked()
                .await
                .expect("list open")
                .is_empty()
        );

        let clock = Arc::new(MutableClock::new(ended_at));
        let reconciler = OutageReconciler::new(
            ReconcilerPorts::new(
                Arc::new(outage_store.clone()),
                Arc::new(tracker_store.clone()),
                Arc::new(ScriptedGeoEnricher::default()),
            ),
            clock,
            ReconcilerConfig::default(),
        );
        let report = reconciler
            .reconcile(&[event, outage_event("2301235", 35.3, -80.7)])
            .await;
        assert_eq!(report.events_persisted, 1);
        assert_eq!(report.lifecycles_created, 1);
        assert!(report.is_clean());

        let export = OutageExport::collect(&outage_store, &tracker_store)
            .await
            .expect("export reads");
        assert_eq!(export.events.len(), 2);
        assert_eq!(export.tracked.len(), 2);
    });
}
