// tests/ingest_scheduler.rs
mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use common::{config_for, in_target_hour, Call, MockSource};
use shorts_ingest::ingest::scheduler::{
    spawn_interval_scheduler_with_clock, DailyRunLatch, IngestSchedulerCfg,
};
use shorts_ingest::store::{InMemoryStore, StoreOp};
use shorts_ingest::{IngestionOrchestrator, RunOutcome, SkipReason};

fn orchestrator(store: InMemoryStore) -> IngestionOrchestrator<MockSource, InMemoryStore> {
    let source = MockSource::new()
        .with_item("UC1", "v1", "PT45S")
        .with_item("UC2", "v2", "PT30S");
    IngestionOrchestrator::new(config_for(&["UC1", "UC2"]), source, store)
}

#[test]
fn default_interval_is_hourly() {
    assert_eq!(IngestSchedulerCfg::default().interval_secs, 3600);
}

#[tokio::test]
async fn second_tick_in_target_hour_does_no_work() {
    let now = in_target_hour();
    let orch = orchestrator(InMemoryStore::new().with_server_time(now));
    let mut latch = DailyRunLatch::new(orch.config().timezone);

    let first = latch.tick(&orch, now).await.expect("first tick runs");
    assert!(matches!(first.outcome, RunOutcome::Completed { ingested: 2, .. }));
    let calls_after_first = orch.source().calls().len();

    assert!(latch.tick(&orch, now + ChronoDuration::minutes(10)).await.is_none());
    assert!(latch.tick(&orch, now + ChronoDuration::minutes(25)).await.is_none());

    assert_eq!(orch.source().calls().len(), calls_after_first, "no search calls");
    assert_eq!(orch.store().calls(StoreOp::CountSince), 1);
    assert_eq!(orch.store().execution_logs().len(), 1);
}

#[tokio::test]
async fn next_local_day_runs_again() {
    let now = in_target_hour();
    let orch = orchestrator(InMemoryStore::new().with_server_time(now));
    let mut latch = DailyRunLatch::new(orch.config().timezone);

    assert!(latch.tick(&orch, now).await.is_some());
    let tomorrow = now + ChronoDuration::days(1);
    let report = latch.tick(&orch, tomorrow).await.expect("new day");
    assert!(matches!(report.outcome, RunOutcome::Completed { .. }));
    assert_eq!(orch.store().execution_logs().len(), 2);
    assert_eq!(
        latch.last_run(),
        Some(tomorrow.with_timezone(&chrono_tz::Africa::Casablanca).date_naive())
    );
}

#[tokio::test]
async fn off_hour_and_aborted_ticks_keep_the_day_open() {
    let now = in_target_hour();
    let store = InMemoryStore::new().with_server_time(now);
    store.fail_on(StoreOp::SaveBatch);
    let orch = orchestrator(store);
    let mut latch = DailyRunLatch::new(orch.config().timezone);

    let early = latch
        .tick(&orch, now - ChronoDuration::hours(1))
        .await
        .expect("gate decides");
    assert!(matches!(
        early.outcome,
        RunOutcome::Skipped(SkipReason::OutsideTriggerHour { .. })
    ));
    assert_eq!(latch.last_run(), None);

    let aborted = latch.tick(&orch, now).await.expect("runs");
    assert!(matches!(aborted.outcome, RunOutcome::Aborted { .. }));
    assert_eq!(latch.last_run(), None);

    assert!(latch.tick(&orch, now + ChronoDuration::minutes(5)).await.is_some());
    assert_eq!(orch.store().calls(StoreOp::CountSince), 2);
}

#[tokio::test(start_paused = true)]
async fn short_interval_loop_runs_once_per_day() {
    let now = in_target_hour();
    let orch = Arc::new(orchestrator(InMemoryStore::new().with_server_time(now)));
    let reports = Arc::new(AtomicUsize::new(0));
    let seen = reports.clone();

    let handle = spawn_interval_scheduler_with_clock(
        orch.clone(),
        IngestSchedulerCfg { interval_secs: 1 },
        move || now,
        move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        },
    );

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    assert!(!handle.is_finished(), "scheduler loop must not exit");
    handle.abort();

    assert_eq!(reports.load(Ordering::SeqCst), 1);
    assert_eq!(orch.store().calls(StoreOp::CountSince), 1);
    let searches = orch
        .source()
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Latest(_)))
        .count();
    assert_eq!(searches, 2, "one search per channel");
}
