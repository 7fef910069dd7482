// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::ingest::types::{ContentSource, PersistenceGateway};
use crate::ingest::{IngestionOrchestrator, RunOutcome, RunReport, SkipReason};

pub const DEFAULT_INTERVAL_SECS: u64 = 3600;

#[derive(Clone, Copy, Debug)]
pub struct IngestSchedulerCfg {
    pub interval_secs: u64,
}

impl Default for IngestSchedulerCfg {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
        }
    }
}

/// Holds the local date of the last run that finished the day's work, so
/// ticks inside the target hour after that are dropped without any calls.
/// A run finishes the day when it completes or finds the cap reached;
/// aborted and off-hour runs leave the latch open.
#[derive(Debug, Clone)]
pub struct DailyRunLatch {
    timezone: Tz,
    last_run: Option<NaiveDate>,
}

impl DailyRunLatch {
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            last_run: None,
        }
    }

    pub fn last_run(&self) -> Option<NaiveDate> {
        self.last_run
    }

    /// `None` when today's run already happened.
    pub async fn tick<S, P>(
        &mut self,
        orchestrator: &IngestionOrchestrator<S, P>,
        now: DateTime<Utc>,
    ) -> Option<RunReport>
    where
        S: ContentSource,
        P: PersistenceGateway,
    {
        let today = now.with_timezone(&self.timezone).date_naive();
        if self.last_run == Some(today) {
            debug!(target: "ingest", %today, "already ran today, tick ignored");
            return None;
        }

        let report = orchestrator.run_at(now).await;
        if finishes_day(&report.outcome) {
            self.last_run = Some(today);
        }
        Some(report)
    }
}

fn finishes_day(outcome: &RunOutcome) -> bool {
    matches!(
        outcome,
        RunOutcome::Completed { .. } | RunOutcome::Skipped(SkipReason::DailyCapReached(_))
    )
}

/// Spawn a lightweight loop that invokes the orchestrator every
/// `interval_secs`, at most one finished run per local day. `on_report`
/// sees every run that actually executed.
pub fn spawn_interval_scheduler<S, P, F>(
    orchestrator: Arc<IngestionOrchestrator<S, P>>,
    cfg: IngestSchedulerCfg,
    on_report: F,
) -> JoinHandle<()>
where
    S: ContentSource + 'static,
    P: PersistenceGateway + 'static,
    F: FnMut(&RunReport) + Send + 'static,
{
    spawn_interval_scheduler_with_clock(orchestrator, cfg, Utc::now, on_report)
}

/// Same loop with an injected clock.
pub fn spawn_interval_scheduler_with_clock<S, P, C, F>(
    orchestrator: Arc<IngestionOrchestrator<S, P>>,
    cfg: IngestSchedulerCfg,
    clock: C,
    mut on_report: F,
) -> JoinHandle<()>
where
    S: ContentSource + 'static,
    P: PersistenceGateway + 'static,
    C: Fn() -> DateTime<Utc> + Send + 'static,
    F: FnMut(&RunReport) + Send + 'static,
{
    tokio::spawn(async move {
        let mut latch = DailyRunLatch::new(orchestrator.config().timezone);
        let mut ticker = tokio::time::interval(Duration::from_secs(cfg.interval_secs.max(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Some(report) = latch.tick(&orchestrator, clock()).await {
                on_report(&report);
            }
        }
    })
}
