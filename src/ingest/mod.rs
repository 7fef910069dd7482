// src/ingest/mod.rs
pub mod cap;
pub mod duration;
pub mod error;
pub mod fetcher;
pub mod metadata_cache;
pub mod novelty;
pub mod providers;
pub mod quota;
pub mod schedule;
pub mod scheduler;
pub mod types;

use chrono::{DateTime, Timelike, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use tracing::{debug, error, info, warn};

use crate::config::IngestConfig;
use crate::ingest::cap::{CapStatus, DailyCapGuard};
use crate::ingest::error::{IngestError, IngestResult};
use crate::ingest::fetcher::{ChannelFetcher, FetchOutcome};
use crate::ingest::metadata_cache::ChannelMetadataCache;
use crate::ingest::quota::quota_cost_with;
use crate::ingest::schedule::ScheduleGate;
use crate::ingest::types::{
    ContentItem, ContentSource, ErrorLogEntry, ExecutionLogEntry, PersistenceGateway,
};

/// One-time metrics registration (so series show up in the exposition).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_runs_total", "Invocations that passed the schedule gate.");
        describe_counter!("ingest_runs_skipped_total", "Invocations skipped by gate or cap.");
        describe_counter!("ingest_runs_aborted_total", "Runs ended by an uncaught failure.");
        describe_counter!("ingest_channels_polled_total", "Channels queried for a latest item.");
        describe_counter!("ingest_items_accepted_total", "Items accepted into a batch.");
        describe_counter!(
            "ingest_items_existing_total",
            "Latest items skipped because they were already stored."
        );
        describe_counter!(
            "ingest_items_too_long_total",
            "Items dropped for exceeding the short-form duration."
        );
        describe_counter!("ingest_channel_errors_total", "Per-channel fetch failures.");
        describe_counter!("ingest_metadata_cache_hits_total", "Channel metadata cache hits.");
        describe_counter!(
            "ingest_metadata_cache_misses_total",
            "Channel metadata cache misses (one channel query each)."
        );
        describe_counter!("ingest_quota_units_total", "Quota units attributed to accepted items.");
        describe_histogram!("ingest_channel_fetch_ms", "Per-channel fetch time in milliseconds.");
        describe_gauge!("ingest_last_run_ts", "Unix ts when an ingest run last completed.");
    });
}

/// Stages of one run. `Aborted` is reachable from any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    GateCheck,
    CapCheck,
    Fetching,
    Persisting,
    Logging,
    Done,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    OutsideTriggerHour { local_hour: u32 },
    DailyCapReached(CapStatus),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Skipped(SkipReason),
    Completed { ingested: usize, quota_units: u64 },
    Aborted { stage: RunState, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelFailure {
    pub channel_id: String,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// States visited, in order, starting at `Idle`.
    pub trail: Vec<RunState>,
    /// Accepted items, in channel order.
    pub items: Vec<ContentItem>,
    pub channel_failures: Vec<ChannelFailure>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            outcome: RunOutcome::Completed {
                ingested: 0,
                quota_units: 0,
            },
            trail: vec![RunState::Idle],
            items: Vec::new(),
            channel_failures: Vec::new(),
        }
    }

    fn enter(&mut self, state: RunState) {
        debug!(target: "ingest", ?state, "run state");
        self.trail.push(state);
    }

    pub fn state(&self) -> RunState {
        self.trail.last().copied().unwrap_or(RunState::Idle)
    }
}

/// Owns everything a run needs; the metadata cache lives inside each run.
pub struct IngestionOrchestrator<S, P> {
    cfg: IngestConfig,
    source: S,
    store: P,
}

impl<S, P> IngestionOrchestrator<S, P>
where
    S: ContentSource,
    P: PersistenceGateway,
{
    pub fn new(cfg: IngestConfig, source: S, store: P) -> Self {
        Self { cfg, source, store }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.cfg
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub async fn run(&self) -> RunReport {
        self.run_at(Utc::now()).await
    }

    /// Run once as if the clock read `now`. Never returns an error: uncaught
    /// failures are written to the error log and reported as `Aborted`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> RunReport {
        ensure_metrics_described();
        let mut report = RunReport::new();

        report.enter(RunState::GateCheck);
        let gate = ScheduleGate::new(self.cfg.timezone, self.cfg.target_hour);
        if !gate.should_run(now) {
            let local_hour = now.with_timezone(&self.cfg.timezone).hour();
            info!(
                target: "ingest",
                local_hour,
                target_hour = self.cfg.target_hour,
                timezone = %self.cfg.timezone,
                "not the scheduled hour, skipping"
            );
            counter!("ingest_runs_skipped_total").increment(1);
            report.outcome = RunOutcome::Skipped(SkipReason::OutsideTriggerHour { local_hour });
            report.enter(RunState::Done);
            return report;
        }
        counter!("ingest_runs_total").increment(1);

        match self.run_stages(now, &mut report).await {
            Ok(outcome) => {
                report.outcome = outcome;
                report.enter(RunState::Done);
                gauge!("ingest_last_run_ts").set(Utc::now().timestamp() as f64);
            }
            Err(err) => {
                let stage = report.state();
                report.enter(RunState::Aborted);
                counter!("ingest_runs_aborted_total").increment(1);
                error!(target: "ingest", ?stage, kind = err.kind(), error = %err, "run aborted");
                self.record_error(stage, &err).await;
                report.outcome = RunOutcome::Aborted {
                    stage,
                    message: err.to_string(),
                };
            }
        }
        report
    }

    async fn run_stages(
        &self,
        now: DateTime<Utc>,
        report: &mut RunReport,
    ) -> IngestResult<RunOutcome> {
        report.enter(RunState::CapCheck);
        let guard = DailyCapGuard::new(self.cfg.max_daily_items, self.cfg.cap_timezone);
        let status = guard.check(&self.store, now).await?;
        if status.reached() {
            info!(
                target: "ingest",
                count = status.count,
                cap = status.cap,
                "daily limit reached, skipping"
            );
            counter!("ingest_runs_skipped_total").increment(1);
            return Ok(RunOutcome::Skipped(SkipReason::DailyCapReached(status)));
        }
        info!(
            target: "ingest",
            count = status.count,
            cap = status.cap,
            remaining = status.remaining(),
            "daily cap checked"
        );

        report.enter(RunState::Fetching);
        self.fetch_all(report).await;

        report.enter(RunState::Persisting);
        let ingested = report.items.len();
        if ingested > 0 {
            self.store.save_batch(&report.items).await?;
        }

        report.enter(RunState::Logging);
        let quota_units = quota_cost_with(ingested, self.cfg.quota_per_item);
        self.store
            .log_execution(&ExecutionLogEntry {
                recorded_at: Utc::now(),
                items_ingested: ingested,
                quota_units,
            })
            .await?;

        counter!("ingest_items_accepted_total").increment(ingested as u64);
        counter!("ingest_quota_units_total").increment(quota_units);
        if ingested > 0 {
            info!(
                target: "ingest",
                added = ingested,
                quota_units,
                channel_failures = report.channel_failures.len(),
                "batch stored"
            );
        } else {
            info!(
                target: "ingest",
                channel_failures = report.channel_failures.len(),
                "no new items found today"
            );
        }

        Ok(RunOutcome::Completed {
            ingested,
            quota_units,
        })
    }

    /// Sequential, throttled pass over every channel. Channel failures are
    /// logged and recorded, never propagated.
    async fn fetch_all(&self, report: &mut RunReport) {
        let mut cache = ChannelMetadataCache::new();
        let throttle = self.cfg.throttle();

        for channel_id in &self.cfg.channels {
            if !throttle.is_zero() {
                tokio::time::sleep(throttle).await;
            }
            counter!("ingest_channels_polled_total").increment(1);

            let t0 = std::time::Instant::now();
            let result = ChannelFetcher::new(&self.source, &self.store, &mut cache)
                .with_max_duration(self.cfg.max_duration_secs)
                .fetch_one(channel_id)
                .await;
            histogram!("ingest_channel_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

            match result {
                Ok(FetchOutcome::Accepted(item)) => {
                    debug!(target: "ingest", channel = %channel_id, item = %item.item_id, "accepted");
                    report.items.push(item);
                }
                Ok(FetchOutcome::AlreadyIngested(item_id)) => {
                    info!(target: "ingest", channel = %channel_id, item = %item_id, "skipping existing item");
                }
                Ok(FetchOutcome::TooLong { item_id, seconds }) => {
                    debug!(target: "ingest", channel = %channel_id, item = %item_id, seconds, "too long");
                }
                Ok(FetchOutcome::DetailsUnavailable(item_id)) => {
                    debug!(target: "ingest", channel = %channel_id, item = %item_id, "no details");
                }
                Ok(FetchOutcome::NoRecentItem) => {
                    debug!(target: "ingest", channel = %channel_id, "no recent item");
                }
                Err(e) => {
                    warn!(
                        target: "ingest",
                        channel = %channel_id,
                        kind = e.kind(),
                        error = %e,
                        "channel fetch failed"
                    );
                    counter!("ingest_channel_errors_total").increment(1);
                    report.channel_failures.push(ChannelFailure {
                        channel_id: channel_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        debug!(target: "ingest", cached_channels = cache.len(), "fetch pass done");
    }

    /// Best-effort: a failure here is logged and dropped.
    async fn record_error(&self, stage: RunState, err: &IngestError) {
        let entry = ErrorLogEntry {
            recorded_at: Utc::now(),
            message: err.to_string(),
            detail: format!("stage={stage:?} kind={} {err:?}", err.kind()),
        };
        if let Err(e) = self.store.log_error(&entry).await {
            warn!(target: "ingest", error = %e, "could not write error log entry");
        }
    }
}
