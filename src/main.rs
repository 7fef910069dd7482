//! shorts-ingest binary entrypoint.
//! One invocation performs one gated run and exits 0 once the outcome is
//! recorded, aborted runs included (they land in the `errors` collection).
//! Only bootstrap problems (config, credentials) exit non-zero.
//!
//! Set `INGEST_LOOP_SECS` to keep the process alive and re-run on an interval
//! instead of relying on an external scheduler.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use shorts_ingest::config::{IngestConfig, StoreBackend, YouTubeCredentials};
use shorts_ingest::ingest::providers::YouTubeSource;
use shorts_ingest::ingest::scheduler::{spawn_interval_scheduler, IngestSchedulerCfg};
use shorts_ingest::ingest::types::PersistenceGateway;
use shorts_ingest::ingest::{IngestionOrchestrator, RunOutcome, RunReport};
use shorts_ingest::metrics::Metrics;
use shorts_ingest::store::{FirestoreGateway, InMemoryStore};

const ENV_LOOP_SECS: &str = "INGEST_LOOP_SECS";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    shorts_ingest::init_tracing();

    let cfg = IngestConfig::load_default().context("loading ingest config")?;
    info!(
        channels = cfg.channels.len(),
        target_hour = cfg.target_hour,
        timezone = %cfg.timezone,
        max_daily_items = cfg.max_daily_items,
        "ingest config loaded"
    );

    let metrics = match Metrics::init(&cfg) {
        Ok(m) => Some(m),
        Err(e) => {
            warn!(error = ?e, "metrics recorder unavailable");
            None
        }
    };

    let source = YouTubeSource::new(&YouTubeCredentials::from_env()?)?;
    let loop_cfg = loop_mode()?;

    match StoreBackend::from_env()? {
        StoreBackend::Memory => {
            warn!("INGEST_STORE=memory: nothing will be persisted");
            run_with(cfg, source, InMemoryStore::new(), metrics, loop_cfg).await
        }
        StoreBackend::Firestore(settings) => {
            let store = FirestoreGateway::new(&settings)?;
            run_with(cfg, source, store, metrics, loop_cfg).await
        }
    }
}

fn loop_mode() -> Result<Option<IngestSchedulerCfg>> {
    match std::env::var(ENV_LOOP_SECS) {
        Ok(raw) if !raw.trim().is_empty() => {
            let interval_secs = raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{ENV_LOOP_SECS} is not a number: {raw:?}"))?;
            Ok(Some(IngestSchedulerCfg { interval_secs }))
        }
        _ => Ok(None),
    }
}

async fn run_with<P: PersistenceGateway + 'static>(
    cfg: IngestConfig,
    source: YouTubeSource,
    store: P,
    metrics: Option<Metrics>,
    loop_cfg: Option<IngestSchedulerCfg>,
) -> Result<()> {
    info!(store = store.name(), "starting ingest");
    let orchestrator = IngestionOrchestrator::new(cfg, source, store);

    if let Some(sched) = loop_cfg {
        info!(interval_secs = sched.interval_secs, "running in loop mode");
        spawn_interval_scheduler(Arc::new(orchestrator), sched, move |report| {
            report_run(report, metrics.as_ref())
        })
        .await
        .context("scheduler task ended")?;
        return Ok(());
    }

    let report = orchestrator.run().await;
    report_run(&report, metrics.as_ref());
    Ok(())
}

fn report_run(report: &RunReport, metrics: Option<&Metrics>) {
    log_report(report);
    if let Some(m) = metrics {
        debug!(target: "ingest", snapshot = %m.render(), "metrics");
    }
}

fn log_report(report: &RunReport) {
    match &report.outcome {
        RunOutcome::Completed {
            ingested,
            quota_units,
        } => info!(
            added = ingested,
            quota_units,
            channel_failures = report.channel_failures.len(),
            at = %chrono::Local::now().format("%Y-%m-%d %H:%M"),
            "run complete"
        ),
        RunOutcome::Skipped(reason) => info!(?reason, "run skipped"),
        // Already persisted to the error log; the process still exits cleanly.
        RunOutcome::Aborted { stage, message } => warn!(?stage, %message, "run aborted"),
    }
}
