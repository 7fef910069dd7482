use anyhow::{Context, Result};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::IngestConfig;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and publish static gauges for the
    /// active limits. A batch job has no listener; callers render the
    /// snapshot into the log at the end of a run.
    pub fn init(cfg: &IngestConfig) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        gauge!("ingest_max_daily_items").set(cfg.max_daily_items as f64);
        gauge!("ingest_target_hour").set(cfg.target_hour as f64);
        gauge!("ingest_channels_configured").set(cfg.channels.len() as f64);

        Ok(Self { handle })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }
}
