// src/config/ingest.rs
use anyhow::{anyhow, bail, Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::channels::default_channels;
use crate::ingest::fetcher::MAX_SHORT_FORM_SECS;
use crate::ingest::quota::DEFAULT_QUOTA_PER_ITEM;

pub const ENV_CONFIG_PATH: &str = "INGEST_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/ingest.toml";

pub const ENV_MAX_DAILY_ITEMS: &str = "MAX_DAILY_VIDEOS";
pub const ENV_TARGET_HOUR: &str = "TARGET_HOUR";
pub const ENV_THROTTLE_MS: &str = "REQUEST_THROTTLE_MS";
pub const ENV_TIMEZONE: &str = "INGEST_TIMEZONE";
pub const ENV_CAP_TIMEZONE: &str = "INGEST_CAP_TIMEZONE";

pub const DEFAULT_MAX_DAILY_ITEMS: u64 = 40;
pub const DEFAULT_TARGET_HOUR: u32 = 23;
pub const DEFAULT_THROTTLE_MS: u64 = 1500;
pub const DEFAULT_TIMEZONE: &str = "Africa/Casablanca";

/// Validated run parameters.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub max_daily_items: u64,
    /// Local hour (0-23) during which a run is allowed.
    pub target_hour: u32,
    pub request_throttle_ms: u64,
    /// Zone of the schedule gate.
    pub timezone: Tz,
    /// Zone used to find "today" for the daily cap.
    pub cap_timezone: Tz,
    pub max_duration_secs: u64,
    pub quota_per_item: u64,
    pub channels: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_daily_items: DEFAULT_MAX_DAILY_ITEMS,
            target_hour: DEFAULT_TARGET_HOUR,
            request_throttle_ms: DEFAULT_THROTTLE_MS,
            timezone: chrono_tz::Africa::Casablanca,
            cap_timezone: chrono_tz::Africa::Casablanca,
            max_duration_secs: MAX_SHORT_FORM_SECS,
            quota_per_item: DEFAULT_QUOTA_PER_ITEM,
            channels: default_channels(),
        }
    }
}

/// On-disk shape; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    max_daily_items: Option<u64>,
    target_hour: Option<u32>,
    request_throttle_ms: Option<u64>,
    timezone: Option<String>,
    cap_timezone: Option<String>,
    max_duration_secs: Option<u64>,
    quota_per_item: Option<u64>,
    channels: Option<Vec<String>>,
}

impl IngestConfig {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.request_throttle_ms)
    }

    /// Load from an explicit TOML file, then apply env overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading ingest config from {}", path.display()))?;
        let file = parse_file(&content)
            .with_context(|| format!("parsing ingest config {}", path.display()))?;
        build(file)
    }

    /// Resolve config using env var + fallbacks:
    /// 1) $INGEST_CONFIG_PATH
    /// 2) config/ingest.toml
    /// 3) built-in defaults
    ///
    /// Env overrides (`MAX_DAILY_VIDEOS`, `TARGET_HOUR`, ...) apply in every case.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                bail!("{ENV_CONFIG_PATH} points to non-existent path");
            }
            return Self::load_from(&pb);
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        build(FileConfig::default())
    }
}

fn parse_file(s: &str) -> Result<FileConfig> {
    Ok(toml::from_str(s)?)
}

fn build(file: FileConfig) -> Result<IngestConfig> {
    let defaults = IngestConfig::default();

    let timezone_name = env_string(ENV_TIMEZONE)
        .or(file.timezone)
        .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
    let timezone = parse_tz(&timezone_name)?;
    // The cap counts "today" in the schedule zone unless told otherwise.
    let cap_timezone = match env_string(ENV_CAP_TIMEZONE).or(file.cap_timezone) {
        Some(name) => parse_tz(&name)?,
        None => timezone,
    };

    let cfg = IngestConfig {
        max_daily_items: env_parsed(ENV_MAX_DAILY_ITEMS)?
            .or(file.max_daily_items)
            .unwrap_or(defaults.max_daily_items),
        target_hour: env_parsed(ENV_TARGET_HOUR)?
            .or(file.target_hour)
            .unwrap_or(defaults.target_hour),
        request_throttle_ms: env_parsed(ENV_THROTTLE_MS)?
            .or(file.request_throttle_ms)
            .unwrap_or(defaults.request_throttle_ms),
        timezone,
        cap_timezone,
        max_duration_secs: file.max_duration_secs.unwrap_or(defaults.max_duration_secs),
        quota_per_item: file.quota_per_item.unwrap_or(defaults.quota_per_item),
        channels: match file.channels {
            Some(list) => clean_channels(list),
            None => defaults.channels,
        },
    };
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &IngestConfig) -> Result<()> {
    if cfg.target_hour > 23 {
        bail!("target_hour must be within 0-23, got {}", cfg.target_hour);
    }
    if cfg.channels.is_empty() {
        bail!("channel list is empty");
    }
    Ok(())
}

fn parse_tz(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| anyhow!("unknown timezone {name:?}: {e}"))
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env_string(key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow!("{key} is not a valid number: {raw:?}")),
        None => Ok(None),
    }
}

/// Trim, drop empties and duplicates; first occurrence wins so polling order holds.
fn clean_channels(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && seen.insert(t.to_string()) {
            out.push(t.to_string());
        }
    }
    out
}
