// src/ingest/cap.rs
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::ingest::error::IngestResult;
use crate::ingest::schedule::local_midnight;
use crate::ingest::types::PersistenceGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapStatus {
    pub count: u64,
    pub cap: u64,
}

impl CapStatus {
    pub fn reached(&self) -> bool {
        self.count >= self.cap
    }

    pub fn remaining(&self) -> u64 {
        self.cap.saturating_sub(self.count)
    }
}

/// Daily acceptance cap, counted from local midnight in `timezone`.
#[derive(Debug, Clone, Copy)]
pub struct DailyCapGuard {
    pub cap: u64,
    pub timezone: Tz,
}

impl DailyCapGuard {
    pub fn new(cap: u64, timezone: Tz) -> Self {
        Self { cap, timezone }
    }

    /// Store failures propagate; the caller must abort the run.
    pub async fn check<P: PersistenceGateway + ?Sized>(
        &self,
        store: &P,
        now: DateTime<Utc>,
    ) -> IngestResult<CapStatus> {
        let since = local_midnight(now, self.timezone);
        let count = store.count_ingested_since(since).await?;
        Ok(CapStatus {
            count,
            cap: self.cap,
        })
    }
}

pub async fn is_cap_reached<P: PersistenceGateway + ?Sized>(
    store: &P,
    cap: u64,
    now: DateTime<Utc>,
    timezone: Tz,
) -> IngestResult<bool> {
    let status = DailyCapGuard::new(cap, timezone).check(store, now).await?;
    Ok(status.reached())
}
