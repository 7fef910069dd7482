// src/store/memory.rs
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::ingest::error::{IngestError, IngestResult};
use crate::ingest::types::{ContentItem, ErrorLogEntry, ExecutionLogEntry, PersistenceGateway};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ItemExists,
    CountSince,
    SaveBatch,
    LogExecution,
    LogError,
}

#[derive(Debug, Default)]
struct State {
    videos: BTreeMap<String, ContentItem>,
    logs: Vec<ExecutionLogEntry>,
    errors: Vec<ErrorLogEntry>,
    calls: HashMap<StoreOp, usize>,
    failing: HashSet<StoreOp>,
}

/// Process-local gateway: backs dry runs (`INGEST_STORE=memory`) and tests.
/// Ingestion timestamps come from `server_time` when set, else the wall clock.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    server_time: Option<DateTime<Utc>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp every write with a fixed "server" time.
    pub fn with_server_time(mut self, ts: DateTime<Utc>) -> Self {
        self.server_time = Some(ts);
        self
    }

    /// Insert a previously ingested item with an explicit timestamp.
    pub fn seed(&self, mut item: ContentItem, ingested_at: DateTime<Utc>) {
        item.ingested_at = Some(ingested_at);
        self.lock().videos.insert(item.item_id.clone(), item);
    }

    /// Make every subsequent `op` fail with a store error.
    pub fn fail_on(&self, op: StoreOp) {
        self.lock().failing.insert(op);
    }

    pub fn videos(&self) -> Vec<ContentItem> {
        self.lock().videos.values().cloned().collect()
    }

    pub fn video(&self, item_id: &str) -> Option<ContentItem> {
        self.lock().videos.get(item_id).cloned()
    }

    pub fn execution_logs(&self) -> Vec<ExecutionLogEntry> {
        self.lock().logs.clone()
    }

    pub fn error_logs(&self) -> Vec<ErrorLogEntry> {
        self.lock().errors.clone()
    }

    pub fn calls(&self, op: StoreOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("memory store mutex poisoned")
    }

    fn now(&self) -> DateTime<Utc> {
        self.server_time.unwrap_or_else(Utc::now)
    }

    /// Count the call and fail it if the op was marked failing.
    fn begin(&self, op: StoreOp) -> IngestResult<std::sync::MutexGuard<'_, State>> {
        let mut g = self.lock();
        *g.calls.entry(op).or_default() += 1;
        if g.failing.contains(&op) {
            return Err(IngestError::Store(format!("{op:?} unavailable")));
        }
        Ok(g)
    }
}

#[async_trait::async_trait]
impl PersistenceGateway for InMemoryStore {
    async fn item_exists(&self, item_id: &str) -> IngestResult<bool> {
        let g = self.begin(StoreOp::ItemExists)?;
        Ok(g.videos.contains_key(item_id))
    }

    async fn count_ingested_since(&self, since: DateTime<Utc>) -> IngestResult<u64> {
        let g = self.begin(StoreOp::CountSince)?;
        let n = g
            .videos
            .values()
            .filter(|v| v.ingested_at.is_some_and(|ts| ts >= since))
            .count();
        Ok(n as u64)
    }

    async fn save_batch(&self, items: &[ContentItem]) -> IngestResult<()> {
        let ts = self.now();
        let mut g = self.begin(StoreOp::SaveBatch)?;
        for it in items {
            let mut stored = it.clone();
            stored.ingested_at = Some(ts);
            g.videos.insert(stored.item_id.clone(), stored);
        }
        Ok(())
    }

    async fn log_execution(&self, entry: &ExecutionLogEntry) -> IngestResult<()> {
        let mut g = self.begin(StoreOp::LogExecution)?;
        g.logs.push(entry.clone());
        Ok(())
    }

    async fn log_error(&self, entry: &ErrorLogEntry) -> IngestResult<()> {
        let mut g = self.begin(StoreOp::LogError)?;
        g.errors.push(entry.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
