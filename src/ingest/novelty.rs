// src/ingest/novelty.rs
use crate::ingest::error::IngestResult;
use crate::ingest::types::PersistenceGateway;

/// True if `item_id` was already persisted by an earlier run.
pub async fn exists<P: PersistenceGateway + ?Sized>(store: &P, item_id: &str) -> IngestResult<bool> {
    store.item_exists(item_id).await
}
