// src/ingest/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::error::IngestResult;

/// A short-form video ready to be written to the `videos` collection.
/// `ingested_at` stays `None` until the store assigns it at write time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    #[serde(rename = "videoId")]
    pub item_id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "thumbnail")]
    pub thumbnail_url: String,
    /// Raw duration notation, e.g. "PT45S".
    pub duration: String,
    pub duration_seconds: u64,
    pub channel_id: String,
    pub creator_username: String,
    pub creator_avatar: String,
    pub is_verified: bool,
    pub likes: u64,
    pub comments: u64,
    #[serde(rename = "isAI")]
    pub is_ai: bool,
    #[serde(rename = "timestamp", default, skip_serializing_if = "Option::is_none")]
    pub ingested_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMetadata {
    pub channel_id: String,
    pub display_name: String,
    pub avatar_url: String,
    pub is_verified: bool,
}

/// Result of the cheap "latest item for channel" query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestItem {
    pub item_id: String,
}

/// Result of the "item details" query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDetails {
    pub item_id: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub duration: String,
    pub channel_id: String,
    pub likes: u64,
    pub comments: u64,
}

/// Raw channel profile as returned by the source; verification is derived
/// from `long_uploads_status` by the metadata cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelProfile {
    pub display_name: String,
    pub avatar_url: String,
    pub long_uploads_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionLogEntry {
    pub recorded_at: DateTime<Utc>,
    pub items_ingested: usize,
    pub quota_units: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLogEntry {
    pub recorded_at: DateTime<Utc>,
    pub message: String,
    pub detail: String,
}

/// Read-only view of the external content source.
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    /// Most recent short-form item of `channel_id`, if any.
    async fn latest_item(&self, channel_id: &str) -> IngestResult<Option<LatestItem>>;
    async fn item_details(&self, item_id: &str) -> IngestResult<Option<ItemDetails>>;
    async fn channel_profile(&self, channel_id: &str) -> IngestResult<ChannelProfile>;
    fn name(&self) -> &'static str;
}

/// Document store operations the job depends on.
#[async_trait::async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn item_exists(&self, item_id: &str) -> IngestResult<bool>;
    /// Number of items whose ingestion timestamp is `>= since`.
    async fn count_ingested_since(&self, since: DateTime<Utc>) -> IngestResult<u64>;
    /// Writes all items atomically; ingestion timestamps are assigned here.
    async fn save_batch(&self, items: &[ContentItem]) -> IngestResult<()>;
    async fn log_execution(&self, entry: &ExecutionLogEntry) -> IngestResult<()>;
    async fn log_error(&self, entry: &ErrorLogEntry) -> IngestResult<()>;
    fn name(&self) -> &'static str;
}
