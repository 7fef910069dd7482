// src/ingest/metadata_cache.rs
use std::collections::HashMap;

use metrics::counter;

use crate::ingest::error::IngestResult;
use crate::ingest::types::{ChannelMetadata, ChannelProfile, ContentSource};

/// Status value that marks a channel as verified.
pub const ELIGIBLE_STATUS: &str = "eligible";

/// Channel metadata memoized for the lifetime of one run. Never invalidated;
/// dropped together with the run that owns it.
#[derive(Debug, Default)]
pub struct ChannelMetadataCache {
    entries: HashMap<String, ChannelMetadata>,
}

impl ChannelMetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache hit returns the stored value without touching `source`; a miss
    /// issues exactly one channel query. Query errors are not cached.
    pub async fn get<S: ContentSource + ?Sized>(
        &mut self,
        source: &S,
        channel_id: &str,
    ) -> IngestResult<ChannelMetadata> {
        if let Some(hit) = self.entries.get(channel_id) {
            counter!("ingest_metadata_cache_hits_total").increment(1);
            return Ok(hit.clone());
        }

        counter!("ingest_metadata_cache_misses_total").increment(1);
        let profile = source.channel_profile(channel_id).await?;
        let meta = metadata_from_profile(channel_id, profile);
        self.entries.insert(channel_id.to_string(), meta.clone());
        Ok(meta)
    }

    pub fn contains(&self, channel_id: &str) -> bool {
        self.entries.contains_key(channel_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn metadata_from_profile(channel_id: &str, p: ChannelProfile) -> ChannelMetadata {
    ChannelMetadata {
        channel_id: channel_id.to_string(),
        display_name: p.display_name,
        avatar_url: p.avatar_url,
        is_verified: p.long_uploads_status.as_deref() == Some(ELIGIBLE_STATUS),
    }
}
