// src/ingest/fetcher.rs
//! Per-channel fetch-and-filter.
//!
//! The cheap "latest item" query runs first; the metered details query only
//! runs once the item is known to be new.

use metrics::counter;

use crate::ingest::duration::parse_duration;
use crate::ingest::error::IngestResult;
use crate::ingest::metadata_cache::ChannelMetadataCache;
use crate::ingest::novelty;
use crate::ingest::types::{ContentItem, ContentSource, PersistenceGateway};

/// Longest accepted item, in seconds.
pub const MAX_SHORT_FORM_SECS: u64 = 180;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Accepted(ContentItem),
    NoRecentItem,
    AlreadyIngested(String),
    DetailsUnavailable(String),
    TooLong { item_id: String, seconds: u64 },
}

impl FetchOutcome {
    pub fn into_item(self) -> Option<ContentItem> {
        match self {
            FetchOutcome::Accepted(item) => Some(item),
            _ => None,
        }
    }
}

pub struct ChannelFetcher<'a, S: ?Sized, P: ?Sized> {
    source: &'a S,
    store: &'a P,
    cache: &'a mut ChannelMetadataCache,
    max_duration_secs: u64,
}

impl<'a, S, P> ChannelFetcher<'a, S, P>
where
    S: ContentSource + ?Sized,
    P: PersistenceGateway + ?Sized,
{
    pub fn new(source: &'a S, store: &'a P, cache: &'a mut ChannelMetadataCache) -> Self {
        Self {
            source,
            store,
            cache,
            max_duration_secs: MAX_SHORT_FORM_SECS,
        }
    }

    pub fn with_max_duration(mut self, secs: u64) -> Self {
        self.max_duration_secs = secs;
        self
    }

    pub async fn fetch_one(&mut self, channel_id: &str) -> IngestResult<FetchOutcome> {
        let Some(latest) = self.source.latest_item(channel_id).await? else {
            return Ok(FetchOutcome::NoRecentItem);
        };

        if novelty::exists(self.store, &latest.item_id).await? {
            counter!("ingest_items_existing_total").increment(1);
            return Ok(FetchOutcome::AlreadyIngested(latest.item_id));
        }

        let Some(details) = self.source.item_details(&latest.item_id).await? else {
            return Ok(FetchOutcome::DetailsUnavailable(latest.item_id));
        };

        let seconds = parse_duration(&details.duration);
        if seconds > self.max_duration_secs {
            counter!("ingest_items_too_long_total").increment(1);
            return Ok(FetchOutcome::TooLong {
                item_id: details.item_id,
                seconds,
            });
        }

        let origin = if details.channel_id.is_empty() {
            channel_id
        } else {
            details.channel_id.as_str()
        };
        let meta = self.cache.get(self.source, origin).await?;

        Ok(FetchOutcome::Accepted(ContentItem {
            item_id: details.item_id,
            title: details.title,
            description: details.description,
            thumbnail_url: details.thumbnail_url,
            duration: details.duration,
            duration_seconds: seconds,
            channel_id: meta.channel_id,
            creator_username: meta.display_name,
            creator_avatar: meta.avatar_url,
            is_verified: meta.is_verified,
            likes: details.likes,
            comments: details.comments,
            is_ai: true,
            ingested_at: None,
        }))
    }
}
