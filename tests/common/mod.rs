// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use shorts_ingest::ingest::error::{IngestError, IngestResult};
use shorts_ingest::ingest::types::{
    ChannelProfile, ContentItem, ContentSource, ItemDetails, LatestItem,
};
use shorts_ingest::IngestConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Latest(String),
    Details(String),
    Channel(String),
}

/// Scripted content source that records every call.
#[derive(Default)]
pub struct MockSource {
    latest: HashMap<String, String>,
    details: HashMap<String, ItemDetails>,
    profiles: HashMap<String, ChannelProfile>,
    failing_latest: HashSet<String>,
    failing_details: HashSet<String>,
    failing_profiles: HashSet<String>,
    pub calls: Mutex<Vec<Call>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// `channel` publishes `item_id` with the given duration notation.
    pub fn with_item(mut self, channel: &str, item_id: &str, duration: &str) -> Self {
        self.latest.insert(channel.to_string(), item_id.to_string());
        self.details.insert(
            item_id.to_string(),
            ItemDetails {
                item_id: item_id.to_string(),
                title: format!("title {item_id}"),
                description: format!("description {item_id}"),
                thumbnail_url: format!("https://i.ytimg.com/vi/{item_id}/hqdefault.jpg"),
                duration: duration.to_string(),
                channel_id: channel.to_string(),
                likes: 7,
                comments: 3,
            },
        );
        self.profiles
            .entry(channel.to_string())
            .or_insert_with(|| profile(channel, Some("eligible")));
        self
    }

    pub fn with_profile(mut self, channel: &str, status: Option<&str>) -> Self {
        self.profiles
            .insert(channel.to_string(), profile(channel, status));
        self
    }

    pub fn failing_latest(mut self, channel: &str) -> Self {
        self.failing_latest.insert(channel.to_string());
        self
    }

    pub fn failing_details(mut self, item_id: &str) -> Self {
        self.failing_details.insert(item_id.to_string());
        self
    }

    pub fn failing_profile(mut self, channel: &str) -> Self {
        self.failing_profiles.insert(channel.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn details_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Details(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn channel_calls(&self, channel: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| **c == Call::Channel(channel.to_string()))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn profile(channel: &str, status: Option<&str>) -> ChannelProfile {
    ChannelProfile {
        display_name: format!("name {channel}"),
        avatar_url: format!("https://yt3.ggpht.com/{channel}.jpg"),
        long_uploads_status: status.map(str::to_string),
    }
}

#[async_trait]
impl ContentSource for MockSource {
    async fn latest_item(&self, channel_id: &str) -> IngestResult<Option<LatestItem>> {
        self.record(Call::Latest(channel_id.to_string()));
        if self.failing_latest.contains(channel_id) {
            return Err(IngestError::ExternalSource("search: connection reset".into()));
        }
        Ok(self.latest.get(channel_id).map(|id| LatestItem {
            item_id: id.clone(),
        }))
    }

    async fn item_details(&self, item_id: &str) -> IngestResult<Option<ItemDetails>> {
        self.record(Call::Details(item_id.to_string()));
        if self.failing_details.contains(item_id) {
            return Err(IngestError::ExternalSource("videos: connection timed out".into()));
        }
        Ok(self.details.get(item_id).cloned())
    }

    async fn channel_profile(&self, channel_id: &str) -> IngestResult<ChannelProfile> {
        self.record(Call::Channel(channel_id.to_string()));
        if self.failing_profiles.contains(channel_id) {
            return Err(IngestError::ExternalSource("channels: 503".into()));
        }
        self.profiles
            .get(channel_id)
            .cloned()
            .ok_or_else(|| IngestError::MalformedData(format!("no channel {channel_id}")))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// 23:30 local time in Casablanca (the default zone and target hour).
pub fn in_target_hour() -> DateTime<Utc> {
    chrono_tz::Africa::Casablanca
        .with_ymd_and_hms(2024, 10, 1, 23, 30, 0)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn config_for(channels: &[&str]) -> IngestConfig {
    IngestConfig {
        channels: channels.iter().map(|c| c.to_string()).collect(),
        request_throttle_ms: 0,
        ..IngestConfig::default()
    }
}

pub fn stored_item(item_id: &str) -> ContentItem {
    ContentItem {
        item_id: item_id.to_string(),
        title: "old".into(),
        description: String::new(),
        thumbnail_url: String::new(),
        duration: "PT30S".into(),
        duration_seconds: 30,
        channel_id: "UCold".into(),
        creator_username: "old".into(),
        creator_avatar: String::new(),
        is_verified: false,
        likes: 0,
        comments: 0,
        is_ai: true,
        ingested_at: None,
    }
}
