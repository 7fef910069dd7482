use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::config::YouTubeCredentials;
use crate::ingest::error::{IngestError, IngestResult};
use crate::ingest::types::{ChannelProfile, ContentSource, ItemDetails, LatestItem};

// Field masks keep responses (and parsing) down to what the job reads.
const SEARCH_FIELDS: &str = "items(id(videoId))";
const VIDEO_FIELDS: &str = "items(snippet(title,description,thumbnails/high,channelId),contentDetails/duration,statistics)";
const CHANNEL_FIELDS: &str = "items(snippet(title,thumbnails/high/url),status)";

// --- search.list ---

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: Option<SearchId>,
}

#[derive(Debug, Deserialize)]
struct SearchId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

// --- videos.list ---

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: Option<VideoSnippet>,
    #[serde(rename = "contentDetails")]
    content_details: Option<ContentDetails>,
    statistics: Option<VideoStatistics>,
}

#[derive(Debug, Deserialize)]
struct VideoSnippet {
    title: Option<String>,
    #[serde(default)]
    description: String,
    thumbnails: Option<Thumbnails>,
    #[serde(rename = "channelId")]
    channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

/// Counters arrive as decimal strings and may be hidden by the uploader.
#[derive(Debug, Default, Deserialize)]
struct VideoStatistics {
    #[serde(rename = "likeCount")]
    like_count: Option<String>,
    #[serde(rename = "commentCount")]
    comment_count: Option<String>,
}

// --- channels.list ---

#[derive(Debug, Deserialize)]
struct ChannelsResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    snippet: Option<ChannelSnippet>,
    status: Option<ChannelStatus>,
}

#[derive(Debug, Deserialize)]
struct ChannelSnippet {
    title: Option<String>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct ChannelStatus {
    #[serde(rename = "longUploadsStatus")]
    long_uploads_status: Option<String>,
}

// --- shared ---

#[derive(Debug, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

fn parse_count(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok()).unwrap_or(0)
}

fn high_thumbnail(t: Option<Thumbnails>) -> Option<String> {
    t.and_then(|t| t.high).and_then(|h| h.url)
}

fn decode<'de, T: Deserialize<'de>>(endpoint: &str, body: &'de str) -> IngestResult<T> {
    serde_json::from_str(body)
        .map_err(|e| IngestError::MalformedData(format!("{endpoint} response: {e}")))
}

fn missing(endpoint: &str, field: &str, id: &str) -> IngestError {
    IngestError::MalformedData(format!("{endpoint}: {field} missing for {id}"))
}

pub(crate) fn parse_search(body: &str) -> IngestResult<Option<LatestItem>> {
    let resp: SearchResponse = decode("search", body)?;
    let Some(first) = resp.items.into_iter().next() else {
        return Ok(None);
    };
    let item_id = first
        .id
        .and_then(|id| id.video_id)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| IngestError::MalformedData("search: item without videoId".into()))?;
    Ok(Some(LatestItem { item_id }))
}

pub(crate) fn parse_videos(item_id: &str, body: &str) -> IngestResult<Option<ItemDetails>> {
    let resp: VideosResponse = decode("videos", body)?;
    let Some(item) = resp.items.into_iter().next() else {
        return Ok(None);
    };
    let snippet = item.snippet.ok_or_else(|| missing("videos", "snippet", item_id))?;
    let duration = item
        .content_details
        .and_then(|c| c.duration)
        .ok_or_else(|| missing("videos", "contentDetails.duration", item_id))?;
    let thumbnail_url = high_thumbnail(snippet.thumbnails)
        .ok_or_else(|| missing("videos", "thumbnails.high", item_id))?;
    let stats = item.statistics.unwrap_or_default();

    Ok(Some(ItemDetails {
        item_id: item_id.to_string(),
        title: snippet.title.unwrap_or_default(),
        description: snippet.description,
        thumbnail_url,
        duration,
        channel_id: snippet.channel_id.unwrap_or_default(),
        likes: parse_count(stats.like_count.as_deref()),
        comments: parse_count(stats.comment_count.as_deref()),
    }))
}

pub(crate) fn parse_channels(channel_id: &str, body: &str) -> IngestResult<ChannelProfile> {
    let resp: ChannelsResponse = decode("channels", body)?;
    let item = resp
        .items
        .into_iter()
        .next()
        .ok_or_else(|| missing("channels", "item", channel_id))?;
    let snippet = item.snippet.ok_or_else(|| missing("channels", "snippet", channel_id))?;
    let avatar_url = high_thumbnail(snippet.thumbnails)
        .ok_or_else(|| missing("channels", "thumbnails.high", channel_id))?;

    Ok(ChannelProfile {
        display_name: snippet.title.unwrap_or_default(),
        avatar_url,
        long_uploads_status: item.status.and_then(|s| s.long_uploads_status),
    })
}

/// YouTube Data API v3 client for the three read-only queries the job makes.
pub struct YouTubeSource {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl YouTubeSource {
    pub fn new(creds: &YouTubeCredentials) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("shorts-ingest/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(20))
            .build()
            .context("building youtube http client")?;
        Ok(Self {
            http,
            api_key: creds.api_key.clone(),
            api_base: creds.api_base.clone(),
        })
    }

    async fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> IngestResult<String> {
        let url = format!("{}/{}", self.api_base, endpoint);
        // `without_url` keeps the API key out of error messages.
        let resp = self
            .http
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| IngestError::ExternalSource(format!("{endpoint}: {}", e.without_url())))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| IngestError::ExternalSource(format!("{endpoint} body: {}", e.without_url())))?;

        if !status.is_success() {
            let reason = serde_json::from_str::<ErrorResponse>(&body)
                .map(|r| r.error.message)
                .unwrap_or_default();
            return Err(IngestError::ExternalSource(format!(
                "{endpoint} returned {status} {reason}"
            )));
        }
        Ok(body)
    }
}

#[async_trait]
impl ContentSource for YouTubeSource {
    async fn latest_item(&self, channel_id: &str) -> IngestResult<Option<LatestItem>> {
        let body = self
            .get(
                "search",
                &[
                    ("channelId", channel_id),
                    ("part", "snippet"),
                    ("order", "date"),
                    ("maxResults", "1"),
                    ("type", "video"),
                    ("videoDuration", "short"),
                    ("fields", SEARCH_FIELDS),
                ],
            )
            .await?;
        parse_search(&body)
    }

    async fn item_details(&self, item_id: &str) -> IngestResult<Option<ItemDetails>> {
        let body = self
            .get(
                "videos",
                &[
                    ("id", item_id),
                    ("part", "snippet,contentDetails,statistics"),
                    ("fields", VIDEO_FIELDS),
                ],
            )
            .await?;
        parse_videos(item_id, &body)
    }

    async fn channel_profile(&self, channel_id: &str) -> IngestResult<ChannelProfile> {
        let body = self
            .get(
                "channels",
                &[
                    ("id", channel_id),
                    ("part", "snippet,status"),
                    ("fields", CHANNEL_FIELDS),
                ],
            )
            .await?;
        parse_channels(channel_id, &body)
    }

    fn name(&self) -> &'static str {
        "youtube"
    }
}
