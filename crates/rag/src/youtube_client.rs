//! YouTube Data API v3 client
//!
//! Two calls per query: `search.list` for relevance-ordered video ids, then
//! `videos.list` for snippet, duration and statistics of those ids.

use anyhow::{Context, Result};
use askroute_common::{SourceKind, VideoResult, YouTubeConfig};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::sources::{truncate_with_ellipsis, SourceAdapter, SourceBatch};

const DESCRIPTION_LIMIT: usize = 200;

static ISO8601_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
        .expect("duration pattern is valid")
});

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    id: Option<SearchItemId>,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId", default)]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

/// Video resource from `videos.list`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub snippet: Option<VideoSnippet>,
    #[serde(rename = "contentDetails", default)]
    pub content_details: Option<ContentDetails>,
    #[serde(default)]
    pub statistics: Option<VideoStatistics>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub channel_title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentDetails {
    #[serde(default)]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    #[serde(default)]
    pub view_count: Option<String>,
}

impl VideoItem {
    /// Normalize into a `VideoResult`; videos without id, title or channel are dropped
    pub fn into_record(self) -> Option<VideoResult> {
        let id = self.id.filter(|id| !id.trim().is_empty())?;
        let snippet = self.snippet?;
        let title = snippet.title.filter(|t| !t.trim().is_empty())?;
        let channel = snippet.channel_title.filter(|c| !c.trim().is_empty())?;

        let duration = self
            .content_details
            .and_then(|details| details.duration)
            .and_then(|raw| format_duration(&raw))
            .unwrap_or_else(|| "N/A".to_string());
        let views = self
            .statistics
            .and_then(|stats| stats.view_count)
            .unwrap_or_else(|| "0".to_string());

        Some(VideoResult {
            title,
            channel,
            duration,
            url: format!("https://www.youtube.com/watch?v={}", id),
            description: truncate_with_ellipsis(
                snippet.description.as_deref().unwrap_or_default(),
                DESCRIPTION_LIMIT,
            ),
            views,
            published: snippet.published_at.unwrap_or_else(|| "N/A".to_string()),
        })
    }
}

/// Render an ISO 8601 duration (`P1DT2H3M4S`) as `"1d 2h 3m 4s"`.
///
/// Zero components are omitted, an all-zero duration is `"0s"`, and input
/// that does not match the pattern yields `None`.
pub fn format_duration(raw: &str) -> Option<String> {
    let caps = ISO8601_DURATION.captures(raw.trim())?;
    let components: Vec<(u64, &str)> = [(1, "d"), (2, "h"), (3, "m"), (4, "s")]
        .iter()
        .filter_map(|&(idx, unit)| {
            caps.get(idx)
                .and_then(|m| m.as_str().parse::<u64>().ok())
                .map(|value| (value, unit))
        })
        .collect();

    // A bare "P" or "PT" carries no components
    if components.is_empty() {
        return None;
    }

    let rendered: Vec<String> = components
        .into_iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{}{}", value, unit))
        .collect();

    if rendered.is_empty() {
        Some("0s".to_string())
    } else {
        Some(rendered.join(" "))
    }
}

#[derive(Debug, Clone)]
pub struct YouTubeClient {
    endpoint: String,
    api_key: Option<String>,
    client: Client,
    max_results: usize,
}

impl YouTubeClient {
    pub fn new(config: &YouTubeConfig, max_results: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .context("Failed to build HTTP client")?;

        info!(
            "Initialized YouTube client: endpoint={}, api_key_configured={}",
            config.endpoint,
            config.api_key.is_some()
        );

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
            max_results,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let api_key = self
            .api_key
            .as_deref()
            .context("YouTube API key not configured")?;

        let response = self
            .client
            .get(format!("{}/{}", self.endpoint, resource))
            .query(params)
            .query(&[("key", api_key)])
            .send()
            .await
            .with_context(|| format!("Failed to send YouTube {} request", resource))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("YouTube {} returned error status {}: {}", resource, status, error_text);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse YouTube {} response", resource))
    }

    /// Video ids for `query` in relevance order
    #[instrument(skip(self), fields(query_len = query.len()))]
    pub async fn search_video_ids(&self, query: &str) -> Result<Vec<String>> {
        let response: SearchListResponse = self
            .get_json(
                "search",
                &[
                    ("part", "id,snippet".to_string()),
                    ("q", query.to_string()),
                    ("type", "video".to_string()),
                    ("order", "relevance".to_string()),
                    ("maxResults", self.max_results.to_string()),
                ],
            )
            .await?;

        let ids: Vec<String> = response
            .items
            .into_iter()
            .filter_map(|item| item.id.and_then(|id| id.video_id))
            .collect();
        debug!(count = ids.len(), "YouTube search.list returned ids");
        Ok(ids)
    }

    /// Details for `ids`, returned in the order of `ids`
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn video_details(&self, ids: &[String]) -> Result<Vec<VideoItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let response: VideoListResponse = self
            .get_json(
                "videos",
                &[
                    ("part", "snippet,contentDetails,statistics".to_string()),
                    ("id", ids.join(",")),
                ],
            )
            .await?;

        let mut by_id: HashMap<String, VideoItem> = response
            .items
            .into_iter()
            .filter_map(|item| item.id.clone().map(|id| (id, item)))
            .collect();

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// Search then fetch details, preserving search order
    pub async fn search(&self, query: &str) -> Result<Vec<VideoItem>> {
        let ids = self.search_video_ids(query).await?;
        self.video_details(&ids).await
    }

    pub fn normalize(&self, items: Vec<VideoItem>) -> Vec<VideoResult> {
        let mut seen = HashSet::new();
        items
            .into_iter()
            .filter_map(VideoItem::into_record)
            .filter(|record| seen.insert(record.url.clone()))
            .take(self.max_results)
            .collect()
    }
}

#[async_trait]
impl SourceAdapter for YouTubeClient {
    fn kind(&self) -> SourceKind {
        SourceKind::Video
    }

    async fn search(&self, query: &str) -> SourceBatch {
        if !self.is_configured() {
            debug!("YouTube API key not configured, skipping video search");
            return SourceBatch::Video(Vec::new());
        }

        match YouTubeClient::search(self, query).await {
            Ok(items) => {
                let records = self.normalize(items);
                info!(count = records.len(), "Video search returned results");
                SourceBatch::Video(records)
            }
            Err(e) => {
                warn!("Video search failed, continuing without video results: {:#}", e);
                SourceBatch::Video(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration("PT1H5M").as_deref(), Some("1h 5m"));
        assert_eq!(format_duration("P2DT3H").as_deref(), Some("2d 3h"));
        assert_eq!(format_duration("PT4M13S").as_deref(), Some("4m 13s"));
        assert_eq!(format_duration("PT1H0M30S").as_deref(), Some("1h 30s"));
        assert_eq!(format_duration("PT0S").as_deref(), Some("0s"));
        assert_eq!(format_duration("P0D").as_deref(), Some("0s"));
    }

    #[test]
    fn test_format_duration_rejects_garbage() {
        assert_eq!(format_duration("P"), None);
        assert_eq!(format_duration("PT"), None);
        assert_eq!(format_duration("1h 5m"), None);
        assert_eq!(format_duration(""), None);
    }

    #[test]
    fn test_into_record_applies_defaults() {
        let item = VideoItem {
            id: Some("abc123".to_string()),
            snippet: Some(VideoSnippet {
                title: Some("Rust in 100 seconds".to_string()),
                channel_title: Some("Fireship".to_string()),
                description: None,
                published_at: None,
            }),
            content_details: None,
            statistics: None,
        };

        let record = item.into_record().unwrap();
        assert_eq!(record.url, "https://www.youtube.com/watch?v=abc123");
        assert_eq!(record.duration, "N/A");
        assert_eq!(record.views, "0");
        assert_eq!(record.published, "N/A");
        assert_eq!(record.description, "");
    }

    #[test]
    fn test_into_record_drops_missing_channel() {
        let item = VideoItem {
            id: Some("abc123".to_string()),
            snippet: Some(VideoSnippet {
                title: Some("Untitled".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(item.into_record().is_none());
    }

    #[test]
    fn test_long_description_is_truncated() {
        let item = VideoItem {
            id: Some("v".to_string()),
            snippet: Some(VideoSnippet {
                title: Some("t".to_string()),
                channel_title: Some("c".to_string()),
                description: Some("x".repeat(250)),
                published_at: Some("2024-01-01T00:00:00Z".to_string()),
            }),
            ..Default::default()
        };
        let record = item.into_record().unwrap();
        assert_eq!(record.description.chars().count(), 203);
        assert!(record.description.ends_with("..."));
    }
}
