//! Video metadata source.
//!
//! The metadata endpoint answers with a form-urlencoded body. An `errorcode`
//! or `status=fail` in that body is a failed lookup; `reason` carries the
//! message.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::form_urlencoded;

use y2a_models::extract_youtube_id;

use crate::error::{ClientError, ClientResult};

/// Metadata for one video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub author: String,
    pub keywords: String,
    pub avg_rating: f32,
    pub view_count: u64,
    pub duration: Duration,
    pub formats: Vec<Format>,
}

/// One downloadable stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Format {
    pub itag: u32,
    pub mime_type: String,
    pub quality: String,
    pub url: String,
}

impl VideoInfo {
    /// Link a converter should fetch: the first stream, or `fallback` when
    /// the source listed none.
    pub fn dispatch_link(&self, fallback: &str) -> String {
        self.formats
            .first()
            .map(|f| f.url.clone())
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Parse a form-urlencoded metadata body.
    pub fn parse(id: &str, body: &str) -> ClientResult<Self> {
        let mut info = VideoInfo {
            id: id.to_string(),
            ..Default::default()
        };
        let mut failed = false;
        let mut reason = String::new();

        for (key, value) in form_urlencoded::parse(body.trim().as_bytes()) {
            match key.as_ref() {
                "errorcode" if !value.is_empty() => failed = true,
                "status" if value == "fail" => failed = true,
                "reason" => reason = value.into_owned(),
                "title" => info.title = value.into_owned(),
                "author" => info.author = value.into_owned(),
                "keywords" => info.keywords = value.into_owned(),
                "view_count" => info.view_count = value.parse().unwrap_or_default(),
                "avg_rating" => info.avg_rating = value.parse().unwrap_or_default(),
                "length_seconds" => {
                    info.duration = Duration::from_secs(value.parse().unwrap_or_default())
                }
                "url_encoded_fmt_stream_map" => {
                    info.formats = value.split(',').filter_map(parse_format).collect()
                }
                _ => {}
            }
        }

        if failed {
            return Err(ClientError::metadata(if reason.is_empty() {
                "metadata source reported failure".to_string()
            } else {
                reason
            }));
        }

        Ok(info)
    }
}

fn parse_format(raw: &str) -> Option<Format> {
    let mut format = Format::default();
    let mut signature = String::new();

    for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
        match key.as_ref() {
            "itag" => format.itag = value.parse().unwrap_or_default(),
            "type" => format.mime_type = value.into_owned(),
            "quality" => format.quality = value.into_owned(),
            "url" => format.url = value.into_owned(),
            "sig" => signature = value.into_owned(),
            _ => {}
        }
    }

    if format.url.is_empty() {
        return None;
    }
    if !signature.is_empty() {
        format.url = format!("{}&signature={}", format.url, signature);
    }
    Some(format)
}

/// Source of video metadata, looked up before a job is dispatched.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn video_info(&self, link: &str) -> ClientResult<VideoInfo>;
}

/// Configuration for the metadata client.
#[derive(Debug, Clone)]
pub struct VideoInfoConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for VideoInfoConfig {
    fn default() -> Self {
        Self {
            base_url: "http://www.youtube.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl VideoInfoConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("VIDEO_INFO_URL")
                .unwrap_or_else(|_| "http://www.youtube.com".to_string()),
            timeout: Duration::from_secs(
                std::env::var("VIDEO_INFO_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
        }
    }
}

/// `get_video_info` client.
#[derive(Clone)]
pub struct VideoInfoClient {
    http: Client,
    config: VideoInfoConfig,
}

impl VideoInfoClient {
    pub fn new(config: VideoInfoConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self { http, config })
    }

    pub fn from_env() -> ClientResult<Self> {
        Self::new(VideoInfoConfig::from_env())
    }
}

#[async_trait]
impl MetadataSource for VideoInfoClient {
    async fn video_info(&self, link: &str) -> ClientResult<VideoInfo> {
        let id = extract_youtube_id(link).map_err(|e| ClientError::InvalidLink(e.to_string()))?;
        let url = format!(
            "{}/get_video_info",
            self.config.base_url.trim_end_matches('/')
        );

        debug!(video_id = %id, "Fetching video info");

        let response = self
            .http
            .get(&url)
            .query(&[("video_id", id.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::metadata(format!(
                "metadata source returned {}",
                status
            )));
        }

        let body = response.text().await?;
        VideoInfo::parse(&id, &body)
    }
}
