//! Caption-track transcript fetcher for YouTube videos
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::Html;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

use super::{TranscriptSegment, TranscriptSource};
use crate::error::TranscriptError;

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

static TIMED_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<text\b[^>]*?\bstart="([0-9.]+)"[^>]*>(.*?)</text>"#)
        .expect("timed text pattern is valid")
});

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    #[serde(default)]
    language_code: String,
    #[serde(default)]
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// Fetches timed text through the caption tracks advertised on the watch page
#[derive(Clone)]
pub struct YouTubeTranscriptFetcher {
    client: Client,
    languages: Vec<String>,
}

impl YouTubeTranscriptFetcher {
    pub fn new(timeout_seconds: u64, languages: Vec<String>) -> Result<Self, TranscriptError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, languages })
    }

    async fn get_text(&self, url: &str) -> Result<String, TranscriptError> {
        let response = self
            .client
            .get(url)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TranscriptError::Fetch(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl TranscriptSource for YouTubeTranscriptFetcher {
    async fn fetch(&self, external_id: &str) -> Result<Vec<TranscriptSegment>, TranscriptError> {
        let watch_url = format!("{}{}", WATCH_URL, urlencoding::encode(external_id));
        debug!("Fetching watch page {}", watch_url);

        let page = self.get_text(&watch_url).await?;
        let tracks = extract_caption_tracks(&page)?;
        let track = select_track(&tracks, &self.languages).ok_or_else(|| {
            TranscriptError::Unavailable(format!("no caption tracks for {}", external_id))
        })?;

        debug!(
            "Using {} caption track '{}' for {}",
            if track.is_generated() { "generated" } else { "manual" },
            track.language_code,
            external_id
        );

        let xml = self.get_text(&track.base_url).await?;
        let segments = parse_timed_text(&xml)?;
        if segments.is_empty() {
            return Err(TranscriptError::Fetch(format!(
                "empty timed text response for {}",
                external_id
            )));
        }

        Ok(segments)
    }
}

/// Pull the `captionTracks` array out of the embedded player response
fn extract_caption_tracks(page: &str) -> Result<Vec<CaptionTrack>, TranscriptError> {
    const MARKER: &str = "\"captionTracks\":";

    let Some(pos) = page.find(MARKER) else {
        if page.contains("class=\"g-recaptcha\"") {
            return Err(TranscriptError::Fetch(
                "request blocked by captcha (too many requests)".to_string(),
            ));
        }
        if page.contains("\"playabilityStatus\":{\"status\":\"ERROR\"") {
            return Err(TranscriptError::Unavailable("video unavailable".to_string()));
        }
        return Err(TranscriptError::Unavailable("transcripts are disabled".to_string()));
    };

    let json = &page[pos + MARKER.len()..];
    let tracks = serde_json::Deserializer::from_str(json)
        .into_iter::<Vec<CaptionTrack>>()
        .next()
        .ok_or_else(|| TranscriptError::Fetch("truncated caption track list".to_string()))?
        .map_err(|e| TranscriptError::Fetch(format!("invalid caption track list: {}", e)))?;

    Ok(tracks)
}

/// Manual track in a preferred language, then a generated one, then anything
fn select_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    for generated in [false, true] {
        for language in languages {
            if let Some(track) = tracks
                .iter()
                .find(|t| t.is_generated() == generated && &t.language_code == language)
            {
                return Some(track);
            }
        }
    }
    tracks.first()
}

/// Parse timed-text XML (`<text start=".." dur="..">..</text>`) into segments
fn parse_timed_text(xml: &str) -> Result<Vec<TranscriptSegment>, TranscriptError> {
    let segments = TIMED_TEXT
        .captures_iter(xml)
        .filter_map(|caps| {
            let start: f64 = caps.get(1)?.as_str().parse().ok()?;
            let raw = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            Some(TranscriptSegment::from_start_secs(start, decode_text(raw)))
        })
        .collect();

    Ok(segments)
}

/// Decode entities and drop inline markup. Timed text is often escaped twice
/// (`&amp;#39;`), so decoding repeats while entities remain.
fn decode_text(raw: &str) -> String {
    let mut text = raw.to_string();
    for _ in 0..2 {
        if !text.contains('&') && !text.contains('<') {
            break;
        }
        let fragment = Html::parse_fragment(&text);
        text = fragment.root_element().text().collect::<String>();
    }
    text.trim().to_string()
}
