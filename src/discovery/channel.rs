//! Channel videos-page scraper
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::EpisodeSource;
use crate::episode::DiscoveredEpisode;
use crate::error::{PodwiseError, Result};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const INITIAL_DATA_MARKERS: [&str; 2] = ["var ytInitialData = ", "window[\"ytInitialData\"] = "];

/// Scrapes the most recent uploads from a channel's videos page
#[derive(Clone)]
pub struct ChannelScraper {
    client: Client,
    videos_url: Url,
}

impl ChannelScraper {
    pub fn new(channel_url: &str, timeout_seconds: u64) -> Result<Self> {
        let videos_url = videos_page_url(channel_url)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, videos_url })
    }

    pub fn videos_url(&self) -> &Url {
        &self.videos_url
    }

    /// Display name of the channel (last path segment, e.g. `@handle`)
    pub fn channel_name(&self) -> String {
        channel_name(&self.videos_url)
    }

    async fn fetch_page(&self) -> Result<String> {
        let response = self
            .client
            .get(self.videos_url.clone())
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| {
                PodwiseError::Discovery(format!("cannot reach {}: {}", self.videos_url, e))
            })?;

        if !response.status().is_success() {
            return Err(PodwiseError::Discovery(format!(
                "HTTP {} from {}",
                response.status(),
                self.videos_url
            )));
        }

        response
            .text()
            .await
            .map_err(|e| PodwiseError::Discovery(format!("cannot read channel page: {}", e)))
    }
}

#[async_trait]
impl EpisodeSource for ChannelScraper {
    async fn list_recent_episodes(&self, limit: usize) -> Result<Vec<DiscoveredEpisode>> {
        info!("🌐 Loading channel page: {}", self.videos_url);
        let html = self.fetch_page().await?;
        parse_channel_page(&html, limit)
    }
}

/// Normalize a channel URL so it points at the channel's videos tab
pub fn videos_page_url(channel_url: &str) -> Result<Url> {
    let mut url = Url::parse(channel_url.trim()).map_err(|e| {
        PodwiseError::Configuration(format!("invalid channel URL '{}': {}", channel_url, e))
    })?;

    let path = url.path().trim_end_matches('/').to_string();
    if path.ends_with("/videos") {
        url.set_path(&path);
    } else {
        url.set_path(&format!("{}/videos", path));
    }
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

fn channel_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| {
            segments
                .filter(|s| !s.is_empty() && *s != "videos")
                .last()
                .map(str::to_string)
        })
        .unwrap_or_else(|| url.host_str().unwrap_or_default().to_string())
}

/// Extract up to `limit` episodes from a channel videos page, newest first.
///
/// Rendered markup (`a#video-title-link`) is preferred; otherwise the embedded
/// `ytInitialData` JSON is walked. Individual malformed entries are skipped.
pub fn parse_channel_page(html: &str, limit: usize) -> Result<Vec<DiscoveredEpisode>> {
    let entries = match rendered_entries(html)? {
        Some(entries) => entries,
        None => initial_data_entries(html)?,
    };

    if entries.is_empty() {
        return Err(PodwiseError::Discovery(
            "no videos found on channel page".to_string(),
        ));
    }

    let mut episodes = Vec::new();
    for (i, entry) in entries.into_iter().take(limit).enumerate() {
        match entry {
            Ok(episode) => {
                info!("Episode {} identified: {}", i + 1, episode.title);
                episodes.push(episode);
            }
            Err(e) => warn!("Error processing video {}: {}", i + 1, e),
        }
    }

    Ok(episodes)
}

type Entry = std::result::Result<DiscoveredEpisode, String>;

fn rendered_entries(html: &str) -> Result<Option<Vec<Entry>>> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a#video-title-link")
        .map_err(|e| PodwiseError::Discovery(format!("invalid selector: {:?}", e)))?;

    let entries: Vec<Entry> = document
        .select(&selector)
        .map(|link| -> Entry {
            let href = link
                .value()
                .attr("href")
                .ok_or_else(|| "link has no href".to_string())?;
            let title = link
                .value()
                .attr("title")
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| format!("link {} has no title", href))?;
            let video_id =
                video_id_from_href(href).ok_or_else(|| format!("not a watch link: {}", href))?;
            Ok(DiscoveredEpisode::new(title, video_id))
        })
        .collect();

    if entries.is_empty() {
        Ok(None)
    } else {
        debug!("Found {} rendered video links", entries.len());
        Ok(Some(entries))
    }
}

fn video_id_from_href(href: &str) -> Option<String> {
    let (_, rest) = href.split_once("watch?v=")?;
    let id = rest.split('&').next().unwrap_or_default();
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

fn initial_data_entries(html: &str) -> Result<Vec<Entry>> {
    let start = INITIAL_DATA_MARKERS
        .iter()
        .find_map(|marker| html.find(marker).map(|pos| pos + marker.len()))
        .ok_or_else(|| {
            PodwiseError::Discovery("expected channel page structure not found".to_string())
        })?;

    let data: Value = serde_json::Deserializer::from_str(&html[start..])
        .into_iter::<Value>()
        .next()
        .ok_or_else(|| PodwiseError::Discovery("empty ytInitialData".to_string()))?
        .map_err(|e| PodwiseError::Discovery(format!("invalid ytInitialData: {}", e)))?;

    let mut entries = Vec::new();
    collect_renderers(&data, &mut entries);
    debug!("Found {} video renderers in ytInitialData", entries.len());
    Ok(entries)
}

fn collect_renderers(value: &Value, out: &mut Vec<Entry>) {
    match value {
        Value::Object(map) => {
            if let Some(renderer) = map.get("videoRenderer") {
                out.push(parse_video_renderer(renderer));
            } else if let Some(lockup) = map.get("lockupViewModel") {
                if lockup.get("contentType").and_then(Value::as_str)
                    == Some("LOCKUP_CONTENT_TYPE_VIDEO")
                {
                    out.push(parse_lockup(lockup));
                }
            } else {
                for child in map.values() {
                    collect_renderers(child, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_renderers(item, out);
            }
        }
        _ => {}
    }
}

fn parse_video_renderer(renderer: &Value) -> Entry {
    let video_id = renderer
        .get("videoId")
        .and_then(Value::as_str)
        .ok_or_else(|| "videoRenderer without videoId".to_string())?;

    let title = renderer
        .pointer("/title/runs/0/text")
        .or_else(|| renderer.pointer("/title/simpleText"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| format!("video {} has no title", video_id))?;

    Ok(DiscoveredEpisode::new(title, video_id))
}

fn parse_lockup(lockup: &Value) -> Entry {
    let video_id = lockup
        .get("contentId")
        .and_then(Value::as_str)
        .ok_or_else(|| "lockup without contentId".to_string())?;

    let title = lockup
        .pointer("/metadata/lockupMetadataViewModel/title/content")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| format!("video {} has no title", video_id))?;

    Ok(DiscoveredEpisode::new(title, video_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_videos_page_url() {
        assert_eq!(
            videos_page_url("https://www.youtube.com/@hubermanlab").unwrap().as_str(),
            "https://www.youtube.com/@hubermanlab/videos"
        );
        assert_eq!(
            videos_page_url("https://www.youtube.com/@hubermanlab/videos/?view=0").unwrap().as_str(),
            "https://www.youtube.com/@hubermanlab/videos"
        );
        assert!(matches!(
            videos_page_url("not a url"),
            Err(PodwiseError::Configuration(_))
        ));
    }

    #[test]
    fn test_channel_name() {
        let url = videos_page_url("https://www.youtube.com/@tferriss").unwrap();
        assert_eq!(channel_name(&url), "@tferriss");
    }

    #[test]
    fn test_parse_rendered_links() {
        let html = r#"<html><body>
            <ytd-rich-item-renderer><a id="video-title-link" title="Episode Three" href="https://www.youtube.com/watch?v=ccc333&amp;t=1s"></a></ytd-rich-item-renderer>
            <ytd-rich-item-renderer><a id="video-title-link" href="/watch?v=broken"></a></ytd-rich-item-renderer>
            <ytd-rich-item-renderer><a id="video-title-link" title="Episode One" href="/watch?v=aaa111"></a></ytd-rich-item-renderer>
            <ytd-rich-item-renderer><a id="video-title-link" title="Episode Zero" href="/watch?v=zzz000"></a></ytd-rich-item-renderer>
        </body></html>"#;

        let episodes = parse_channel_page(html, 3).unwrap();
        assert_eq!(
            episodes,
            vec![
                DiscoveredEpisode::new("Episode Three", "ccc333"),
                DiscoveredEpisode::new("Episode One", "aaa111"),
            ]
        );
    }

    #[test]
    fn test_parse_initial_data() {
        let html = r#"<script>var ytInitialData = {"contents":{"tabs":[{"content":{"richGridRenderer":{"contents":[
            {"richItemRenderer":{"content":{"videoRenderer":{"videoId":"id1","title":{"runs":[{"text":"First Episode"}]}}}}},
            {"richItemRenderer":{"content":{"videoRenderer":{"videoId":"id2","title":{"simpleText":"Second Episode"}}}}},
            {"richItemRenderer":{"content":{"lockupViewModel":{"contentId":"id3","contentType":"LOCKUP_CONTENT_TYPE_VIDEO","metadata":{"lockupMetadataViewModel":{"title":{"content":"Third Episode"}}}}}}},
            {"continuationItemRenderer":{}}
        ]}}}]}};</script>"#;

        let episodes = parse_channel_page(html, 10).unwrap();
        let ids: Vec<_> = episodes.iter().map(|e| e.external_id.as_str()).collect();
        assert_eq!(ids, vec!["id1", "id2", "id3"]);
        assert_eq!(episodes[1].title, "Second Episode");
    }

    #[test]
    fn test_missing_structure_is_discovery_fault() {
        let result = parse_channel_page("<html><body>consent required</body></html>", 5);
        assert!(matches!(result, Err(PodwiseError::Discovery(_))));
    }
}
