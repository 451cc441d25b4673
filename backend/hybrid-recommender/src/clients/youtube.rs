// ============================================
// YouTube Data API v3 client
// ============================================
// Backs both the search and the statistics collaborators. The API caps
// search pages and `videos.list` id batches at 50 entries.

use super::{VideoHit, VideoSearch, VideoStatistics};
use crate::config::YouTubeConfig;
use crate::error::ExternalServiceError;
use crate::models::VideoStats;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

const SERVICE: &str = "youtube-data-api";

/// Largest page / id batch the API accepts
pub const YOUTUBE_PAGE_LIMIT: usize = 50;

pub struct YouTubeClient {
    client: HttpClient,
    api_key: String,
    base_url: String,
    relevance_language: Option<String>,
}

impl YouTubeClient {
    pub fn new(client: HttpClient, config: &YouTubeConfig) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            relevance_language: config.relevance_language.clone(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, String)],
    ) -> Result<T, ExternalServiceError> {
        let url = format!("{}/{}", self.base_url, resource);

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|source| ExternalServiceError::Transport {
                service: SERVICE,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExternalServiceError::Status {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ExternalServiceError::Decode {
                service: SERVICE,
                message: e.to_string(),
            })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchResult>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct SearchResult {
    id: SearchResultId,
    snippet: Option<Snippet>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResultId {
    video_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    channel_title: Option<String>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Deserialize)]
struct Thumbnails {
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoResource>,
}

#[derive(Deserialize)]
struct VideoResource {
    id: String,
    statistics: Option<Statistics>,
}

/// Counters arrive as decimal strings; hidden like counts are simply absent.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
}

impl Statistics {
    fn into_stats(self) -> VideoStats {
        let defaults = VideoStats::default();
        VideoStats {
            views: parse_count(self.view_count).unwrap_or(defaults.views),
            likes: parse_count(self.like_count).unwrap_or(defaults.likes),
        }
    }
}

fn parse_count(raw: Option<String>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse().ok())
}

impl SearchResult {
    fn into_hit(self) -> Option<VideoHit> {
        let id = self.id.video_id?;
        let snippet = self.snippet?;
        let thumbnail_url = snippet
            .thumbnails
            .and_then(|t| t.medium.or(t.default))
            .map(|t| t.url);

        Some(VideoHit {
            id,
            title: snippet.title,
            description: snippet.description,
            channel_title: snippet.channel_title,
            thumbnail_url,
        })
    }
}

#[async_trait]
impl VideoSearch for YouTubeClient {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<VideoHit>, ExternalServiceError> {
        let mut hits: Vec<VideoHit> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut page_token: Option<String> = None;

        while hits.len() < max_results {
            let page_size = (max_results - hits.len()).min(YOUTUBE_PAGE_LIMIT);

            let mut params = vec![
                ("part", "snippet".to_string()),
                ("type", "video".to_string()),
                ("q", query.to_string()),
                ("maxResults", page_size.to_string()),
            ];
            if let Some(lang) = &self.relevance_language {
                params.push(("relevanceLanguage", lang.clone()));
            }
            if let Some(token) = &page_token {
                params.push(("pageToken", token.clone()));
            }

            let page: SearchListResponse = match self.get_json("search", &params).await {
                Ok(page) => page,
                // Later pages only extend what is already collected
                Err(e) if page_token.is_some() => {
                    warn!(collected = hits.len(), "Search page failed, keeping earlier pages: {}", e);
                    break;
                }
                Err(e) => return Err(e),
            };
            let page_len = page.items.len();
            let collected_before = hits.len();

            for hit in page.items.into_iter().filter_map(SearchResult::into_hit) {
                if hits.len() >= max_results {
                    break;
                }
                // Same video can show up on two pages
                if seen.insert(hit.id.clone()) {
                    hits.push(hit);
                }
            }

            debug!(
                page_len,
                collected = hits.len(),
                max_results,
                "Search page fetched"
            );

            // A page of only duplicates or non-video items ends the walk
            match page.next_page_token {
                Some(token) if hits.len() > collected_before => page_token = Some(token),
                _ => break,
            }
        }

        Ok(hits)
    }
}

#[async_trait]
impl VideoStatistics for YouTubeClient {
    async fn stats(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, VideoStats>, ExternalServiceError> {
        let mut result = HashMap::with_capacity(ids.len());
        let mut last_error = None;
        let mut chunks_ok = 0usize;

        for chunk in ids.chunks(YOUTUBE_PAGE_LIMIT) {
            let params = [
                ("part", "statistics".to_string()),
                ("id", chunk.join(",")),
            ];

            // A failed chunk leaves its ids absent; callers default them
            let response: VideoListResponse = match self.get_json("videos", &params).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(chunk_len = chunk.len(), "Statistics chunk failed: {}", e);
                    last_error = Some(e);
                    continue;
                }
            };
            chunks_ok += 1;

            for video in response.items {
                match video.statistics {
                    Some(statistics) => {
                        result.insert(video.id, statistics.into_stats());
                    }
                    None => {
                        warn!(video_id = %video.id, "Video returned without statistics");
                        result.insert(video.id, VideoStats::default());
                    }
                }
            }
        }

        match last_error {
            Some(e) if chunks_ok == 0 => Err(e),
            _ => Ok(result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, relevance_language: Option<&str>) -> YouTubeClient {
        let config = YouTubeConfig {
            api_key: "test-key".to_string(),
            base_url: format!("{}/", server.uri()),
            relevance_language: relevance_language.map(str::to_string),
        };
        YouTubeClient::new(HttpClient::new(), &config)
    }

    fn search_item(id: &str, title: &str) -> serde_json::Value {
        json!({
            "id": {"kind": "youtube#video", "videoId": id},
            "snippet": {
                "title": title,
                "description": format!("{} description", title),
                "channelTitle": "Channel",
                "thumbnails": {"medium": {"url": format!("https://i.ytimg.com/vi/{}/mqdefault.jpg", id)}}
            }
        })
    }

    #[tokio::test]
    async fn test_search_maps_snippets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "rust async"))
            .and(query_param("type", "video"))
            .and(query_param("maxResults", "2"))
            .and(query_param("relevanceLanguage", "en"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    search_item("v1", "Tokio basics"),
                    {"id": {"kind": "youtube#channel", "channelId": "c1"}, "snippet": {"title": "A channel"}},
                    search_item("v2", "Futures explained")
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("en"));
        let hits = client.search("rust async", 2).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "v1");
        assert_eq!(hits[0].description, "Tokio basics description");
        assert_eq!(hits[0].channel_title.as_deref(), Some("Channel"));
        assert_eq!(
            hits[1].thumbnail_url.as_deref(),
            Some("https://i.ytimg.com/vi/v2/mqdefault.jpg")
        );
    }

    #[tokio::test]
    async fn test_search_follows_page_tokens_and_dedups() {
        let server = MockServer::start().await;
        let first_page: Vec<_> = (0..50).map(|i| search_item(&format!("v{}", i), "first")).collect();

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("pageToken", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [search_item("v49", "repeat"), search_item("v50", "second"), search_item("v51", "second")]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("maxResults", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": first_page,
                "nextPageToken": "page-2"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let hits = client.search("anything", 100).await.unwrap();

        assert_eq!(hits.len(), 52);
        assert_eq!(hits[49].id, "v49");
        assert_eq!(hits[50].id, "v50");
        assert_eq!(hits[51].id, "v51");
    }

    #[tokio::test]
    async fn test_search_keeps_earlier_pages_when_later_page_fails() {
        let server = MockServer::start().await;
        let first_page: Vec<_> = (0..50).map(|i| search_item(&format!("v{}", i), "first")).collect();

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("pageToken", "page-2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": first_page,
                "nextPageToken": "page-2"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let hits = client.search("anything", 100).await.unwrap();

        assert_eq!(hits.len(), 50);
        assert_eq!(hits[0].id, "v0");
        assert_eq!(hits[49].id, "v49");
    }

    #[tokio::test]
    async fn test_search_stops_when_page_adds_nothing() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("pageToken", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [search_item("v1", "repeat")],
                "nextPageToken": "page-3"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("pageToken", "page-3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [search_item("v1", "first")],
                "nextPageToken": "page-2"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let hits = client.search("anything", 10).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "v1");
    }

    #[tokio::test]
    async fn test_search_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quotaExceeded"))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let result = client.search("anything", 10).await;

        assert!(matches!(
            result,
            Err(ExternalServiceError::Status { status: 403, .. })
        ));
    }

    #[tokio::test]
    async fn test_stats_parses_string_counts_and_defaults_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .and(query_param("part", "statistics"))
            .and(query_param("id", "v1,v2,v3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"id": "v1", "statistics": {"viewCount": "1200", "likeCount": "45"}},
                    {"id": "v2", "statistics": {"viewCount": "999"}}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let ids = vec!["v1".to_string(), "v2".to_string(), "v3".to_string()];
        let stats = client.stats(&ids).await.unwrap();

        assert_eq!(stats["v1"], VideoStats { views: 1200, likes: 45 });
        assert_eq!(stats["v2"], VideoStats { views: 999, likes: 1 });
        assert!(!stats.contains_key("v3"));
    }

    #[tokio::test]
    async fn test_stats_failed_chunk_only_drops_its_own_ids() {
        let server = MockServer::start().await;
        let ids: Vec<String> = (0..60).map(|i| format!("v{}", i)).collect();
        let first_chunk = ids[..50].join(",");

        Mock::given(method("GET"))
            .and(path("/videos"))
            .and(query_param("id", first_chunk.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"id": "v0", "statistics": {"viewCount": "500", "likeCount": "20"}}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let stats = client.stats(&ids).await.unwrap();

        assert_eq!(stats["v0"], VideoStats { views: 500, likes: 20 });
        assert!(!stats.contains_key("v55"));
    }

    #[tokio::test]
    async fn test_stats_error_when_every_chunk_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quotaExceeded"))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let ids = vec!["v1".to_string()];
        let result = client.stats(&ids).await;

        assert!(matches!(
            result,
            Err(ExternalServiceError::Status { status: 403, .. })
        ));
    }

    #[tokio::test]
    async fn test_stats_chunks_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let ids: Vec<String> = (0..60).map(|i| format!("v{}", i)).collect();
        let stats = client.stats(&ids).await.unwrap();

        assert!(stats.is_empty());
    }
}
