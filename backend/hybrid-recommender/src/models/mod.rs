use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Watch URL prefix for candidate links
pub const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// One retrieved video under consideration.
///
/// Created by the retriever, enriched in place by the content scorer and the
/// popularity normalizer, consumed by the ranker. Score fields stay `None`
/// until their stage has run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub title: String,
    pub description: String,
    pub channel_title: Option<String>,
    pub thumbnail_url: Option<String>,
    /// `title + " " + description`, used for similarity scoring only
    pub full_content: String,
    pub raw_views: Option<u64>,
    pub raw_likes: Option<u64>,
    pub log_views: Option<f64>,
    pub log_likes: Option<f64>,
    pub content_score: Option<f64>,
    pub popularity_score: Option<f64>,
    pub hybrid_score: Option<f64>,
}

impl Candidate {
    pub fn new(id: impl Into<String>, title: impl Into<String>, description: impl Into<String>) -> Self {
        let title = title.into();
        let description = description.into();
        let full_content = format!("{} {}", title, description);

        Self {
            id: id.into(),
            title,
            description,
            channel_title: None,
            thumbnail_url: None,
            full_content,
            raw_views: None,
            raw_likes: None,
            log_views: None,
            log_likes: None,
            content_score: None,
            popularity_score: None,
            hybrid_score: None,
        }
    }

    pub fn with_channel_title(mut self, channel_title: Option<String>) -> Self {
        self.channel_title = channel_title;
        self
    }

    pub fn with_thumbnail_url(mut self, thumbnail_url: Option<String>) -> Self {
        self.thumbnail_url = thumbnail_url;
        self
    }

    pub fn watch_url(&self) -> String {
        format!("{}{}", WATCH_URL_PREFIX, self.id)
    }
}

/// Engagement counters for one video, as reported by the statistics service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoStats {
    pub views: u64,
    pub likes: u64,
}

impl Default for VideoStats {
    /// Missing statistics count as one view and one like so the log
    /// transform stays defined.
    fn default() -> Self {
        Self { views: 1, likes: 1 }
    }
}

/// Input envelope for one recommendation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationQuery {
    pub summary: String,
    pub query: String,
    pub top_n: usize,
}

/// Working set of candidates for one invocation.
///
/// Popularity is normalized relative to this batch only, so the same video
/// can score differently in two batches.
#[derive(Debug, Clone, Default)]
pub struct RecommendationBatch {
    pub candidates: Vec<Candidate>,
}

impl RecommendationBatch {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self { candidates }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.id.clone()).collect()
    }

    pub fn into_candidates(self) -> Vec<Candidate> {
        self.candidates
    }
}

/// One ranked video in the response payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub id: String,
    pub title: String,
    pub url: String,
    pub channel_title: Option<String>,
    pub thumbnail_url: Option<String>,
    pub views: u64,
    pub likes: u64,
    pub content_score: f64,
    pub popularity_score: f64,
    pub hybrid_score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineStats {
    pub retrieved: usize,
    pub content_filtered: usize,
    pub returned: usize,
    pub used_fallback_query: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub request_id: Uuid,
    pub summary: String,
    pub query: String,
    pub recommendations: Vec<Recommendation>,
    pub stats: PipelineStats,
    pub generated_at: DateTime<Utc>,
}
