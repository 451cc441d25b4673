/// External Collaborators
///
/// The recommendation pipeline consumes three outside capabilities:
/// - **Keyphrase extraction**: turns a summary into a few ranked phrases
/// - **Video search**: returns candidate videos for a text query
/// - **Video statistics**: returns view/like counters for video ids
///
/// Each is a trait so stages can be driven by the HTTP clients in
/// production and by mocks in tests.
mod keyphrase;
mod youtube;

use crate::error::ExternalServiceError;
use crate::models::VideoStats;
use async_trait::async_trait;
use std::collections::HashMap;

pub use keyphrase::HttpKeyphraseExtractor;
pub use youtube::{YouTubeClient, YOUTUBE_PAGE_LIMIT};

/// Knobs forwarded to the keyphrase extractor
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionOptions {
    pub max_phrases: usize,
    pub ngram_range: (usize, usize),
    /// 0 keeps the most relevant phrases, 1 favors maximally different ones
    pub diversity: f32,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            max_phrases: 3,
            ngram_range: (1, 2),
            diversity: 0.5,
        }
    }
}

/// Raw search hit from the video index
#[derive(Debug, Clone, PartialEq)]
pub struct VideoHit {
    pub id: String,
    pub title: String,
    pub description: String,
    pub channel_title: Option<String>,
    pub thumbnail_url: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyphraseExtractor: Send + Sync {
    /// Phrases ordered by relevance, at most `options.max_phrases`
    async fn extract(
        &self,
        text: &str,
        options: &ExtractionOptions,
    ) -> Result<Vec<String>, ExternalServiceError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// May return fewer than `max_results` hits, including none
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<VideoHit>, ExternalServiceError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoStatistics: Send + Sync {
    /// Ids unknown to the service are simply absent from the map
    async fn stats(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, VideoStats>, ExternalServiceError>;
}
