use crate::clients::{VideoHit, VideoSearch};
use crate::models::Candidate;
use crate::utils::with_timeout;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Query actually sent to the video index
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuery {
    pub text: String,
    pub used_fallback: bool,
}

/// Candidate Retriever - 召回候選影片
///
/// One bounded search against the video index. An empty query is replaced by
/// the configured fallback; any search failure degrades to an empty batch.
pub struct CandidateRetriever {
    search: Arc<dyn VideoSearch>,
    fallback_query: String,
    timeout: Duration,
}

impl CandidateRetriever {
    pub fn new(search: Arc<dyn VideoSearch>, fallback_query: impl Into<String>, timeout: Duration) -> Self {
        Self {
            search,
            fallback_query: fallback_query.into(),
            timeout,
        }
    }

    pub fn resolve_query(&self, query: &str) -> ResolvedQuery {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            ResolvedQuery {
                text: self.fallback_query.clone(),
                used_fallback: true,
            }
        } else {
            ResolvedQuery {
                text: trimmed.to_string(),
                used_fallback: false,
            }
        }
    }

    pub async fn retrieve(&self, query: &str, max_results: usize) -> Vec<Candidate> {
        if max_results == 0 {
            return Vec::new();
        }

        let resolved = self.resolve_query(query);
        if resolved.used_fallback {
            info!(fallback = %resolved.text, "Empty search query, using fallback");
        }

        let hits = match with_timeout(self.timeout, self.search.search(&resolved.text, max_results)).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(query = %resolved.text, "Video search failed: {}", e);
                return Vec::new();
            }
        };

        let candidates = deduplicate(hits, max_results);

        info!(
            query = %resolved.text,
            max_results,
            retrieved = candidates.len(),
            "Retrieval completed"
        );

        candidates
    }
}

/// Drop repeated ids (first occurrence wins) and cap the batch size
fn deduplicate(hits: Vec<VideoHit>, max_results: usize) -> Vec<Candidate> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique: Vec<Candidate> = Vec::new();

    for hit in hits {
        if unique.len() >= max_results {
            break;
        }
        if seen.insert(hit.id.clone()) {
            unique.push(
                Candidate::new(hit.id, hit.title, hit.description)
                    .with_channel_title(hit.channel_title)
                    .with_thumbnail_url(hit.thumbnail_url),
            );
        }
    }

    unique
}
