use crate::clients::VideoStatistics;
use crate::models::{Candidate, VideoStats};
use crate::utils::{log_compress, min_max_normalize, with_timeout};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Popularity Normalizer - 熱度分數
///
/// Turns raw view/like counts into a batch-local score in [0, 1]:
/// log10(count + 1), then min-max over the current batch per dimension,
/// then the mean of the two dimensions.
pub struct PopularityNormalizer {
    statistics: Arc<dyn VideoStatistics>,
    timeout: Duration,
}

impl PopularityNormalizer {
    pub fn new(statistics: Arc<dyn VideoStatistics>, timeout: Duration) -> Self {
        Self {
            statistics,
            timeout,
        }
    }

    pub async fn score_popularity(&self, candidates: &mut [Candidate]) {
        if candidates.is_empty() {
            return;
        }

        let ids: Vec<String> = candidates.iter().map(|c| c.id.clone()).collect();
        let stats = match with_timeout(self.timeout, self.statistics.stats(&ids)).await {
            Ok(stats) => stats,
            Err(e) => {
                warn!(
                    candidates = ids.len(),
                    "Statistics fetch failed, using default counts: {}", e
                );
                HashMap::new()
            }
        };

        apply_popularity(candidates, &stats);
    }
}

/// Fill raw counts, log counts and `popularity_score` from fetched stats.
///
/// Candidates absent from `stats` count as one view and one like.
pub fn apply_popularity(candidates: &mut [Candidate], stats: &HashMap<String, VideoStats>) {
    if candidates.is_empty() {
        return;
    }

    let mut missing = 0usize;
    for candidate in candidates.iter_mut() {
        let counts = match stats.get(&candidate.id) {
            Some(counts) => *counts,
            None => {
                missing += 1;
                VideoStats::default()
            }
        };
        candidate.raw_views = Some(counts.views);
        candidate.raw_likes = Some(counts.likes);
        candidate.log_views = Some(log_compress(counts.views));
        candidate.log_likes = Some(log_compress(counts.likes));
    }

    let log_views: Vec<f64> = candidates.iter().filter_map(|c| c.log_views).collect();
    let log_likes: Vec<f64> = candidates.iter().filter_map(|c| c.log_likes).collect();
    let view_scores = normalize_batch(&log_views);
    let like_scores = normalize_batch(&log_likes);

    for ((candidate, view_score), like_score) in candidates
        .iter_mut()
        .zip(view_scores)
        .zip(like_scores)
    {
        candidate.popularity_score = Some((view_score + like_score) / 2.0);
    }

    debug!(
        candidates = candidates.len(),
        missing_stats = missing,
        "Popularity scores computed"
    );
}

/// Min-max scale a batch; a tied batch scores 0 across the board
pub fn normalize_batch(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    values
        .iter()
        .map(|&value| min_max_normalize(value, min, max))
        .collect()
}
