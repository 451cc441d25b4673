/// Ranking Module
///
/// Fuses content relevance and batch popularity into one hybrid score.
///
/// # Workflow
/// 1. Check every candidate carries both stage scores
/// 2. hybrid = 0.7 * content + 0.3 * popularity
/// 3. Stable sort descending, keep the first `top_n`
use crate::error::RankingError;
use crate::models::Candidate;
use tracing::debug;

/// Weight of semantic relevance in the hybrid score
pub const CONTENT_WEIGHT: f64 = 0.7;
/// Weight of batch popularity in the hybrid score
pub const POPULARITY_WEIGHT: f64 = 0.3;

pub type Result<T> = std::result::Result<T, RankingError>;

/// Hybrid Ranker - 混合打分排序
#[derive(Debug, Default, Clone, Copy)]
pub struct HybridRanker;

impl HybridRanker {
    pub fn new() -> Self {
        Self
    }

    pub fn hybrid_score(content_score: f64, popularity_score: f64) -> f64 {
        CONTENT_WEIGHT * content_score + POPULARITY_WEIGHT * popularity_score
    }

    /// Rank candidates by hybrid score.
    ///
    /// Every candidate must already carry `content_score` and
    /// `popularity_score`; otherwise nothing is ranked.
    pub fn rank(&self, mut candidates: Vec<Candidate>, top_n: usize) -> Result<Vec<Candidate>> {
        for candidate in &mut candidates {
            let content = candidate
                .content_score
                .ok_or_else(|| RankingError::IncompleteScores {
                    id: candidate.id.clone(),
                    missing: "content_score",
                })?;
            let popularity =
                candidate
                    .popularity_score
                    .ok_or_else(|| RankingError::IncompleteScores {
                        id: candidate.id.clone(),
                        missing: "popularity_score",
                    })?;
            candidate.hybrid_score = Some(Self::hybrid_score(content, popularity));
        }

        // sort_by is stable: exact ties keep retrieval order
        candidates.sort_by(|a, b| {
            let a = a.hybrid_score.unwrap_or(f64::NEG_INFINITY);
            let b = b.hybrid_score.unwrap_or(f64::NEG_INFINITY);
            b.total_cmp(&a)
        });
        candidates.truncate(top_n);

        debug!(
            returned = candidates.len(),
            top_score = candidates.first().and_then(|c| c.hybrid_score),
            "Hybrid ranking complete"
        );

        Ok(candidates)
    }
}
