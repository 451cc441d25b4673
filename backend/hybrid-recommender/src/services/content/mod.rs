/// Content Similarity Module
///
/// Scores how close each candidate's text is to the source summary.
///
/// # Architecture
/// - **Scorer seam**: `ContentSimilarityScorer`, so the per-request TF-IDF
///   space can later be swapped for an incremental or embedding scorer
/// - **TF-IDF**: vector space rebuilt from scratch for every request over
///   {summary} ∪ {candidate texts}
mod tfidf;

pub use tfidf::{cosine_similarity, TermTokenizer, TfidfMatrix, TfidfVectorizer};

use crate::models::Candidate;
use tracing::debug;

pub trait ContentSimilarityScorer: Send + Sync {
    /// Sets `content_score` on every candidate, in [0, 1]
    fn score_content(&self, summary: &str, candidates: &mut [Candidate]);
}

/// Per-request TF-IDF scorer
pub struct TfidfContentScorer {
    max_features: usize,
}

impl TfidfContentScorer {
    pub fn new(max_features: usize) -> Self {
        Self { max_features }
    }
}

impl ContentSimilarityScorer for TfidfContentScorer {
    fn score_content(&self, summary: &str, candidates: &mut [Candidate]) {
        if candidates.is_empty() {
            return;
        }

        // Row 0 is the summary, row i + 1 is candidate i
        let corpus: Vec<&str> = std::iter::once(summary)
            .chain(candidates.iter().map(|c| c.full_content.as_str()))
            .collect();

        let matrix = TfidfVectorizer::new(self.max_features).fit_transform(&corpus);

        for (i, candidate) in candidates.iter_mut().enumerate() {
            candidate.content_score = Some(matrix.cosine(0, i + 1));
        }

        debug!(
            candidates = candidates.len(),
            vocabulary = matrix.vocabulary_size(),
            "Content scores computed"
        );
    }
}

/// Keep the `width` best candidates by content score.
///
/// Stable: equal scores keep retrieval order. Unscored candidates sort last.
pub fn filter_by_content(mut candidates: Vec<Candidate>, width: usize) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        let a = a.content_score.unwrap_or(f64::NEG_INFINITY);
        let b = b.content_score.unwrap_or(f64::NEG_INFINITY);
        b.total_cmp(&a)
    });
    candidates.truncate(width);
    candidates
}
