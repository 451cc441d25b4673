/// Recommendation Pipeline
///
/// Orchestrates one recommendation run:
/// 1. **Query**: summary → keyphrases → search query (fallback if empty)
/// 2. **Retrieval**: up to `retrieval_width` candidates from the video index
/// 3. **Content**: TF-IDF similarity to the summary, keep `content_filter_width`
/// 4. **Popularity**: batch-normalized views/likes
/// 5. **Ranking**: 0.7 content + 0.3 popularity, keep `top_n`
///
/// Collaborator failures degrade to empty or default data; only a broken
/// ranking precondition or a panicked scoring task surfaces as an error.
use crate::clients::{KeyphraseExtractor, VideoSearch, VideoStatistics};
use crate::config::{Config, PipelineConfig};
use crate::error::Result;
use crate::models::{
    Candidate, PipelineStats, Recommendation, RecommendationBatch, RecommendationQuery,
    RecommendationResponse, VideoStats,
};
use crate::services::content::{filter_by_content, ContentSimilarityScorer, TfidfContentScorer};
use crate::services::popularity::PopularityNormalizer;
use crate::services::query_builder::QueryBuilder;
use crate::services::ranking::HybridRanker;
use crate::services::retrieval::CandidateRetriever;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

pub struct RecommendationPipeline {
    query_builder: QueryBuilder,
    retriever: CandidateRetriever,
    content_scorer: Arc<dyn ContentSimilarityScorer>,
    popularity: PopularityNormalizer,
    ranker: HybridRanker,
    config: PipelineConfig,
}

impl RecommendationPipeline {
    pub fn new(
        query_builder: QueryBuilder,
        retriever: CandidateRetriever,
        content_scorer: Arc<dyn ContentSimilarityScorer>,
        popularity: PopularityNormalizer,
        config: PipelineConfig,
    ) -> Self {
        Self {
            query_builder,
            retriever,
            content_scorer,
            popularity,
            ranker: HybridRanker::new(),
            config,
        }
    }

    /// Wire every stage from configuration and the three collaborators
    pub fn from_config(
        config: &Config,
        extractor: Arc<dyn KeyphraseExtractor>,
        search: Arc<dyn VideoSearch>,
        statistics: Arc<dyn VideoStatistics>,
    ) -> Self {
        let pipeline = &config.pipeline;

        Self::new(
            QueryBuilder::from_config(extractor, &config.keyphrase, pipeline.keyphrase_timeout()),
            CandidateRetriever::new(
                search,
                pipeline.fallback_query.clone(),
                pipeline.search_timeout(),
            ),
            Arc::new(TfidfContentScorer::new(pipeline.max_vocabulary)),
            PopularityNormalizer::new(statistics, pipeline.stats_timeout()),
            pipeline.clone(),
        )
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Produce up to `top_n` ranked recommendations for a summary.
    ///
    /// An empty retrieval is a valid outcome and yields an empty list.
    pub async fn recommend(&self, summary: &str, top_n: usize) -> Result<RecommendationResponse> {
        let request_id = Uuid::new_v4();
        let span = info_span!("recommend", request_id = %request_id, top_n);

        self.run(request_id, summary, top_n).instrument(span).await
    }

    async fn run(
        &self,
        request_id: Uuid,
        summary: &str,
        top_n: usize,
    ) -> Result<RecommendationResponse> {
        let built_query = self.query_builder.build_query(summary).await;
        let resolved = self.retriever.resolve_query(&built_query);
        let request = RecommendationQuery {
            summary: summary.to_string(),
            query: resolved.text.clone(),
            top_n,
        };

        let retrieved = self
            .retriever
            .retrieve(&request.query, self.config.retrieval_width)
            .await;
        let mut stats = PipelineStats {
            retrieved: retrieved.len(),
            used_fallback_query: resolved.used_fallback,
            ..Default::default()
        };

        if retrieved.is_empty() || top_n == 0 {
            info!(query = %request.query, "No candidates to rank");
            return Ok(build_response(request_id, request, Vec::new(), stats));
        }

        let scored = self.score_content(&request.summary, retrieved).await?;
        let mut batch = RecommendationBatch::new(filter_by_content(
            scored,
            self.config.content_filter_width,
        ));
        stats.content_filtered = batch.len();

        self.popularity
            .score_popularity(&mut batch.candidates)
            .await;

        let ranked = self.ranker.rank(batch.into_candidates(), request.top_n)?;
        stats.returned = ranked.len();

        info!(
            query = %request.query,
            retrieved = stats.retrieved,
            content_filtered = stats.content_filtered,
            returned = stats.returned,
            used_fallback_query = stats.used_fallback_query,
            "Recommendation run complete"
        );

        Ok(build_response(request_id, request, ranked, stats))
    }

    /// TF-IDF is CPU-bound, so it runs off the async workers
    async fn score_content(&self, summary: &str, candidates: Vec<Candidate>) -> Result<Vec<Candidate>> {
        let scorer = Arc::clone(&self.content_scorer);
        let summary = summary.to_string();

        let scored = tokio::task::spawn_blocking(move || {
            let mut candidates = candidates;
            scorer.score_content(&summary, &mut candidates);
            candidates
        })
        .await?;

        Ok(scored)
    }
}

fn build_response(
    request_id: Uuid,
    request: RecommendationQuery,
    ranked: Vec<Candidate>,
    stats: PipelineStats,
) -> RecommendationResponse {
    RecommendationResponse {
        request_id,
        summary: request.summary,
        query: request.query,
        recommendations: ranked.into_iter().map(to_recommendation).collect(),
        stats,
        generated_at: Utc::now(),
    }
}

fn to_recommendation(candidate: Candidate) -> Recommendation {
    let defaults = VideoStats::default();
    let url = candidate.watch_url();

    Recommendation {
        url,
        id: candidate.id,
        title: candidate.title,
        channel_title: candidate.channel_title,
        thumbnail_url: candidate.thumbnail_url,
        views: candidate.raw_views.unwrap_or(defaults.views),
        likes: candidate.raw_likes.unwrap_or(defaults.likes),
        content_score: candidate.content_score.unwrap_or_default(),
        popularity_score: candidate.popularity_score.unwrap_or_default(),
        hybrid_score: candidate.hybrid_score.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{
        ExtractionOptions, MockKeyphraseExtractor, MockVideoSearch, MockVideoStatistics, VideoHit,
    };
    use crate::error::ExternalServiceError;
    use std::collections::HashMap;
    use std::time::Duration;

    fn hit(id: &str, title: &str, description: &str) -> VideoHit {
        VideoHit {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            channel_title: Some("Channel".to_string()),
            thumbnail_url: None,
        }
    }

    fn pipeline(
        extractor: MockKeyphraseExtractor,
        search: MockVideoSearch,
        statistics: MockVideoStatistics,
        config: PipelineConfig,
    ) -> RecommendationPipeline {
        let timeout = Duration::from_secs(1);
        RecommendationPipeline::new(
            QueryBuilder::new(Arc::new(extractor), ExtractionOptions::default(), timeout),
            CandidateRetriever::new(Arc::new(search), config.fallback_query.clone(), timeout),
            Arc::new(TfidfContentScorer::new(config.max_vocabulary)),
            PopularityNormalizer::new(Arc::new(statistics), timeout),
            config,
        )
    }

    #[tokio::test]
    async fn test_recommend_full_flow() {
        let mut extractor = MockKeyphraseExtractor::new();
        extractor
            .expect_extract()
            .returning(|_, _| Ok(vec!["rust".to_string(), "async runtime".to_string()]));

        let mut search = MockVideoSearch::new();
        search
            .expect_search()
            .withf(|query, max_results| query == "rust async runtime" && *max_results == 100)
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    hit("cooking", "Pasta dinner", "Quick pasta recipes for weeknights"),
                    hit("tokio", "Rust async runtime", "Tokio explained: rust async tasks"),
                    hit("futures", "Rust futures", "How async rust futures are polled"),
                ])
            });

        let mut statistics = MockVideoStatistics::new();
        statistics.expect_stats().returning(|_| {
            Ok(HashMap::from([
                ("tokio".to_string(), VideoStats { views: 100_000, likes: 5_000 }),
                ("futures".to_string(), VideoStats { views: 100, likes: 2 }),
                ("cooking".to_string(), VideoStats { views: 1_000_000, likes: 90_000 }),
            ]))
        });

        let config = PipelineConfig {
            content_filter_width: 2,
            ..Default::default()
        };
        let response = pipeline(extractor, search, statistics, config)
            .recommend("Rust async runtimes schedule tasks cooperatively", 5)
            .await
            .unwrap();

        assert_eq!(response.query, "rust async runtime");
        assert_eq!(
            response.stats,
            PipelineStats {
                retrieved: 3,
                content_filtered: 2,
                returned: 2,
                used_fallback_query: false,
            }
        );

        // The off-topic video is dropped by the content filter despite its views
        let ids: Vec<&str> = response.recommendations.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["tokio", "futures"]);

        let top = &response.recommendations[0];
        assert_eq!(top.url, "https://www.youtube.com/watch?v=tokio");
        assert_eq!(top.views, 100_000);
        assert!((top.popularity_score - 1.0).abs() < 1e-12);
        assert!(
            (top.hybrid_score - (0.7 * top.content_score + 0.3 * top.popularity_score)).abs()
                < 1e-12
        );
        assert!(response
            .recommendations
            .windows(2)
            .all(|w| w[0].hybrid_score >= w[1].hybrid_score));
    }

    #[tokio::test]
    async fn test_recommend_uses_fallback_query() {
        let mut extractor = MockKeyphraseExtractor::new();
        extractor
            .expect_extract()
            .returning(|_, _| Err(ExternalServiceError::Timeout(Duration::from_secs(15))));

        let mut search = MockVideoSearch::new();
        search
            .expect_search()
            .withf(|query, _| query == "educational tutorials")
            .times(1)
            .returning(|_, _| Ok(vec![hit("v1", "Intro tutorial", "Learn the basics")]));

        let mut statistics = MockVideoStatistics::new();
        statistics.expect_stats().returning(|_| Ok(HashMap::new()));

        let response = pipeline(extractor, search, statistics, PipelineConfig::default())
            .recommend("Some summary text", 5)
            .await
            .unwrap();

        assert!(response.stats.used_fallback_query);
        assert_eq!(response.query, "educational tutorials");
        assert_eq!(response.recommendations.len(), 1);

        // Single candidate: popularity range collapses to 0
        let only = &response.recommendations[0];
        assert_eq!(only.popularity_score, 0.0);
        assert!((only.hybrid_score - 0.7 * only.content_score).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_recommend_empty_search_returns_empty_list() {
        let mut extractor = MockKeyphraseExtractor::new();
        extractor
            .expect_extract()
            .returning(|_, _| Ok(vec!["obscure".to_string()]));

        let mut search = MockVideoSearch::new();
        search.expect_search().returning(|_, _| {
            Err(ExternalServiceError::Status {
                service: "youtube-data-api",
                status: 403,
                body: "quotaExceeded".to_string(),
            })
        });

        let mut statistics = MockVideoStatistics::new();
        statistics.expect_stats().never();

        let response = pipeline(extractor, search, statistics, PipelineConfig::default())
            .recommend("An obscure topic", 5)
            .await
            .unwrap();

        assert!(response.recommendations.is_empty());
        assert_eq!(response.stats.retrieved, 0);
        assert_eq!(response.stats.returned, 0);
    }

    #[tokio::test]
    async fn test_recommend_truncates_to_top_n() {
        let mut extractor = MockKeyphraseExtractor::new();
        extractor
            .expect_extract()
            .returning(|_, _| Ok(vec!["guitar".to_string()]));

        let mut search = MockVideoSearch::new();
        search.expect_search().returning(|_, max_results| {
            Ok((0..max_results)
                .map(|i| hit(&format!("v{}", i), "Guitar lesson", &format!("chords part {}", i)))
                .collect())
        });

        let mut statistics = MockVideoStatistics::new();
        statistics.expect_stats().returning(|ids| {
            Ok(ids
                .iter()
                .enumerate()
                .map(|(i, id)| {
                    (
                        id.clone(),
                        VideoStats {
                            views: (i as u64 + 1) * 10,
                            likes: i as u64,
                        },
                    )
                })
                .collect())
        });

        let response = pipeline(extractor, search, statistics, PipelineConfig::default())
            .recommend("Learning guitar chords", 3)
            .await
            .unwrap();

        assert_eq!(response.stats.retrieved, 100);
        assert_eq!(response.stats.content_filtered, 30);
        assert_eq!(response.recommendations.len(), 3);
        for rec in &response.recommendations {
            assert!((0.0..=1.0).contains(&rec.content_score));
            assert!((0.0..=1.0).contains(&rec.popularity_score));
        }
    }
}
