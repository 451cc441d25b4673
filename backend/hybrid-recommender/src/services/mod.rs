pub mod content;
pub mod pipeline;
pub mod popularity;
pub mod query_builder;
pub mod ranking;
pub mod retrieval;

pub use content::{filter_by_content, ContentSimilarityScorer, TfidfContentScorer};
pub use pipeline::RecommendationPipeline;
pub use popularity::PopularityNormalizer;
pub use query_builder::QueryBuilder;
pub use ranking::HybridRanker;
pub use retrieval::CandidateRetriever;
