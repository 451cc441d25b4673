use crate::clients::{ExtractionOptions, KeyphraseExtractor};
use crate::config::KeyphraseConfig;
use crate::utils::with_timeout;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Query Builder - 摘要轉搜尋關鍵詞
///
/// Asks the keyphrase extractor for a handful of diverse phrases and joins
/// them with single spaces. Zero phrases yields an empty query; the
/// retriever owns the fallback for that case.
pub struct QueryBuilder {
    extractor: Arc<dyn KeyphraseExtractor>,
    options: ExtractionOptions,
    timeout: Duration,
}

impl QueryBuilder {
    pub fn new(
        extractor: Arc<dyn KeyphraseExtractor>,
        options: ExtractionOptions,
        timeout: Duration,
    ) -> Self {
        Self {
            extractor,
            options,
            timeout,
        }
    }

    pub fn from_config(
        extractor: Arc<dyn KeyphraseExtractor>,
        config: &KeyphraseConfig,
        timeout: Duration,
    ) -> Self {
        let options = ExtractionOptions {
            max_phrases: config.max_phrases,
            ngram_range: config.ngram_range,
            diversity: config.diversity,
        };
        Self::new(extractor, options, timeout)
    }

    pub async fn build_query(&self, summary: &str) -> String {
        if summary.trim().is_empty() {
            return String::new();
        }

        let phrases = match with_timeout(
            self.timeout,
            self.extractor.extract(summary, &self.options),
        )
        .await
        {
            Ok(phrases) => phrases,
            Err(e) => {
                warn!("Keyphrase extraction failed, continuing with empty query: {}", e);
                Vec::new()
            }
        };

        let query = join_phrases(&phrases);
        debug!(query = %query, phrase_count = phrases.len(), "Search query built");
        query
    }
}

fn join_phrases(phrases: &[String]) -> String {
    phrases
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
