use super::{ExtractionOptions, KeyphraseExtractor};
use crate::error::ExternalServiceError;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SERVICE: &str = "keyphrase-service";

/// Keyphrase extraction over HTTP.
///
/// Talks to a KeyBERT-style sidecar: the request carries the text and the
/// selection knobs, the response lists phrases in relevance order.
pub struct HttpKeyphraseExtractor {
    client: HttpClient,
    endpoint: String,
}

impl HttpKeyphraseExtractor {
    pub fn new(client: HttpClient, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Serialize)]
struct ExtractRequest<'a> {
    text: &'a str,
    top_n: usize,
    keyphrase_ngram_range: [usize; 2],
    use_mmr: bool,
    diversity: f32,
}

#[derive(Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    keyphrases: Vec<ScoredPhrase>,
}

#[derive(Deserialize)]
struct ScoredPhrase {
    phrase: String,
}

#[async_trait]
impl KeyphraseExtractor for HttpKeyphraseExtractor {
    async fn extract(
        &self,
        text: &str,
        options: &ExtractionOptions,
    ) -> Result<Vec<String>, ExternalServiceError> {
        let request = ExtractRequest {
            text,
            top_n: options.max_phrases,
            keyphrase_ngram_range: [options.ngram_range.0, options.ngram_range.1],
            use_mmr: true,
            diversity: options.diversity,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
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

        let result: ExtractResponse =
            response
                .json()
                .await
                .map_err(|e| ExternalServiceError::Decode {
                    service: SERVICE,
                    message: e.to_string(),
                })?;

        let phrases: Vec<String> = result
            .keyphrases
            .into_iter()
            .map(|p| p.phrase.trim().to_string())
            .filter(|p| !p.is_empty())
            .take(options.max_phrases)
            .collect();

        debug!(phrase_count = phrases.len(), "Keyphrases extracted");

        Ok(phrases)
    }
}
