use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("Failed to read pipeline settings: {0}")]
    Pipeline(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub service: ServiceConfig,
    pub youtube: YouTubeConfig,
    pub keyphrase: KeyphraseConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub service_name: String,
    pub http_host: String,
    pub http_port: u16,
    pub http_workers: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    pub api_key: String,
    pub base_url: String,
    /// Passed as `relevanceLanguage` on search calls when set
    pub relevance_language: Option<String>,
}

#[derive(Debug, Clone)]
pub struct KeyphraseConfig {
    pub service_url: String,
    pub max_phrases: usize,
    pub ngram_range: (usize, usize),
    pub diversity: f32,
}

/// Stage widths and per-call budgets for one recommendation run.
///
/// `retrieval_width`, `content_filter_width` and `default_top_n` are the
/// three narrowing steps of the pipeline: how many videos are pulled from
/// search, how many survive the content filter, and how many are returned.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_retrieval_width")]
    pub retrieval_width: usize,
    #[serde(default = "default_content_filter_width")]
    pub content_filter_width: usize,
    #[serde(default = "default_top_n")]
    pub default_top_n: usize,
    #[serde(default = "default_max_top_n")]
    pub max_top_n: usize,
    #[serde(default = "default_max_vocabulary")]
    pub max_vocabulary: usize,
    #[serde(default = "default_fallback_query")]
    pub fallback_query: String,
    #[serde(default = "default_search_timeout_ms")]
    pub search_timeout_ms: u64,
    #[serde(default = "default_stats_timeout_ms")]
    pub stats_timeout_ms: u64,
    #[serde(default = "default_keyphrase_timeout_ms")]
    pub keyphrase_timeout_ms: u64,
}

fn default_retrieval_width() -> usize {
    100
}

fn default_content_filter_width() -> usize {
    30
}

fn default_top_n() -> usize {
    5
}

fn default_max_top_n() -> usize {
    50
}

fn default_max_vocabulary() -> usize {
    1000
}

fn default_fallback_query() -> String {
    "educational tutorials".to_string()
}

fn default_search_timeout_ms() -> u64 {
    10_000
}

fn default_stats_timeout_ms() -> u64 {
    10_000
}

fn default_keyphrase_timeout_ms() -> u64 {
    15_000
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retrieval_width: default_retrieval_width(),
            content_filter_width: default_content_filter_width(),
            default_top_n: default_top_n(),
            max_top_n: default_max_top_n(),
            max_vocabulary: default_max_vocabulary(),
            fallback_query: default_fallback_query(),
            search_timeout_ms: default_search_timeout_ms(),
            stats_timeout_ms: default_stats_timeout_ms(),
            keyphrase_timeout_ms: default_keyphrase_timeout_ms(),
        }
    }
}

impl PipelineConfig {
    pub fn search_timeout(&self) -> Duration {
        Duration::from_millis(self.search_timeout_ms)
    }

    pub fn stats_timeout(&self) -> Duration {
        Duration::from_millis(self.stats_timeout_ms)
    }

    pub fn keyphrase_timeout(&self) -> Duration {
        Duration::from_millis(self.keyphrase_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retrieval_width == 0 {
            return Err(ConfigError::Validation(
                "retrieval_width must be at least 1".to_string(),
            ));
        }
        if self.content_filter_width == 0 {
            return Err(ConfigError::Validation(
                "content_filter_width must be at least 1".to_string(),
            ));
        }
        if self.default_top_n == 0 || self.default_top_n > self.max_top_n {
            return Err(ConfigError::Validation(format!(
                "default_top_n must be within 1..={}, got {}",
                self.max_top_n, self.default_top_n
            )));
        }
        if self.max_vocabulary == 0 {
            return Err(ConfigError::Validation(
                "max_vocabulary must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl KeyphraseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ConfigError::Validation(format!(
                "keyphrase ngram range must satisfy 1 <= min <= max, got ({}, {})",
                min_n, max_n
            )));
        }
        if !(0.0..=1.0).contains(&self.diversity) {
            return Err(ConfigError::Validation(format!(
                "keyphrase diversity must be within [0, 1], got {}",
                self.diversity
            )));
        }
        if self.max_phrases == 0 {
            return Err(ConfigError::Validation(
                "keyphrase max_phrases must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Config {
            service: ServiceConfig {
                service_name: env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "hybrid-recommender".to_string()),
                http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                http_port: parse_var("HTTP_PORT", 8000)?,
                http_workers: parse_optional_var("HTTP_WORKERS")?,
            },
            youtube: YouTubeConfig {
                api_key: env::var("YOUTUBE_API_KEY")
                    .map_err(|_| ConfigError::Missing("YOUTUBE_API_KEY"))?,
                base_url: env::var("YOUTUBE_API_BASE_URL")
                    .unwrap_or_else(|_| "https://www.googleapis.com/youtube/v3".to_string()),
                relevance_language: env::var("YOUTUBE_RELEVANCE_LANGUAGE")
                    .ok()
                    .filter(|lang| !lang.trim().is_empty()),
            },
            keyphrase: KeyphraseConfig {
                service_url: env::var("KEYPHRASE_SERVICE_URL")
                    .unwrap_or_else(|_| "http://localhost:8090/extract".to_string()),
                max_phrases: parse_var("KEYPHRASE_MAX_PHRASES", 3)?,
                ngram_range: (
                    parse_var("KEYPHRASE_NGRAM_MIN", 1)?,
                    parse_var("KEYPHRASE_NGRAM_MAX", 2)?,
                ),
                diversity: parse_var("KEYPHRASE_DIVERSITY", 0.5)?,
            },
            pipeline: envy::prefixed("PIPELINE_").from_env::<PipelineConfig>()?,
        };

        config.keyphrase.validate()?;
        config.pipeline.validate()?;

        Ok(config)
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

fn parse_optional_var<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(None),
    }
}
