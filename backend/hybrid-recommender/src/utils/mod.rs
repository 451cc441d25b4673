// Utility functions for hybrid-recommender

use crate::error::ExternalServiceError;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

/// Normalize a score to [0, 1] range.
///
/// A zero-width range (all values tied) maps every value to exactly 0.
pub fn min_max_normalize(value: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    if range > 0.0 {
        ((value - min) / range).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// `log10(count + 1)`, compressing the right skew of engagement counts
pub fn log_compress(count: u64) -> f64 {
    (count as f64 + 1.0).log10()
}

/// Execute a fallible external call with a time budget.
///
/// An elapsed budget is reported as [`ExternalServiceError::Timeout`] so callers
/// handle it on the same path as any other collaborator failure.
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> Result<T, ExternalServiceError>
where
    F: Future<Output = Result<T, ExternalServiceError>>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(ExternalServiceError::Timeout(duration)),
    }
}
