//! HTTP handlers for the hybrid recommender
//!
//! Thin layer over [`RecommendationPipeline`]: validates the request body,
//! resolves the default `top_n`, and serializes the response.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::services::RecommendationPipeline;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendPayload {
    pub summary: String,
    pub top_n: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Recommend videos for a text summary
pub async fn recommend(
    pipeline: web::Data<RecommendationPipeline>,
    payload: web::Json<RecommendPayload>,
) -> Result<HttpResponse> {
    let payload = payload.into_inner();
    let top_n = validate(&payload, &pipeline)?;

    tracing::info!(
        summary_len = payload.summary.len(),
        top_n,
        "Recommendation request"
    );

    let response = pipeline.recommend(&payload.summary, top_n).await?;

    Ok(HttpResponse::Ok().json(response))
}

fn validate(payload: &RecommendPayload, pipeline: &RecommendationPipeline) -> Result<usize> {
    if payload.summary.trim().is_empty() {
        return Err(AppError::ValidationError(
            "summary must not be empty".to_string(),
        ));
    }

    let config = pipeline.config();
    let top_n = payload.top_n.unwrap_or(config.default_top_n);
    if top_n == 0 || top_n > config.max_top_n {
        return Err(AppError::ValidationError(format!(
            "top_n must be between 1 and {}, got {}",
            config.max_top_n, top_n
        )));
    }

    Ok(top_n)
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health)).service(
        web::scope("/api/v1/recommendations").route("", web::post().to(recommend)),
    );
}
