use actix_web::{web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hybrid_recommender::clients::{HttpKeyphraseExtractor, YouTubeClient};
use hybrid_recommender::handlers;
use hybrid_recommender::{Config, RecommendationPipeline};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;

    info!(
        "Starting {} v{} on {}:{}",
        config.service.service_name,
        env!("CARGO_PKG_VERSION"),
        config.service.http_host,
        config.service.http_port
    );

    // Shared connection pool; per-call budgets are enforced by each stage
    let http_client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .build()
        .context("Failed to build HTTP client")?;

    let youtube = Arc::new(YouTubeClient::new(http_client.clone(), &config.youtube));
    let extractor = Arc::new(HttpKeyphraseExtractor::new(
        http_client,
        config.keyphrase.service_url.clone(),
    ));

    let pipeline = web::Data::new(RecommendationPipeline::from_config(
        &config,
        extractor,
        youtube.clone(),
        youtube,
    ));

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(pipeline.clone())
            .configure(handlers::configure_routes)
    });
    if let Some(workers) = config.service.http_workers {
        server = server.workers(workers);
    }

    server
        .bind((config.service.http_host.as_str(), config.service.http_port))
        .with_context(|| format!("Failed to bind port {}", config.service.http_port))?
        .run()
        .await?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}
