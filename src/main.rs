mod api;
mod config;
mod error;
mod models;
mod providers;
mod repository;
mod services;

use crate::api::AppState;
use crate::config::Config;
use crate::providers::{
    AnthropicClient, ChatProvider, EmbeddingProvider, OpenAiEmbeddings, Unconfigured,
};
use crate::repository::PgMusicRepository;
use crate::services::PlaylistGenerator;
use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,promptlist=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Connect to database
    let db = PgPoolOptions::new()
        .max_connections(50)
        .connect(&config.database_url)
        .await?;
    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations").run(&db).await?;
    tracing::info!("Database migrations completed");

    // Initialize services. Missing API keys degrade to the deterministic
    // fallbacks rather than preventing startup.
    let chat: Arc<dyn ChatProvider> = match config.anthropic_api_key.clone() {
        Some(key) => Arc::new(AnthropicClient::new(key)),
        None => {
            tracing::warn!("ANTHROPIC_API_KEY not set, model-assisted stages disabled");
            Arc::new(Unconfigured("Anthropic API"))
        }
    };
    let embeddings: Arc<dyn EmbeddingProvider> = match config.openai_api_key.clone() {
        Some(key) => Arc::new(OpenAiEmbeddings::new(key)),
        None => {
            tracing::warn!("OPENAI_API_KEY not set, semantic search disabled");
            Arc::new(Unconfigured("OpenAI API"))
        }
    };

    let repository = Arc::new(PgMusicRepository::new(db.clone()));
    let generator = Arc::new(PlaylistGenerator::new(repository, chat, embeddings));

    let app_state = Arc::new(AppState {
        generator,
        default_playlist_size: config.default_playlist_size,
    });

    // Build router
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);
    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    };

    let app = Router::new()
        .nest("/api/v1", api::playlist_routes().with_state(app_state))
        .layer(CompressionLayer::new())
        .layer(cors);

    // Start server
    let addr = format!("{}:{}", config.server_host, config.server_port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
