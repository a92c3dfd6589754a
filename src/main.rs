//! Ad generation orchestration core: a nine-agent LLM pipeline that turns a
//! text prompt and optional reference images into a stitched ad video.
//!
//! Router assembly follows the same shape as the teacher's `cinemaos-api`
//! `main.rs`: `tracing_subscriber` JSON logging, `axum::Router` with a CORS
//! and trace layer, a `PORT` env var bind.

mod agents;
mod auth;
mod config;
mod conversation;
mod coordinator;
mod db;
mod domain;
mod error;
mod orchestrator;
mod progress_bus;
mod providers;
mod retry;
mod routes;
mod stitcher;
mod synthesizer;

use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into())))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!("starting ad generation orchestration core");

    let config = config::Config::from_env()?;
    let state = AppState::new(config);

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/generate", post(routes::generate::submit_handler))
        .route("/api/generate/:id", get(routes::generate::get_generation_handler))
        .route("/api/generate/:id/stream", get(routes::stream::stream_handler))
        .route("/api/generate/:id/conversation", get(routes::conversation::conversation_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let port: u16 = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string()).parse()?;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Shared application state: the collaborators every route handler and the
/// Coordinator need, wired once at startup (mirrors the teacher's `AppState`
/// shape, generalized from concrete provider clients to collaborator trait
/// objects since the LLM/video providers and database are out of scope).
#[derive(Clone)]
pub struct AppState {
    pub coordinator: coordinator::Coordinator,
}

impl AppState {
    pub fn new(config: config::Config) -> Self {
        let progress_bus = progress_bus::ProgressBus::new(config.orchestration.subscriber_buffer_depth);
        let recorder = conversation::ConversationRecorder::new();
        let generation_store: Arc<dyn db::GenerationStore> = Arc::new(db::InMemoryGenerationStore::new());
        let object_store: Arc<dyn db::ObjectStore> = Arc::new(db::LocalObjectStore::new(config.scratch_base_dir.clone()));
        let llm: Arc<dyn providers::LlmClient> = Arc::new(providers::HttpLlmClient::new(
            config.llm_api_key.clone(),
            config.llm_endpoint.clone(),
            config.orchestration.llm_timeout,
        ));
        let video_client: Arc<dyn providers::VideoModelClient> = Arc::new(providers::HttpVideoModelClient::new(
            config.video_api_key.clone(),
            config.video_endpoint.clone(),
            config.orchestration.video_timeout,
        ));

        let coordinator = coordinator::Coordinator {
            config,
            progress_bus,
            recorder,
            generation_store,
            object_store,
            llm,
            video_client,
        };

        Self { coordinator }
    }
}
