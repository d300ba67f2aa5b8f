// HTTP API.
//
// Thin axum layer over the pipeline: handlers validate input, call into
// pipeline/ensemble code, and shape JSON. The model registry sits behind
// an RwLock'd Arc so reload can swap in a fresh registry without
// disturbing in-flight requests.

pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::advice::AdviceGenerator;
use crate::config::Config;
use crate::models::ModelRegistry;
use crate::news::NewsSource;

/// Shared application state.
///
/// `registry` is double-Arc'd on purpose: handlers clone the inner Arc
/// out of the lock and run against that snapshot, so a concurrent reload
/// never blocks or torments an in-flight analysis.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RwLock<Arc<ModelRegistry>>>,
    pub config: Config,
    pub news: Arc<dyn NewsSource>,
    pub advice: Arc<AdviceGenerator>,
}

impl AppState {
    pub fn new(config: Config, registry: ModelRegistry) -> Self {
        let news = config.news_source();
        let advice = Arc::new(config.advice_generator());
        Self {
            registry: Arc::new(RwLock::new(Arc::new(registry))),
            config,
            news,
            advice,
        }
    }

    /// Current registry snapshot.
    pub async fn registry(&self) -> Arc<ModelRegistry> {
        Arc::clone(&*self.registry.read().await)
    }
}

pub fn build_router(state: AppState) -> Router {
    let threats = Router::new()
        .route("/", get(handlers::threats::list))
        .route("/heatmap", get(handlers::heatmap::heatmap))
        .route("/analyze", post(handlers::threats::analyze))
        .route("/batch", get(handlers::threats::batch))
        .route("/advice", post(handlers::threats::advice));

    let models = Router::new()
        .route("/status", get(handlers::models::status))
        .route("/reload", post(handlers::models::reload))
        .route("/info", get(handlers::models::info))
        .route("/test", post(handlers::models::test));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .nest("/api/threats", threats)
        .nest("/api/models", models)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(state: AppState, bind: &str, port: u16) -> Result<()> {
    let addr: SocketAddr = format!("{bind}:{port}")
        .parse()
        .with_context(|| format!("Invalid bind address: {bind}:{port}"))?;

    let app = build_router(state);

    info!("Listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// Uniform error payload.
pub(crate) fn api_error(status: StatusCode, detail: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "detail": detail })))
}
