pub mod heatmap;
pub mod models;
pub mod threats;

use axum::extract::State;
use axum::response::Json;
use chrono::Utc;
use serde_json::{json, Value};

use super::AppState;

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let registry = state.registry().await;
    Json(json!({
        "service": "SafeSpace API",
        "version": env!("CARGO_PKG_VERSION"),
        "ml_available": registry.any_loaded(),
        "models_loaded": registry.loaded_count(),
        "endpoints": {
            "threats": "/api/threats?city=<name>",
            "analyze": "/api/threats/analyze",
            "heatmap": "/api/threats/heatmap",
            "batch": "/api/threats/batch?cities=<a,b,c>",
            "advice": "/api/threats/advice",
            "models": "/api/models/status",
        },
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let registry = state.registry().await;
    Json(json!({
        "status": "healthy",
        "ml_available": registry.any_loaded(),
        "news_source": state.news.name(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
