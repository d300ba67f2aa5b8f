// Model management endpoints: status, reload, info, and a canned
// self-test over the full ensemble.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::ensemble::{adapters, analyze_batch, AVIATION_BOOST};
use crate::models::ModelRegistry;

use super::super::{api_error, AppState};

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

/// GET /api/models/status
pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let registry = state.registry().await;
    let models = registry.status();

    Json(json!({
        "status": "success",
        "models": models,
        "summary": {
            "total_models": 3,
            "loaded_models": registry.loaded_count(),
            "overall_status": if registry.any_loaded() { "operational" } else { "limited" },
        },
    }))
}

/// POST /api/models/reload — build a fresh registry and swap it in.
pub async fn reload(State(state): State<AppState>) -> ApiResult {
    info!("Reloading models");
    let model_dir = state.config.model_dir.clone();

    let fresh = tokio::task::spawn_blocking(move || ModelRegistry::load_all(&model_dir))
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()))?;

    let loaded = fresh.loaded_count();
    *state.registry.write().await = Arc::new(fresh);

    let registry = state.registry().await;
    Ok(Json(json!({
        "status": "success",
        "message": format!("Reloaded {loaded} of 3 models"),
        "models_status": registry.status(),
    })))
}

/// GET /api/models/info
pub async fn info(State(state): State<AppState>) -> Json<Value> {
    let registry = state.registry().await;

    Json(json!({
        "status": "success",
        "models_info": {
            "threat_model": {
                "name": "Threat Detection Classifier",
                "file": "threat.onnx",
                "purpose": "Detects potential threats in text content",
                "loaded": registry.threat().is_some(),
            },
            "sentiment_model": {
                "name": "Sentiment Analysis Classifier",
                "file": "sentiment.onnx",
                "purpose": "Analyzes sentiment to enhance threat detection",
                "loaded": registry.sentiment().is_some(),
            },
            "context_model": {
                "name": "Context Classification Neural Network",
                "file": "context.onnx",
                "purpose": "Provides context understanding for better classification",
                "loaded": registry.context().is_some(),
            },
        },
        "ensemble_strategy": {
            "threat_weight": adapters::THREAT_WEIGHT,
            "onnx_weight": adapters::CONTEXT_WEIGHT,
            "sentiment_weight": adapters::SENTIMENT_WEIGHT,
            "aviation_boost": AVIATION_BOOST,
        },
    }))
}

const DEFAULT_TEST_CASES: &[&str] = &[
    "Flight crash investigation reveals safety concerns",
    "Beautiful sunny day perfect for outdoor activities",
    "Breaking: Major explosion reported downtown",
    "Stock market shows positive trends today",
    "Emergency services respond to violent incident",
];

#[derive(Deserialize, Default)]
pub struct TestRequest {
    #[serde(default)]
    texts: Vec<String>,
}

/// POST /api/models/test — run the ensemble over sample texts (or the
/// caller's own) and return annotated results.
pub async fn test(
    State(state): State<AppState>,
    body: Option<Json<TestRequest>>,
) -> ApiResult {
    let texts: Vec<String> = match body {
        Some(Json(req)) if !req.texts.is_empty() => req.texts,
        _ => DEFAULT_TEST_CASES.iter().map(|s| s.to_string()).collect(),
    };

    let registry = state.registry().await;
    let snapshot = registry.clone();
    let inputs = texts.clone();
    let assessments = tokio::task::spawn_blocking(move || analyze_batch(&snapshot, &inputs))
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()))?;

    let results: Vec<Value> = texts
        .iter()
        .zip(assessments.iter())
        .enumerate()
        .map(|(i, (text, assessment))| {
            json!({
                "test_case": i + 1,
                "text": text,
                "prediction": assessment,
                "interpretation": {
                    "is_threat": assessment.is_threat,
                    "confidence": format!("{:.2}%", assessment.final_confidence * 100.0),
                    "models_used": assessment.models_used,
                },
            })
        })
        .collect();

    Ok(Json(json!({
        "status": "success",
        "test_results": results,
        "models_available": registry.any_loaded(),
    })))
}
