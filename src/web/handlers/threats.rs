// Threat listing, single-text analysis, quick batch, and advice.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::ensemble::predict_threat;
use crate::pipeline;
use crate::rules::{categorize, resolve_level};

use super::super::{api_error, AppState};

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

fn default_limit() -> usize {
    20
}

fn default_page() -> usize {
    1
}

#[derive(Deserialize)]
pub struct ListParams {
    city: String,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default = "default_page")]
    page: usize,
}

/// GET /api/threats?city=...&limit=...&page=...
pub async fn list(State(state): State<AppState>, Query(params): Query<ListParams>) -> ApiResult {
    if params.city.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "City cannot be empty"));
    }
    let limit = params.limit.clamp(1, 50);
    let page = params.page.max(1);

    info!(city = %params.city, limit, page, "Threat listing requested");

    let registry = state.registry().await;
    let analysis = pipeline::analyze_city(
        &registry,
        state.news.as_ref(),
        &state.advice,
        params.city.trim(),
        limit,
        page,
    )
    .await;

    let mut body = serde_json::to_value(&analysis)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()))?;
    if let Some(obj) = body.as_object_mut() {
        obj.insert("ml_available".into(), json!(registry.any_loaded()));
        obj.insert("analysis_timestamp".into(), json!(Utc::now().to_rfc3339()));
    }
    Ok(Json(body))
}

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    text: String,
    #[serde(default)]
    city: Option<String>,
}

/// POST /api/threats/analyze
pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult {
    let text = request.text.trim().to_string();
    if text.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Text cannot be empty"));
    }

    let registry = state.registry().await;
    let snapshot = registry.clone();
    let input = text.clone();
    let assessment = tokio::task::spawn_blocking(move || predict_threat(&snapshot, &input))
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()))?;

    let (category, rule_level) = categorize(&text, "");
    let level = resolve_level(&assessment, rule_level);

    let advice = state
        .advice
        .generate(category, level, request.city.as_deref(), &text, "")
        .await;

    Ok(Json(json!({
        "is_threat": assessment.is_threat,
        "confidence": (assessment.final_confidence * 100.0).round() / 100.0,
        "category": category,
        "level": level,
        "ml_analysis": assessment,
        "safety_advice": advice.items,
        "ai_advice_used": advice.ai_generated,
    })))
}

#[derive(Deserialize)]
pub struct BatchParams {
    cities: String,
}

/// GET /api/threats/batch?cities=a,b,c
pub async fn batch(State(state): State<AppState>, Query(params): Query<BatchParams>) -> ApiResult {
    let cities: Vec<String> = params
        .cities
        .split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if cities.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "No cities provided"));
    }

    let registry = state.registry().await;
    let results = pipeline::quick_batch(&registry, state.news.as_ref(), &cities).await;

    Ok(Json(json!({
        "cities_analyzed": cities,
        "results": results,
        "ml_available": registry.any_loaded(),
        "analysis_timestamp": Utc::now().to_rfc3339(),
    })))
}

fn default_use_ai() -> bool {
    true
}

#[derive(Deserialize)]
pub struct AdviceRequest {
    text: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    city: Option<String>,
    #[serde(default = "default_use_ai")]
    use_ai: bool,
}

/// POST /api/threats/advice
pub async fn advice(
    State(state): State<AppState>,
    Json(request): Json<AdviceRequest>,
) -> ApiResult {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Text cannot be empty"));
    }

    let (category, level) = categorize(text, &request.description);

    // use_ai=false forces the static table even when an LLM is configured.
    let (items, ai_generated) = if request.use_ai {
        let advice = state
            .advice
            .generate(category, level, request.city.as_deref(), text, &request.description)
            .await;
        (advice.items, advice.ai_generated)
    } else {
        (
            crate::advice::fallback::static_advice(category, level, request.city.as_deref()),
            false,
        )
    };

    Ok(Json(json!({
        "text": text,
        "category": category,
        "level": level,
        "advice": items,
        "ai_generated": ai_generated,
        "generated_at": Utc::now().to_rfc3339(),
    })))
}
