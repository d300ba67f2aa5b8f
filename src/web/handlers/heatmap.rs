// Multi-city heatmap endpoint.

use axum::extract::{Query, State};
use axum::response::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::pipeline;

use super::super::AppState;

const DEFAULT_CITIES: &str = "Delhi,Mumbai,Bangalore,Chennai,Kolkata,Hyderabad,Pune,Ahmedabad";

/// [longitude, latitude] per city; unknown cities default to Delhi so the
/// map always has somewhere to put the marker.
const CITY_COORDINATES: &[(&str, [f64; 2])] = &[
    ("Delhi", [77.2090, 28.6139]),
    ("Mumbai", [72.8777, 19.0760]),
    ("Bangalore", [77.5946, 12.9716]),
    ("Chennai", [80.2707, 13.0827]),
    ("Kolkata", [88.3639, 22.5726]),
    ("Hyderabad", [78.4867, 17.3850]),
    ("Pune", [73.8567, 18.5204]),
    ("Ahmedabad", [72.5714, 23.0225]),
    ("Jaipur", [75.7873, 26.9124]),
    ("Surat", [72.8311, 21.1702]),
];

fn coordinates(city: &str) -> [f64; 2] {
    CITY_COORDINATES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(city))
        .map(|(_, coords)| *coords)
        .unwrap_or(CITY_COORDINATES[0].1)
}

fn default_cities() -> String {
    DEFAULT_CITIES.to_string()
}

#[derive(Deserialize)]
pub struct HeatmapParams {
    #[serde(default = "default_cities")]
    cities: String,
}

/// GET /api/threats/heatmap?cities=a,b,c
pub async fn heatmap(
    State(state): State<AppState>,
    Query(params): Query<HeatmapParams>,
) -> Json<Value> {
    let cities: Vec<String> = params
        .cities
        .split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    let registry = state.registry().await;
    let summaries = pipeline::city_summaries(&registry, state.news.as_ref(), &cities).await;

    let now = Utc::now().to_rfc3339();
    let heatmap_data: Vec<Value> = summaries
        .iter()
        .enumerate()
        .map(|(i, (city, summary))| {
            json!({
                "id": i + 1,
                "city": city,
                "coordinates": coordinates(city),
                "threatLevel": summary.threat_level,
                "threatCount": summary.threat_count,
                "recentThreats": summary.recent_threats.iter().take(3).collect::<Vec<_>>(),
                "highRiskCount": summary.high_risk_count,
                "mediumRiskCount": summary.medium_risk_count,
                "lowRiskCount": summary.low_risk_count,
                "lastUpdated": now,
            })
        })
        .collect();

    Json(json!({
        "heatmap_data": heatmap_data,
        "total_cities": heatmap_data.len(),
        "ml_available": registry.any_loaded(),
        "generated_at": now,
    }))
}
