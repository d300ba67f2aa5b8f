// Wire types — the shapes returned to clients.
//
// Field names are part of the API contract with existing clients
// (the dashboard renders `publishedAt`, `ml_analysis`, `safety_advice`
// etc. verbatim), so serde renames are deliberate and load-bearing.

use serde::{Deserialize, Serialize};

use crate::ensemble::{PredictionResult, ThreatAssessment};
use crate::rules::ThreatLevel;
use crate::text::stable_hash;

/// A news article as fetched from the news source. Read-only to the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub source: String,
    #[serde(rename = "publishedAt", default)]
    pub published_at: String,
}

/// One fully analyzed article — the unit returned to clients.
/// Created fresh per request, never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub source: String,
    #[serde(rename = "publishedAt")]
    pub published_at: String,
    pub category: String,
    pub level: ThreatLevel,
    /// Rounded to two decimals for display; the raw value lives in `ml_analysis`.
    pub confidence: f64,
    pub ml_detected: bool,
    pub ml_analysis: MlSummary,
    pub safety_advice: Vec<String>,
    pub ai_advice_used: bool,
    pub advice_source: String,
}

/// The slice of a ThreatAssessment embedded in each ThreatRecord.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlSummary {
    pub confidence: f64,
    pub threat_prediction: i64,
    pub sentiment_analysis: Option<PredictionResult>,
    pub models_used: Vec<String>,
}

impl MlSummary {
    pub fn from_assessment(assessment: &ThreatAssessment) -> Self {
        Self {
            confidence: assessment.final_confidence,
            threat_prediction: assessment.threat_prediction,
            sentiment_analysis: assessment.sentiment_analysis.clone(),
            models_used: assessment.models_used.clone(),
        }
    }
}

/// Aggregate threat counts for one city, recomputed per heatmap request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityThreatSummary {
    pub threat_level: ThreatLevel,
    pub threat_count: usize,
    pub recent_threats: Vec<String>,
    pub high_risk_count: u32,
    pub medium_risk_count: u32,
    pub low_risk_count: u32,
}

impl CityThreatSummary {
    /// Summary for a city with no analyzable articles.
    pub fn empty() -> Self {
        Self {
            threat_level: ThreatLevel::Low,
            threat_count: 0,
            recent_threats: Vec::new(),
            high_risk_count: 0,
            medium_risk_count: 0,
            low_risk_count: 0,
        }
    }
}

/// Deterministic record id derived from the article's url and title.
///
/// The original backend minted a random UUID per record, which made
/// repeated analyses of the same article impossible to correlate (and
/// untestable). A content hash keeps ids stable across requests.
pub fn record_id(article: &Article) -> String {
    format!("{:016x}", stable_hash(&format!("{}|{}", article.url, article.title)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, url: &str) -> Article {
        Article {
            title: title.to_string(),
            description: String::new(),
            url: url.to_string(),
            source: "Test Wire".to_string(),
            published_at: "2025-07-15T10:00:00Z".to_string(),
        }
    }

    #[test]
    fn record_id_is_stable_and_content_addressed() {
        let a = article("Fire downtown", "https://example.com/1");
        let b = article("Fire downtown", "https://example.com/1");
        let c = article("Fire downtown", "https://example.com/2");
        assert_eq!(record_id(&a), record_id(&b));
        assert_ne!(record_id(&a), record_id(&c));
        assert_eq!(record_id(&a).len(), 16);
    }

    #[test]
    fn article_deserializes_newsapi_field_names() {
        let json = r#"{"title":"t","description":"d","url":"u","source":"s","publishedAt":"2025-01-01T00:00:00Z"}"#;
        let a: Article = serde_json::from_str(json).unwrap();
        assert_eq!(a.published_at, "2025-01-01T00:00:00Z");
    }
}
