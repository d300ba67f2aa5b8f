// Multi-model threat ensemble.
//
// predict_threat fuses three classifiers (threat, sentiment, context)
// into a single weighted score, then applies an aviation keyword boost
// and a two-part decision rule. Every model slot degrades independently
// to a deterministic keyword heuristic, so the ensemble produces a
// usable assessment with any subset of artifacts loaded — including
// none at all.

pub mod adapters;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::ModelRegistry;
use crate::text::{contains_any, normalize};

use adapters::AdapterOutput;

/// Fused score at or above this is a threat regardless of the threat
/// model's own class.
pub const THREAT_DECISION_THRESHOLD: f64 = 0.6;

/// Additive boost when aviation terms appear; domain-tuned for incident
/// reports that the general classifiers underweight.
pub const AVIATION_BOOST: f64 = 0.10;

const AVIATION_KEYWORDS: &[&str] = &[
    "flight", "aircraft", "aviation", "airline", "pilot", "crash", "airport",
];

/// One model's (or fallback's) verdict on a text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Binary class: 1 = threat (or positive sentiment), 0 otherwise.
    pub prediction: i64,
    pub confidence: f64,
    /// Emotion or polarity label, for models that produce one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// The full ensemble output for one text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatAssessment {
    pub is_threat: bool,
    /// Fused score in [0.0, 1.0].
    pub final_confidence: f64,
    /// The threat model's own binary class, before fusion.
    pub threat_prediction: i64,
    /// Convenience copies of the sentiment and context slots; clients
    /// read these without digging into `raw_predictions`.
    pub sentiment_analysis: Option<PredictionResult>,
    pub onnx_prediction: Option<PredictionResult>,
    /// Per-model results keyed "threat" / "sentiment" / "onnx".
    pub raw_predictions: BTreeMap<String, PredictionResult>,
    /// Which path produced each slot, e.g. "threat_classifier" or
    /// "fallback_threat".
    pub models_used: Vec<String>,
}

impl ThreatAssessment {
    /// The all-zero assessment returned for empty input.
    pub fn empty() -> Self {
        Self {
            is_threat: false,
            final_confidence: 0.0,
            threat_prediction: 0,
            sentiment_analysis: None,
            onnx_prediction: None,
            raw_predictions: BTreeMap::new(),
            models_used: Vec::new(),
        }
    }
}

/// Run the full ensemble over one text.
///
/// Pure with respect to the registry snapshot: the same text against the
/// same registry always yields the same assessment. CPU-bound; callers
/// on the async side wrap this in spawn_blocking.
pub fn predict_threat(registry: &ModelRegistry, text: &str) -> ThreatAssessment {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return ThreatAssessment::empty();
    }

    let mut assessment = ThreatAssessment::empty();
    let mut score = 0.0;

    let threat_out = match registry.threat() {
        Some(model) => adapters::threat(model, &normalized),
        None => adapters::threat_fallback(&normalized),
    };
    assessment.threat_prediction = threat_out.result.prediction;
    score += record(&mut assessment, "threat", threat_out);

    let sentiment_out = match registry.sentiment() {
        Some(model) => adapters::sentiment(model, &normalized),
        None => adapters::sentiment_fallback(&normalized),
    };
    assessment.sentiment_analysis = Some(sentiment_out.result.clone());
    score += record(&mut assessment, "sentiment", sentiment_out);

    let context_out = match registry.context() {
        Some(model) => adapters::context(model, &normalized),
        None => adapters::context_fallback(&normalized),
    };
    assessment.onnx_prediction = Some(context_out.result.clone());
    score += record(&mut assessment, "onnx", context_out);

    score = aviation_boost(&normalized, score);

    assessment.final_confidence = score.clamp(0.0, 1.0);
    assessment.is_threat =
        assessment.final_confidence >= THREAT_DECISION_THRESHOLD || assessment.threat_prediction == 1;

    debug!(
        is_threat = assessment.is_threat,
        confidence = assessment.final_confidence,
        models = ?assessment.models_used,
        "Ensemble prediction complete"
    );

    assessment
}

/// Run the ensemble over a batch of texts against one registry snapshot.
pub fn analyze_batch(registry: &ModelRegistry, texts: &[String]) -> Vec<ThreatAssessment> {
    texts.iter().map(|t| predict_threat(registry, t)).collect()
}

fn record(assessment: &mut ThreatAssessment, key: &str, out: AdapterOutput) -> f64 {
    assessment.models_used.push(out.source.to_string());
    assessment.raw_predictions.insert(key.to_string(), out.result);
    out.contribution
}

fn aviation_boost(normalized: &str, score: f64) -> f64 {
    if contains_any(normalized, AVIATION_KEYWORDS) {
        (score + AVIATION_BOOST).min(1.0)
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assess(text: &str) -> ThreatAssessment {
        predict_threat(&ModelRegistry::empty(), text)
    }

    #[test]
    fn empty_text_yields_empty_assessment() {
        for text in ["", "   ", "\t\n"] {
            let a = assess(text);
            assert!(!a.is_threat);
            assert_eq!(a.final_confidence, 0.0);
            assert!(a.raw_predictions.is_empty());
            assert!(a.models_used.is_empty());
        }
    }

    #[test]
    fn punctuation_only_text_is_empty_after_normalization() {
        // Normalization keeps .,!?- so this is not empty; a symbol-only
        // string is.
        let a = assess("@#$%^&*()");
        assert!(!a.is_threat);
        assert!(a.models_used.is_empty());
    }

    #[test]
    fn explosion_is_detected_without_any_models() {
        let a = assess("Breaking: major explosion reported downtown");
        assert!(a.is_threat);
        assert_eq!(a.threat_prediction, 1);
        assert_eq!(
            a.models_used,
            vec!["fallback_threat", "fallback_sentiment", "fallback_context"]
        );
        assert_eq!(a.raw_predictions.len(), 3);
        assert!(a.raw_predictions.contains_key("threat"));
        assert!(a.raw_predictions.contains_key("sentiment"));
        assert!(a.raw_predictions.contains_key("onnx"));
        assert_eq!(
            a.sentiment_analysis.as_ref(),
            a.raw_predictions.get("sentiment")
        );
        assert_eq!(a.onnx_prediction.as_ref(), a.raw_predictions.get("onnx"));
    }

    #[test]
    fn benign_text_is_not_a_threat() {
        let a = assess("Community garden opens with free workshops for families");
        assert!(!a.is_threat);
        assert_eq!(a.threat_prediction, 0);
        assert!(a.final_confidence < THREAT_DECISION_THRESHOLD);
    }

    #[test]
    fn confidence_is_always_in_unit_range() {
        let samples = [
            "fire attack violence emergency threat danger accident killed death",
            "pleasant weather expected this weekend",
            "flight crash at the airport, aviation emergency, pilot killed",
            "x",
        ];
        for text in samples {
            let a = assess(text);
            assert!(
                (0.0..=1.0).contains(&a.final_confidence),
                "confidence {} out of range for {text:?}",
                a.final_confidence
            );
        }
    }

    #[test]
    fn threat_prediction_overrides_low_fused_score() {
        // "theft" trips the threat fallback (contribution 0.4) but not the
        // sentiment or context fallbacks, so the fused score stays below
        // the 0.6 threshold. The OR rule still flags it.
        let a = assess("bicycle theft rises in the old town");
        assert_eq!(a.threat_prediction, 1);
        assert!(a.final_confidence < THREAT_DECISION_THRESHOLD);
        assert!(a.is_threat);
    }

    #[test]
    fn aviation_terms_add_fixed_boost() {
        let base = assess("routine market fire report");
        let boosted = assess("routine market fire report at the airport");
        assert!(
            (boosted.final_confidence - base.final_confidence - AVIATION_BOOST).abs() < 1e-9,
            "expected +{AVIATION_BOOST}, got {} vs {}",
            boosted.final_confidence,
            base.final_confidence
        );
    }

    #[test]
    fn aviation_boost_caps_at_one() {
        assert_eq!(aviation_boost("aircraft emergency", 0.95), 1.0);
        assert!((aviation_boost("aircraft emergency", 0.5) - 0.6).abs() < 1e-9);
        assert_eq!(aviation_boost("quiet afternoon", 0.95), 0.95);
    }

    #[test]
    fn prediction_is_idempotent() {
        let text = "Flood warnings issued after record rainfall; emergency crews deployed";
        let a = assess(text);
        let b = assess(text);
        assert_eq!(a.is_threat, b.is_threat);
        assert_eq!(a.final_confidence, b.final_confidence);
        assert_eq!(a.raw_predictions, b.raw_predictions);
        assert_eq!(a.models_used, b.models_used);
    }

    #[test]
    fn case_and_punctuation_do_not_change_the_verdict() {
        let a = assess("EXPLOSION downtown!!!");
        let b = assess("explosion downtown");
        assert_eq!(a.is_threat, b.is_threat);
        assert_eq!(a.threat_prediction, b.threat_prediction);
    }

    #[test]
    fn batch_matches_individual_calls() {
        let registry = ModelRegistry::empty();
        let texts = vec![
            "major explosion reported".to_string(),
            "farmers market this sunday".to_string(),
        ];
        let batch = analyze_batch(&registry, &texts);
        assert_eq!(batch.len(), 2);
        assert!(batch[0].is_threat);
        assert!(!batch[1].is_threat);
    }

    #[test]
    fn label_is_omitted_from_json_when_absent() {
        let a = assess("explosion downtown");
        let json = serde_json::to_value(&a.raw_predictions["threat"]).unwrap();
        assert!(json.get("label").is_none());
        let json = serde_json::to_value(&a.raw_predictions["sentiment"]).unwrap();
        assert_eq!(json["label"], "positive");
    }
}
