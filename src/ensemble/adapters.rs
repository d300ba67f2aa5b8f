// Prediction adapters — one per model kind.
//
// Each adapter turns a model's raw tensors into a PredictionOutcome
// (explicit decoding, no runtime type sniffing), then into a
// (prediction, confidence) pair plus its weighted contribution to the
// fused score. Any failure inside a model run is caught here and
// replaced with a deterministic keyword heuristic, so the ensemble
// never hard-fails on a bad artifact.

use tracing::warn;

use crate::models::{OnnxModel, RawOutput, TensorData};
use crate::text::{contains_any, count_matches};

use super::PredictionResult;

/// Fusion weights. Fixed — they were chosen against the training data,
/// not tunable per call.
pub const THREAT_WEIGHT: f64 = 0.5;
pub const SENTIMENT_WEIGHT: f64 = 0.2;
pub const CONTEXT_WEIGHT: f64 = 0.3;

/// Threat keywords, shared by the threat adapter fallback and the news
/// query builder.
pub const THREAT_KEYWORDS: &[&str] = &[
    "attack", "violence", "theft", "shooting", "assault", "kidnap", "fire", "riot", "accident",
    "flood", "earthquake", "crime", "explosion", "terrorism", "threat", "danger", "emergency",
    "killed", "death",
];

/// Words the sentiment fallback treats as negative signal.
const NEGATIVE_WORDS: &[&str] = &[
    "attack", "violence", "death", "killed", "emergency", "fire", "accident", "threat",
];

/// Keywords the context fallback scores density against.
const CONTEXT_KEYWORDS: &[&str] = &[
    "emergency", "attack", "violence", "fire", "accident", "threat", "danger",
];

/// Emotion label order for sentiment artifacts that output a 6-class
/// probability vector (dair-ai/emotion export convention).
const EMOTION_LABELS: [&str; 6] = ["sadness", "joy", "love", "anger", "fear", "surprise"];

const NEGATIVE_EMOTIONS: &[&str] = &["fear", "anger", "sadness", "disgust"];
const POSITIVE_EMOTIONS: &[&str] = &["joy", "surprise", "love", "happiness"];

/// Context fallback: keyword density above this is called a threat.
const CONTEXT_FALLBACK_THRESHOLD: f64 = 0.3;

/// A model's decoded output, before mapping to a binary prediction.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutcome {
    /// A class label, with the max class probability when the artifact
    /// exposes a probability output.
    Scalar { class: i64, prob: Option<f64> },
    /// A multi-class probability vector.
    Vector(Vec<f32>),
    /// A labeled score (emotion classifiers).
    Labeled { label: &'static str, score: f64 },
}

/// One adapter's verdict: the per-model result, its weighted contribution
/// to the fused confidence, and which path produced it.
#[derive(Debug, Clone)]
pub struct AdapterOutput {
    pub result: PredictionResult,
    pub contribution: f64,
    pub source: &'static str,
}

// ---------------------------------------------------------------------
// Threat adapter
// ---------------------------------------------------------------------

pub fn threat(model: &OnnxModel, text: &str) -> AdapterOutput {
    match model.run(text) {
        Ok(raw) => {
            let outcome = decode_scalar(&raw);
            let PredictionOutcome::Scalar { class, prob } = outcome else {
                unreachable!("decode_scalar only yields Scalar");
            };
            let confidence = prob.unwrap_or(if class == 1 { 0.8 } else { 0.2 });
            AdapterOutput {
                result: PredictionResult {
                    prediction: class,
                    confidence,
                    label: None,
                },
                contribution: confidence * THREAT_WEIGHT,
                source: "threat_classifier",
            }
        }
        Err(e) => {
            warn!(error = %e, "Threat model prediction failed, using keyword fallback");
            threat_fallback(text)
        }
    }
}

/// Deterministic keyword heuristic used when the threat model is absent
/// or erroring.
pub fn threat_fallback(text: &str) -> AdapterOutput {
    let prediction = i64::from(contains_any(text, THREAT_KEYWORDS));
    let confidence = if prediction == 1 { 0.8 } else { 0.2 };
    AdapterOutput {
        result: PredictionResult {
            prediction,
            confidence,
            label: None,
        },
        contribution: confidence * THREAT_WEIGHT,
        source: "fallback_threat",
    }
}

// ---------------------------------------------------------------------
// Sentiment adapter
// ---------------------------------------------------------------------

pub fn sentiment(model: &OnnxModel, text: &str) -> AdapterOutput {
    match model.run(text) {
        Ok(raw) => sentiment_from_outcome(decode_sentiment(&raw)),
        Err(e) => {
            warn!(error = %e, "Sentiment model prediction failed, using keyword fallback");
            sentiment_fallback(text)
        }
    }
}

fn sentiment_from_outcome(outcome: PredictionOutcome) -> AdapterOutput {
    let (prediction, confidence, label) = match outcome {
        PredictionOutcome::Labeled { label, score } => {
            let prediction = if NEGATIVE_EMOTIONS.contains(&label) {
                0
            } else if POSITIVE_EMOTIONS.contains(&label) {
                1
            } else {
                i64::from(score >= 0.5)
            };
            (prediction, score, label.to_string())
        }
        PredictionOutcome::Scalar { class, prob } => {
            // Negative sentiment is the stronger threat signal, hence the
            // asymmetric default confidences.
            let confidence = prob.unwrap_or(if class == 0 { 0.7 } else { 0.3 });
            let label = if class == 0 { "negative" } else { "positive" };
            (class, confidence, label.to_string())
        }
        PredictionOutcome::Vector(probs) => {
            let (class, max) = argmax(&probs);
            let label = if class == 0 { "negative" } else { "positive" };
            (class.min(1), max, label.to_string())
        }
    };

    AdapterOutput {
        result: PredictionResult {
            prediction,
            confidence,
            label: Some(label),
        },
        // Negative sentiment raises the threat score; positive contributes nothing.
        contribution: (1 - prediction) as f64 * confidence * SENTIMENT_WEIGHT,
        source: "sentiment_classifier",
    }
}

pub fn sentiment_fallback(text: &str) -> AdapterOutput {
    let prediction = i64::from(!contains_any(text, NEGATIVE_WORDS));
    let confidence = 0.6;
    let label = if prediction == 0 { "negative" } else { "positive" };
    AdapterOutput {
        result: PredictionResult {
            prediction,
            confidence,
            label: Some(label.to_string()),
        },
        contribution: (1 - prediction) as f64 * confidence * SENTIMENT_WEIGHT,
        source: "fallback_sentiment",
    }
}

// ---------------------------------------------------------------------
// Context adapter
// ---------------------------------------------------------------------

pub fn context(model: &OnnxModel, text: &str) -> AdapterOutput {
    match model.run(text) {
        Ok(raw) => {
            let (prediction, confidence) = match decode_context(&raw) {
                PredictionOutcome::Vector(probs) => {
                    let (class, max) = argmax(&probs);
                    (class.min(1), max)
                }
                PredictionOutcome::Scalar { class, prob } => {
                    (class, prob.unwrap_or(0.5))
                }
                PredictionOutcome::Labeled { score, .. } => (i64::from(score > 0.5), score),
            };
            AdapterOutput {
                result: PredictionResult {
                    prediction,
                    confidence,
                    label: None,
                },
                contribution: confidence * CONTEXT_WEIGHT,
                source: "context_classifier",
            }
        }
        Err(e) => {
            warn!(error = %e, "Context model prediction failed, using keyword fallback");
            context_fallback(text)
        }
    }
}

pub fn context_fallback(text: &str) -> AdapterOutput {
    let confidence = count_matches(text, CONTEXT_KEYWORDS) as f64 / CONTEXT_KEYWORDS.len() as f64;
    let prediction = i64::from(confidence > CONTEXT_FALLBACK_THRESHOLD);
    AdapterOutput {
        result: PredictionResult {
            prediction,
            confidence,
            label: None,
        },
        contribution: confidence * CONTEXT_WEIGHT,
        source: "fallback_context",
    }
}

// ---------------------------------------------------------------------
// Decoders
// ---------------------------------------------------------------------

/// Decode a label-like output: unwrap one level of nesting to an
/// integer-coercible value; anything unexpected defaults to class 0.
/// Max class probability is taken from the second output when present.
fn decode_scalar(raw: &RawOutput) -> PredictionOutcome {
    let class = match &raw.primary {
        TensorData::Ints(values) => values.first().copied().unwrap_or(0),
        TensorData::Floats(values) => values.first().map(|v| *v as i64).unwrap_or(0),
    };
    let prob = raw
        .probabilities
        .as_ref()
        .and_then(|probs| probs.iter().copied().reduce(f32::max))
        .map(f64::from);

    PredictionOutcome::Scalar {
        class: i64::from(class != 0),
        prob,
    }
}

/// Sentiment decoding adds the labeled-emotion format: a probability
/// vector matching the fixed emotion label order decodes to Labeled.
fn decode_sentiment(raw: &RawOutput) -> PredictionOutcome {
    let emotion_probs = match (&raw.primary, &raw.probabilities) {
        (_, Some(probs)) if probs.len() == EMOTION_LABELS.len() => Some(probs.as_slice()),
        (TensorData::Floats(values), None) if values.len() == EMOTION_LABELS.len() => {
            Some(values.as_slice())
        }
        _ => None,
    };

    if let Some(probs) = emotion_probs {
        let (idx, score) = argmax(probs);
        return PredictionOutcome::Labeled {
            label: EMOTION_LABELS[idx as usize],
            score,
        };
    }

    decode_scalar(raw)
}

/// Context decoding: a multi-value first output is a probability vector;
/// a single value is a score thresholded at 0.5 with |score| confidence.
fn decode_context(raw: &RawOutput) -> PredictionOutcome {
    match &raw.primary {
        TensorData::Floats(values) if values.len() > 1 => {
            PredictionOutcome::Vector(values.clone())
        }
        TensorData::Floats(values) => {
            let score = values.first().copied().unwrap_or(0.0);
            PredictionOutcome::Scalar {
                class: i64::from(score > 0.5),
                prob: Some(f64::from(score.abs())),
            }
        }
        TensorData::Ints(values) => {
            let class = i64::from(values.first().copied().unwrap_or(0) != 0);
            // Second output holds per-class probabilities for this export
            // shape; index 1 is P(threat).
            let prob = raw
                .probabilities
                .as_ref()
                .and_then(|p| p.get(1).copied())
                .map(f64::from);
            PredictionOutcome::Scalar { class, prob }
        }
    }
}

fn argmax(values: &[f32]) -> (i64, f64) {
    let mut best_idx = 0usize;
    let mut best = f32::MIN;
    for (i, &v) in values.iter().enumerate() {
        if v > best {
            best = v;
            best_idx = i;
        }
    }
    (best_idx as i64, f64::from(best.max(0.0)))
}
