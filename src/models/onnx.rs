// ONNX session wrapper for the threat, sentiment, and context classifiers.
//
// Inference runs entirely on the local CPU. The session sits behind a
// Mutex because ort::Session::run takes &mut self; callers offload the
// whole predict call to spawn_blocking, so contention is minimal.
//
// Two calling conventions, picked by inspecting the declared input names
// at load time:
//   - Tokenized: the artifact declares `input_ids` + `attention_mask`
//     (transformer-style). Token ids come from a crude hash-based
//     word→id mapping — there is no real vocabulary. This is a known
//     placeholder carried over from how the artifacts were exported.
//   - TextFeatures: anything else gets a 5-feature numeric vector
//     (char length, word count, '!' / '?' / '.' counts) fed to the
//     sole declared input.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use tracing::debug;

use crate::text::stable_hash;

/// Fixed sequence length for the tokenized convention.
const MAX_SEQ_LEN: usize = 128;
/// Token-id vocabulary size for the hash mapping (ids 1..=1000, 0 = pad).
const HASH_VOCAB: u64 = 1000;
/// Tokenized inputs are truncated to this many words before padding.
const MAX_WORDS: usize = 50;

/// How text is presented to the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallingConvention {
    /// 5-feature numeric vector fed to the sole declared input.
    TextFeatures,
    /// Hash-tokenized `input_ids` + `attention_mask` pair.
    Tokenized,
}

/// Raw tensors read back from a session run, before any per-model decoding.
///
/// `primary` is the first output (class labels or scores, depending on how
/// the artifact was exported); `probabilities` is the second output when
/// the artifact provides per-class probabilities.
#[derive(Debug, Clone)]
pub struct RawOutput {
    pub primary: TensorData,
    pub probabilities: Option<Vec<f32>>,
}

/// First-output payload: integer class labels or float scores.
#[derive(Debug, Clone)]
pub enum TensorData {
    Ints(Vec<i64>),
    Floats(Vec<f32>),
}

/// One loaded ONNX classifier.
pub struct OnnxModel {
    session: Mutex<Session>,
    convention: CallingConvention,
    /// Name of the sole input for the TextFeatures convention.
    input_name: String,
}

impl OnnxModel {
    /// Load an artifact and determine its calling convention from the
    /// declared input names.
    pub fn load(path: &Path) -> Result<Self> {
        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load ONNX model from {}", path.display()))?;

        let input_names: Vec<String> = session.inputs().iter().map(|i| i.name().to_string()).collect();

        let convention = if input_names.iter().any(|n| n == "input_ids")
            && input_names.iter().any(|n| n == "attention_mask")
        {
            CallingConvention::Tokenized
        } else {
            CallingConvention::TextFeatures
        };

        let input_name = input_names.first().cloned().unwrap_or_else(|| "input".to_string());

        debug!(
            path = %path.display(),
            ?convention,
            inputs = ?input_names,
            "Loaded ONNX model"
        );

        Ok(Self {
            session: Mutex::new(session),
            convention,
            input_name,
        })
    }

    pub fn convention(&self) -> CallingConvention {
        self.convention
    }

    /// Run inference on normalized text. CPU-bound and blocking — callers
    /// wrap the whole predict call in spawn_blocking.
    pub fn run(&self, text: &str) -> Result<RawOutput> {
        match self.convention {
            CallingConvention::Tokenized => self.run_tokenized(text),
            CallingConvention::TextFeatures => self.run_features(text),
        }
    }

    fn run_tokenized(&self, text: &str) -> Result<RawOutput> {
        let (input_ids, attention_mask) = tokenize(text);
        let shape = [1i64, MAX_SEQ_LEN as i64];

        let input_ids_tensor =
            Tensor::from_array((shape, input_ids)).context("Failed to create input_ids tensor")?;
        let attention_mask_tensor = Tensor::from_array((shape, attention_mask))
            .context("Failed to create attention_mask tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("Session lock poisoned: {e}"))?;

        let outputs = session
            .run(ort::inputs! {
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor
            })
            .context("ONNX inference failed")?;

        extract_outputs(&outputs)
    }

    fn run_features(&self, text: &str) -> Result<RawOutput> {
        let features = text_features(text);
        let tensor = Tensor::from_array(([1i64, features.len() as i64], features))
            .context("Failed to create feature tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("Session lock poisoned: {e}"))?;

        let outputs = session
            .run(ort::inputs! { self.input_name.as_str() => tensor })
            .context("ONNX inference failed")?;

        extract_outputs(&outputs)
    }
}

/// Read the first (and optional second) output tensor into RawOutput.
fn extract_outputs(outputs: &ort::session::SessionOutputs<'_>) -> Result<RawOutput> {
    let primary = match outputs[0].try_extract_tensor::<i64>() {
        Ok((_, data)) => TensorData::Ints(data.to_vec()),
        Err(_) => {
            let (_, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .context("Failed to extract output tensor")?;
            TensorData::Floats(data.to_vec())
        }
    };

    let probabilities = if outputs.len() > 1 {
        outputs[1]
            .try_extract_tensor::<f32>()
            .ok()
            .map(|(_, data)| data.to_vec())
    } else {
        None
    };

    Ok(RawOutput {
        primary,
        probabilities,
    })
}

/// Crude hash-based tokenization for the Tokenized convention.
///
/// Ids are `hash(word) % 1000 + 1`, zero-padded to MAX_SEQ_LEN; the
/// attention mask marks nonzero positions. FNV keeps the mapping stable
/// across processes so predictions are reproducible.
fn tokenize(text: &str) -> (Vec<i64>, Vec<i64>) {
    let mut input_ids: Vec<i64> = text
        .split_whitespace()
        .take(MAX_WORDS)
        .map(|word| (stable_hash(word) % HASH_VOCAB + 1) as i64)
        .collect();

    input_ids.resize(MAX_SEQ_LEN, 0);
    let attention_mask: Vec<i64> = input_ids.iter().map(|&id| i64::from(id != 0)).collect();

    (input_ids, attention_mask)
}

/// The 5-feature numeric vector for the TextFeatures convention.
fn text_features(text: &str) -> Vec<f32> {
    vec![
        text.chars().count() as f32,
        text.split_whitespace().count() as f32,
        text.matches('!').count() as f32,
        text.matches('?').count() as f32,
        text.matches('.').count() as f32,
    ]
}
