// Model registry — owns the loaded ONNX sessions and their load state.
//
// Loaded once at startup and shared immutably; reload builds a fresh
// registry and swaps the Arc so in-flight inferences keep their snapshot.
// load_all never fails: a missing or broken artifact degrades capability
// and is recorded, it does not stop the service.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use super::onnx::OnnxModel;

/// The three artifact slots the ensemble knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Threat,
    Sentiment,
    Context,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [ModelKind::Threat, ModelKind::Sentiment, ModelKind::Context];

    /// Artifact file name within the model directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            ModelKind::Threat => "threat.onnx",
            ModelKind::Sentiment => "sentiment.onnx",
            ModelKind::Context => "context.onnx",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Threat => "threat",
            ModelKind::Sentiment => "sentiment",
            ModelKind::Context => "context",
        }
    }
}

/// Per-artifact load state, fixed for the lifetime of a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "state", content = "detail")]
pub enum ArtifactState {
    Loaded,
    Absent,
    Failed(String),
}

impl ArtifactState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, ArtifactState::Loaded)
    }
}

/// Immutable collection of loaded classifiers.
pub struct ModelRegistry {
    model_dir: PathBuf,
    threat: Option<OnnxModel>,
    sentiment: Option<OnnxModel>,
    context: Option<OnnxModel>,
    threat_state: ArtifactState,
    sentiment_state: ArtifactState,
    context_state: ArtifactState,
}

impl ModelRegistry {
    /// Attempt to load every artifact from `model_dir`. Never fails —
    /// each artifact's outcome is recorded and logged individually.
    pub fn load_all(model_dir: &Path) -> Self {
        let (threat, threat_state) = load_one(model_dir, ModelKind::Threat);
        let (sentiment, sentiment_state) = load_one(model_dir, ModelKind::Sentiment);
        let (context, context_state) = load_one(model_dir, ModelKind::Context);

        let registry = Self {
            model_dir: model_dir.to_path_buf(),
            threat,
            sentiment,
            context,
            threat_state,
            sentiment_state,
            context_state,
        };

        let loaded = registry.loaded_count();
        if loaded > 0 {
            info!(loaded, total = 3, "Model registry initialized");
        } else {
            warn!("No models loaded, falling back to rule-based detection");
        }

        registry
    }

    /// A registry with no artifacts at all. The ensemble then runs its
    /// deterministic keyword fallbacks; useful for tests and for running
    /// without downloaded models.
    pub fn empty() -> Self {
        Self {
            model_dir: PathBuf::new(),
            threat: None,
            sentiment: None,
            context: None,
            threat_state: ArtifactState::Absent,
            sentiment_state: ArtifactState::Absent,
            context_state: ArtifactState::Absent,
        }
    }

    pub fn threat(&self) -> Option<&OnnxModel> {
        self.threat.as_ref()
    }

    pub fn sentiment(&self) -> Option<&OnnxModel> {
        self.sentiment.as_ref()
    }

    pub fn context(&self) -> Option<&OnnxModel> {
        self.context.as_ref()
    }

    pub fn state(&self, kind: ModelKind) -> &ArtifactState {
        match kind {
            ModelKind::Threat => &self.threat_state,
            ModelKind::Sentiment => &self.sentiment_state,
            ModelKind::Context => &self.context_state,
        }
    }

    pub fn loaded_count(&self) -> usize {
        ModelKind::ALL
            .iter()
            .filter(|k| self.state(**k).is_loaded())
            .count()
    }

    /// True if at least one artifact loaded.
    pub fn any_loaded(&self) -> bool {
        self.loaded_count() > 0
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// Status document for the models API.
    pub fn status(&self) -> serde_json::Value {
        serde_json::json!({
            "models_loaded": self.any_loaded(),
            "threat_model": self.threat_state.is_loaded(),
            "sentiment_model": self.sentiment_state.is_loaded(),
            "onnx_model": self.context_state.is_loaded(),
            "models_dir": self.model_dir.display().to_string(),
            "model_files": {
                "threat": self.model_dir.join(ModelKind::Threat.file_name()).exists(),
                "sentiment": self.model_dir.join(ModelKind::Sentiment.file_name()).exists(),
                "context": self.model_dir.join(ModelKind::Context.file_name()).exists(),
            },
        })
    }
}

fn load_one(model_dir: &Path, kind: ModelKind) -> (Option<OnnxModel>, ArtifactState) {
    let path = model_dir.join(kind.file_name());

    if !path.exists() {
        warn!(model = kind.as_str(), path = %path.display(), "Model artifact not found");
        return (None, ArtifactState::Absent);
    }

    match OnnxModel::load(&path) {
        Ok(model) => {
            info!(model = kind.as_str(), "Model loaded successfully");
            (Some(model), ArtifactState::Loaded)
        }
        Err(e) => {
            warn!(model = kind.as_str(), error = %e, "Failed to load model");
            (None, ArtifactState::Failed(e.to_string()))
        }
    }
}
