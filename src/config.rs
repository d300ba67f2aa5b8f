// Runtime configuration, read once at startup from the environment
// (dotenvy loads a local .env first). API keys are never baked into the
// binary or the repo; absent keys degrade to the mock news source and
// static advice.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::advice::{AdviceGenerator, OpenRouterClient};
use crate::models::download::default_model_dir;
use crate::news::{MockNews, NewsApiClient, NewsSource};

const DEFAULT_OPENROUTER_MODEL: &str = "deepseek/deepseek-r1-distill-llama-70b";
const DEFAULT_ADVICE_TIMEOUT_SECS: u64 = 8;

#[derive(Debug, Clone)]
pub struct Config {
    pub model_dir: PathBuf,
    pub newsapi_key: Option<String>,
    pub openrouter_api_key: Option<String>,
    pub openrouter_model: String,
    pub use_ai_advice: bool,
    pub advice_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        let model_dir = env_var("SAFESPACE_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_model_dir);

        let advice_timeout = env_var("SAFESPACE_ADVICE_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_ADVICE_TIMEOUT_SECS));

        Self {
            model_dir,
            newsapi_key: env_var("NEWSAPI_KEY"),
            openrouter_api_key: env_var("OPENROUTER_API_KEY"),
            openrouter_model: env_var("OPENROUTER_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.to_string()),
            use_ai_advice: env_var("SAFESPACE_USE_AI_ADVICE")
                .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "no"))
                .unwrap_or(true),
            advice_timeout,
        }
    }

    /// Live news client when a key is configured, canned articles otherwise.
    pub fn news_source(&self) -> Arc<dyn NewsSource> {
        match &self.newsapi_key {
            Some(key) => Arc::new(NewsApiClient::new(key.clone())),
            None => {
                info!("NEWSAPI_KEY not set, serving mock news articles");
                Arc::new(MockNews)
            }
        }
    }

    /// LLM-backed generator when enabled and keyed, static table otherwise.
    pub fn advice_generator(&self) -> AdviceGenerator {
        match (&self.openrouter_api_key, self.use_ai_advice) {
            (Some(key), true) => AdviceGenerator::new(
                Some(Arc::new(OpenRouterClient::new(
                    key.clone(),
                    self.openrouter_model.clone(),
                ))),
                self.advice_timeout,
            ),
            _ => {
                info!("AI advice disabled, using static advice table");
                AdviceGenerator::static_only()
            }
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
